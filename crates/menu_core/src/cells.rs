use std::{collections::BTreeMap, fmt, sync::Arc};

use shared::{
    domain::{ButtonAction, Content, Slot, UserId},
    error::MenuError,
};

use crate::menu::Menu;

/// Everything a click handler gets to see about the click it is handling.
pub struct Click<'a> {
    pub menu: &'a Menu,
    pub user_id: UserId,
    pub slot: usize,
    /// Payload shown in the cell when the user clicked it.
    pub content: &'a Content,
}

pub type ClickHandler = Arc<dyn Fn(&Click<'_>) -> ButtonAction + Send + Sync>;

#[derive(Clone)]
pub struct CellEntry {
    pub content: Content,
    pub on_click: Option<ClickHandler>,
}

impl fmt::Debug for CellEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellEntry")
            .field("content", &self.content)
            .field("has_handler", &self.on_click.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Stored,
    Removed,
}

/// Sparse slot → cell mapping backing one menu. Slots without an entry
/// render as empty.
#[derive(Debug)]
pub struct CellRegistry {
    size: usize,
    title: String,
    entries: BTreeMap<usize, CellEntry>,
}

impl CellRegistry {
    pub fn new(size: usize, title: impl Into<String>) -> Self {
        Self {
            size,
            title: title.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Converts a raw slot into an in-bounds index.
    pub fn index(&self, slot: Slot) -> Result<usize, MenuError> {
        usize::try_from(slot)
            .ok()
            .filter(|index| *index < self.size)
            .ok_or_else(|| MenuError::out_of_bounds(slot, self.size, &self.title))
    }

    /// Stores `content` at `slot`, replacing any previous entry and handler.
    /// Absent or empty content removes the entry instead.
    pub fn set(
        &mut self,
        slot: Slot,
        content: Option<Content>,
        on_click: Option<ClickHandler>,
    ) -> Result<(usize, SetOutcome), MenuError> {
        let index = self.index(slot)?;
        match content.filter(|content| !content.is_empty()) {
            Some(content) => {
                self.entries.insert(index, CellEntry { content, on_click });
                Ok((index, SetOutcome::Stored))
            }
            None => {
                self.entries.remove(&index);
                Ok((index, SetOutcome::Removed))
            }
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&CellEntry> {
        let index = usize::try_from(slot).ok()?;
        self.entries.get(&index)
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CellEntry)> {
        self.entries.iter().map(|(index, entry)| (*index, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/cells_tests.rs"]
mod tests;
