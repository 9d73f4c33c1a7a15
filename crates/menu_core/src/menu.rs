use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use host_integration::Host;
use shared::{
    domain::{ButtonAction, Content, MenuId, Slot, SurfaceId, UserId},
    error::MenuError,
};
use tracing::debug;

use crate::cells::{CellEntry, CellRegistry, Click, ClickHandler, SetOutcome};

/// Application hooks for one menu. Every method has a permissive default.
pub trait MenuBehavior: Send + Sync {
    /// Returning `false` vetoes a close; the router re-presents the menu.
    fn can_close(&self, _menu: &Menu, _user_id: UserId) -> bool {
        true
    }

    fn on_open(&self, _menu: &Menu, _user_id: UserId) {}

    fn on_close(&self, _menu: &Menu, _user_id: UserId) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBehavior;

impl MenuBehavior for DefaultBehavior {}

/// A fixed-size grid of cells mapped onto one host surface.
pub struct Menu {
    id: MenuId,
    size: usize,
    title: String,
    surface_id: SurfaceId,
    host: Arc<dyn Host>,
    cells: Mutex<CellRegistry>,
    behavior: Box<dyn MenuBehavior>,
}

impl Menu {
    pub fn new(
        host: Arc<dyn Host>,
        size: usize,
        title: impl Into<String>,
    ) -> Result<Self, MenuError> {
        Self::with_behavior(host, size, title, DefaultBehavior)
    }

    pub fn with_behavior(
        host: Arc<dyn Host>,
        size: usize,
        title: impl Into<String>,
        behavior: impl MenuBehavior + 'static,
    ) -> Result<Self, MenuError> {
        let title = title.into();
        if size == 0 {
            return Err(MenuError::InvalidSize { size, title });
        }

        let id = MenuId::random();
        let surface_id = host.create_surface(id, size, &title);
        debug!(menu_id = %id, surface_id = surface_id.0, size, %title, "menu: created");
        Ok(Self {
            id,
            size,
            cells: Mutex::new(CellRegistry::new(size, title.clone())),
            title,
            surface_id,
            host,
            behavior: Box::new(behavior),
        })
    }

    pub fn id(&self) -> MenuId {
        self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    fn cells(&self) -> MutexGuard<'_, CellRegistry> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets or removes the cell at `slot`, then re-renders.
    pub fn set(
        &self,
        slot: Slot,
        content: Option<Content>,
        on_click: Option<ClickHandler>,
    ) -> Result<(), MenuError> {
        let (index, outcome) = self.cells().set(slot, content, on_click)?;
        if outcome == SetOutcome::Removed {
            self.host.set_cell(self.surface_id, index, None);
        }
        self.render();
        Ok(())
    }

    pub fn set_item(&self, slot: Slot, content: impl Into<Content>) -> Result<(), MenuError> {
        self.set(slot, Some(content.into()), None)
    }

    pub fn set_button<F>(
        &self,
        slot: Slot,
        content: impl Into<Content>,
        on_click: F,
    ) -> Result<(), MenuError>
    where
        F: Fn(&Click<'_>) -> ButtonAction + Send + Sync + 'static,
    {
        self.set(slot, Some(content.into()), Some(Arc::new(on_click)))
    }

    pub fn unset(&self, slot: Slot) -> Result<(), MenuError> {
        self.set(slot, None, None)
    }

    pub fn get(&self, slot: Slot) -> Option<CellEntry> {
        self.cells().get(slot).cloned()
    }

    /// Current `(slot, content)` pairs in slot order.
    pub fn contents(&self) -> Vec<(usize, Content)> {
        self.cells()
            .iter()
            .map(|(index, entry)| (index, entry.content.clone()))
            .collect()
    }

    pub fn clear_all(&self) {
        self.cells().clear_all();
        self.host.clear_surface(self.surface_id);
        self.render();
    }

    /// Writes every registered cell onto the surface. Slots without an entry
    /// are left as they are.
    pub fn render(&self) {
        for (index, content) in self.contents() {
            self.host.set_cell(self.surface_id, index, Some(&content));
        }
    }

    /// Renders and shows the surface to `user_id`. Sessions are bound through
    /// the router, which is the only caller.
    pub(crate) fn present(&self, user_id: UserId) {
        self.render();
        self.host.show_surface(user_id, self.surface_id);
    }

    pub fn can_close(&self, user_id: UserId) -> bool {
        self.behavior.can_close(self, user_id)
    }

    pub(crate) fn notify_open(&self, user_id: UserId) {
        self.behavior.on_open(self, user_id);
    }

    pub(crate) fn notify_close(&self, user_id: UserId) {
        self.behavior.on_close(self, user_id);
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("title", &self.title)
            .field("surface_id", &self.surface_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/menu_tests.rs"]
mod tests;
