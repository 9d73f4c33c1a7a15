use thiserror::Error;

use crate::domain::Slot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("invalid slot {index} for menu of size {size} [{title}]")]
    OutOfBounds {
        index: Slot,
        size: usize,
        title: String,
    },
    #[error("menu size must be positive, got {size} [{title}]")]
    InvalidSize { size: usize, title: String },
}

impl MenuError {
    pub fn out_of_bounds(index: Slot, size: usize, title: impl Into<String>) -> Self {
        Self::OutOfBounds {
            index,
            size,
            title: title.into(),
        }
    }
}
