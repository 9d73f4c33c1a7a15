use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(UserId, Uuid);
id_newtype!(MenuId, Uuid);
id_newtype!(SurfaceId, u64);

impl UserId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl MenuId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Raw slot number as reported by the host. Negative values are used by
/// hosts for clicks that land outside any grid cell.
pub type Slot = i32;

/// Opaque display payload rendered into one cell of a surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(String);

impl Content {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Result of a cell click handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    CloseGui,
    Cancel,
}
