//! Session and interaction routing for grid menus shown to game-server users.
//!
//! A [`Menu`] owns a fixed-size grid of cells rendered into a host surface.
//! The [`SessionRouter`] remembers which menu each user has open, turns raw
//! host events into calls against that menu and enforces the close veto.

pub mod cells;
pub mod config;
pub mod menu;
pub mod router;

pub use cells::{CellEntry, CellRegistry, Click, ClickHandler};
pub use config::{load_settings, load_settings_from, RouterSettings};
pub use menu::{DefaultBehavior, Menu, MenuBehavior};
pub use router::SessionRouter;
pub use shared::{
    domain::{ButtonAction, Content, Slot, SurfaceId, UserId},
    error::MenuError,
    events::{EventVerdict, HostEvent, SessionEvent},
};
