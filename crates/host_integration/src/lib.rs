//! Interfaces the menu core consumes from the game server hosting it.

use std::sync::Weak;

use shared::{
    domain::{Content, MenuId, Slot, SurfaceId, UserId},
    events::{EventVerdict, HostEvent},
};

mod local;
pub use local::LocalHost;

/// Work deferred onto the host's scheduler.
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Typed callbacks the host invokes for every raw UI event.
pub trait HostListener: Send + Sync {
    fn on_click(
        &self,
        surface_id: SurfaceId,
        slot: Slot,
        user_id: UserId,
        current: Option<&Content>,
    ) -> EventVerdict;
    fn on_open(&self, surface_id: SurfaceId, user_id: UserId);
    fn on_close(&self, surface_id: SurfaceId, user_id: UserId);
    fn on_disconnect(&self, user_id: UserId);
}

/// Routes one raw event to the matching typed callback.
pub fn deliver(listener: &dyn HostListener, event: &HostEvent) -> EventVerdict {
    match event {
        HostEvent::Click {
            surface_id,
            slot,
            user_id,
            current,
        } => listener.on_click(*surface_id, *slot, *user_id, current.as_ref()),
        HostEvent::Open {
            surface_id,
            user_id,
        } => {
            listener.on_open(*surface_id, *user_id);
            EventVerdict::PassThrough
        }
        HostEvent::Close {
            surface_id,
            user_id,
        } => {
            listener.on_close(*surface_id, *user_id);
            EventVerdict::PassThrough
        }
        HostEvent::Disconnect { user_id } => {
            listener.on_disconnect(*user_id);
            EventVerdict::PassThrough
        }
    }
}

/// Rendering surfaces, viewers and the tick scheduler owned by the host.
///
/// Implementations may deliver events to registered listeners synchronously
/// from inside `show_surface` and `close_surface`, so callers must not hold
/// locks across these calls.
pub trait Host: Send + Sync {
    fn create_surface(&self, owner: MenuId, size: usize, title: &str) -> SurfaceId;
    fn set_cell(&self, surface_id: SurfaceId, slot: usize, content: Option<&Content>);
    fn clear_surface(&self, surface_id: SurfaceId);
    fn show_surface(&self, user_id: UserId, surface_id: SurfaceId);
    fn close_surface(&self, user_id: UserId);
    fn schedule_after_delay(&self, delay_ticks: u64, task: DeferredTask);
    fn register_listener(&self, listener: Weak<dyn HostListener>);
}
