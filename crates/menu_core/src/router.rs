use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use host_integration::{deliver, Host, HostListener};
use shared::{
    domain::{ButtonAction, Content, Slot, SurfaceId, UserId},
    events::{EventVerdict, HostEvent, SessionEvent},
};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{cells::Click, config::RouterSettings, menu::Menu};

/// Tracks the one menu each user has open and routes host events to it.
pub struct SessionRouter {
    host: Arc<dyn Host>,
    settings: RouterSettings,
    sessions: Mutex<HashMap<UserId, Arc<Menu>>>,
    events: broadcast::Sender<SessionEvent>,
    this: Weak<SessionRouter>,
}

impl SessionRouter {
    /// Builds the router and subscribes it to the host's event stream.
    pub fn new(host: Arc<dyn Host>, mut settings: RouterSettings) -> Arc<Self> {
        settings.normalize();
        let (events, _) = broadcast::channel(settings.event_buffer);
        let router = Arc::new_cyclic(|this| Self {
            host: Arc::clone(&host),
            settings,
            sessions: Mutex::new(HashMap::new()),
            events,
            this: this.clone(),
        });
        let listener: Weak<dyn HostListener> = Arc::downgrade(&router) as Weak<dyn HostListener>;
        host.register_listener(listener);
        router
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<UserId, Arc<Menu>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Binds `menu` to `user_id` (replacing any previous binding) and shows it.
    pub fn present(&self, user_id: UserId, menu: Arc<Menu>) {
        let previous = self.sessions().insert(user_id, Arc::clone(&menu));
        if let Some(previous) = previous.filter(|previous| !Arc::ptr_eq(previous, &menu)) {
            debug!(
                %user_id,
                previous_menu_id = %previous.id(),
                menu_id = %menu.id(),
                "router: replacing session"
            );
        }
        info!(
            %user_id,
            menu_id = %menu.id(),
            surface_id = menu.surface_id().0,
            title = menu.title(),
            "router: presenting menu"
        );
        self.publish(SessionEvent::Presented {
            user_id,
            menu_id: menu.id(),
            surface_id: menu.surface_id(),
        });
        menu.present(user_id);
    }

    pub fn open_menu(&self, user_id: UserId) -> Option<Arc<Menu>> {
        self.sessions().get(&user_id).cloned()
    }

    /// Runs `action` against the user's open menu. Returns whether one was open.
    pub fn with_open_menu(&self, user_id: UserId, action: impl FnOnce(&Arc<Menu>)) -> bool {
        match self.open_menu(user_id) {
            Some(menu) => {
                action(&menu);
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    fn bound_menu(&self, user_id: UserId, surface_id: SurfaceId) -> Option<Arc<Menu>> {
        self.open_menu(user_id)
            .filter(|menu| menu.surface_id() == surface_id)
    }

    fn is_bound_to(&self, user_id: UserId, menu: &Arc<Menu>) -> bool {
        self.sessions()
            .get(&user_id)
            .is_some_and(|bound| Arc::ptr_eq(bound, menu))
    }

    pub fn dispatch(&self, event: &HostEvent) -> EventVerdict {
        deliver(self, event)
    }

    pub fn on_host_click(
        &self,
        surface_id: SurfaceId,
        slot: Slot,
        user_id: UserId,
        current: Option<&Content>,
    ) -> EventVerdict {
        let Some(menu) = self.open_menu(user_id) else {
            return EventVerdict::PassThrough;
        };
        if menu.surface_id() != surface_id {
            return if self.settings.cancel_foreign_clicks {
                EventVerdict::Cancel
            } else {
                EventVerdict::PassThrough
            };
        }
        let Ok(index) = usize::try_from(slot) else {
            return EventVerdict::PassThrough;
        };
        if index >= menu.size() {
            return EventVerdict::PassThrough;
        }

        // From here on the click belongs to the menu and never reaches the
        // host's default handling.
        let Some(entry) = menu.get(slot) else {
            return EventVerdict::Cancel;
        };
        let Some(on_click) = entry.on_click else {
            return EventVerdict::Cancel;
        };

        let content = current.unwrap_or(&entry.content);
        let action = on_click(&Click {
            menu: &menu,
            user_id,
            slot: index,
            content,
        });
        debug!(
            %user_id,
            menu_id = %menu.id(),
            slot = index,
            ?action,
            "router: click handled"
        );

        if action == ButtonAction::CloseGui {
            self.request_close(user_id, &menu);
        }
        EventVerdict::Cancel
    }

    pub fn on_host_open(&self, surface_id: SurfaceId, user_id: UserId) {
        let Some(menu) = self.bound_menu(user_id, surface_id) else {
            return;
        };
        menu.notify_open(user_id);
        self.publish(SessionEvent::Opened {
            user_id,
            menu_id: menu.id(),
        });
    }

    pub fn on_host_close(&self, surface_id: SurfaceId, user_id: UserId) {
        let Some(menu) = self.bound_menu(user_id, surface_id) else {
            return;
        };

        if !menu.can_close(user_id) {
            self.schedule_reopen(user_id, menu);
            return;
        }

        self.finish_close(user_id, &menu);
    }

    /// The user left the server: the session ends without consulting the veto.
    pub fn on_host_disconnect(&self, user_id: UserId) {
        let Some(menu) = self.sessions().remove(&user_id) else {
            return;
        };
        info!(%user_id, menu_id = %menu.id(), "router: session dropped on disconnect");
        menu.notify_close(user_id);
        self.publish(SessionEvent::Closed {
            user_id,
            menu_id: menu.id(),
        });
    }

    /// Asks the host to close the user's menu unless the menu vetoes it.
    /// Returns whether the close went ahead.
    pub fn close(&self, user_id: UserId) -> bool {
        match self.open_menu(user_id) {
            Some(menu) => self.request_close(user_id, &menu),
            None => false,
        }
    }

    fn request_close(&self, user_id: UserId, menu: &Arc<Menu>) -> bool {
        if !menu.can_close(user_id) {
            debug!(%user_id, menu_id = %menu.id(), "router: close request vetoed");
            return false;
        }
        self.host.close_surface(user_id);
        // Hosts that do not echo a close event still end the session here.
        self.finish_close(user_id, menu);
        true
    }

    fn finish_close(&self, user_id: UserId, menu: &Arc<Menu>) {
        if !self.is_bound_to(user_id, menu) {
            return;
        }
        menu.notify_close(user_id);

        // on_close may have presented a follow-up menu; that binding stays.
        let removed = {
            let mut sessions = self.sessions();
            let still_bound = sessions
                .get(&user_id)
                .is_some_and(|bound| Arc::ptr_eq(bound, menu));
            still_bound && sessions.remove(&user_id).is_some()
        };
        info!(%user_id, menu_id = %menu.id(), removed, "router: session closed");
        self.publish(SessionEvent::Closed {
            user_id,
            menu_id: menu.id(),
        });
    }

    fn schedule_reopen(&self, user_id: UserId, menu: Arc<Menu>) {
        let delay = self.settings.reopen_delay_ticks;
        info!(
            %user_id,
            menu_id = %menu.id(),
            delay_ticks = delay,
            "router: close vetoed, reopen scheduled"
        );
        self.publish(SessionEvent::CloseVetoed {
            user_id,
            menu_id: menu.id(),
            reopen_in_ticks: delay,
        });

        let router = self.this.clone();
        self.host.schedule_after_delay(
            delay,
            Box::new(move || {
                if let Some(router) = router.upgrade() {
                    router.reopen(user_id, &menu);
                }
            }),
        );
    }

    fn reopen(&self, user_id: UserId, menu: &Arc<Menu>) {
        if !self.is_bound_to(user_id, menu) {
            debug!(%user_id, menu_id = %menu.id(), "router: reopen skipped, session moved on");
            return;
        }
        debug!(%user_id, menu_id = %menu.id(), "router: reopening vetoed menu");
        self.publish(SessionEvent::Reopened {
            user_id,
            menu_id: menu.id(),
        });
        menu.present(user_id);
    }
}

impl HostListener for SessionRouter {
    fn on_click(
        &self,
        surface_id: SurfaceId,
        slot: Slot,
        user_id: UserId,
        current: Option<&Content>,
    ) -> EventVerdict {
        self.on_host_click(surface_id, slot, user_id, current)
    }

    fn on_open(&self, surface_id: SurfaceId, user_id: UserId) {
        self.on_host_open(surface_id, user_id);
    }

    fn on_close(&self, surface_id: SurfaceId, user_id: UserId) {
        self.on_host_close(surface_id, user_id);
    }

    fn on_disconnect(&self, user_id: UserId) {
        self.on_host_disconnect(user_id);
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
