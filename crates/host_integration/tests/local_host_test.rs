use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, Weak,
};

use host_integration::{Host, HostListener, LocalHost};
use shared::{
    domain::{Content, MenuId, Slot, SurfaceId, UserId},
    events::{EventVerdict, HostEvent},
};

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<HostEvent> {
        self.events.lock().expect("events").clone()
    }
}

impl HostListener for RecordingListener {
    fn on_click(
        &self,
        surface_id: SurfaceId,
        slot: Slot,
        user_id: UserId,
        current: Option<&Content>,
    ) -> EventVerdict {
        self.events.lock().expect("events").push(HostEvent::Click {
            surface_id,
            slot,
            user_id,
            current: current.cloned(),
        });
        EventVerdict::Cancel
    }

    fn on_open(&self, surface_id: SurfaceId, user_id: UserId) {
        self.events.lock().expect("events").push(HostEvent::Open {
            surface_id,
            user_id,
        });
    }

    fn on_close(&self, surface_id: SurfaceId, user_id: UserId) {
        self.events.lock().expect("events").push(HostEvent::Close {
            surface_id,
            user_id,
        });
    }

    fn on_disconnect(&self, user_id: UserId) {
        self.events
            .lock()
            .expect("events")
            .push(HostEvent::Disconnect { user_id });
    }
}

fn host_with_listener() -> (LocalHost, Arc<RecordingListener>) {
    let host = LocalHost::new();
    let listener = Arc::new(RecordingListener::default());
    let weak: Weak<dyn HostListener> = Arc::downgrade(&listener) as Weak<dyn HostListener>;
    host.register_listener(weak);
    (host, listener)
}

#[test]
fn switching_surfaces_closes_the_previous_one_first() {
    let (host, listener) = host_with_listener();
    let user_id = UserId::random();
    let first = host.create_surface(MenuId::random(), 9, "first");
    let second = host.create_surface(MenuId::random(), 9, "second");

    host.show_surface(user_id, first);
    host.show_surface(user_id, second);

    assert_eq!(
        listener.events(),
        vec![
            HostEvent::Open {
                surface_id: first,
                user_id
            },
            HostEvent::Close {
                surface_id: first,
                user_id
            },
            HostEvent::Open {
                surface_id: second,
                user_id
            },
        ]
    );
    assert_eq!(host.viewing(user_id), Some(second));
}

#[test]
fn click_reports_current_cell_content() {
    let (host, listener) = host_with_listener();
    let user_id = UserId::random();
    let surface_id = host.create_surface(MenuId::random(), 9, "grid");
    host.set_cell(surface_id, 4, Some(&Content::new("coal×1")));
    host.show_surface(user_id, surface_id);

    assert_eq!(host.click(user_id, 4), Some(EventVerdict::Cancel));
    assert_eq!(
        listener.events().last(),
        Some(&HostEvent::Click {
            surface_id,
            slot: 4,
            user_id,
            current: Some(Content::new("coal×1")),
        })
    );
}

#[test]
fn click_without_open_surface_is_not_delivered() {
    let (host, listener) = host_with_listener();
    assert_eq!(host.click(UserId::random(), 0), None);
    assert!(listener.events().is_empty());
}

#[test]
fn set_cell_outside_bounds_is_ignored() {
    let host = LocalHost::new();
    let surface_id = host.create_surface(MenuId::random(), 9, "grid");
    host.set_cell(surface_id, 9, Some(&Content::new("stone")));
    assert_eq!(host.cells(surface_id), vec![None; 9]);
}

#[test]
fn clear_surface_blanks_every_cell() {
    let host = LocalHost::new();
    let surface_id = host.create_surface(MenuId::random(), 9, "grid");
    host.set_cell(surface_id, 0, Some(&Content::new("arrow")));
    host.set_cell(surface_id, 8, Some(&Content::new("arrow")));
    host.clear_surface(surface_id);
    assert!(host.cells(surface_id).iter().all(Option::is_none));
}

#[test]
fn deferred_tasks_run_after_their_delay_in_order() {
    let host = LocalHost::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (label, delay) in [("late", 3), ("first", 1), ("second", 1)] {
        let order = Arc::clone(&order);
        host.schedule_after_delay(delay, Box::new(move || order.lock().expect("order").push(label)));
    }

    assert_eq!(host.advance(1), 2);
    assert_eq!(*order.lock().expect("order"), vec!["first", "second"]);
    assert_eq!(host.pending_tasks(), 1);

    assert_eq!(host.advance(2), 1);
    assert_eq!(*order.lock().expect("order"), vec!["first", "second", "late"]);
    assert_eq!(host.current_tick(), 3);
}

#[test]
fn zero_delay_still_waits_for_the_next_tick() {
    let host = LocalHost::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    host.schedule_after_delay(0, Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    host.advance(1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn dropped_listeners_stop_receiving_events() {
    let (host, listener) = host_with_listener();
    drop(listener);

    let user_id = UserId::random();
    let surface_id = host.create_surface(MenuId::random(), 9, "grid");
    host.show_surface(user_id, surface_id);

    assert_eq!(host.click(user_id, 0), Some(EventVerdict::PassThrough));
}
