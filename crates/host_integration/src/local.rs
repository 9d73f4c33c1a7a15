use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError, Weak},
};

use shared::{
    domain::{Content, MenuId, Slot, SurfaceId, UserId},
    events::{EventVerdict, HostEvent},
};
use tracing::{debug, warn};

use crate::{deliver, DeferredTask, Host, HostListener};

struct Surface {
    owner: MenuId,
    title: String,
    cells: Vec<Option<Content>>,
}

struct ScheduledTask {
    due_tick: u64,
    seq: u64,
    task: DeferredTask,
}

#[derive(Default)]
struct HostState {
    next_surface_id: u64,
    surfaces: HashMap<SurfaceId, Surface>,
    viewers: HashMap<UserId, SurfaceId>,
    tick: u64,
    next_seq: u64,
    tasks: Vec<ScheduledTask>,
    listeners: Vec<Weak<dyn HostListener>>,
}

/// In-process host: keeps surfaces in memory, runs deferred work when ticks
/// are advanced and delivers events synchronously, the way a game server's
/// main thread does.
#[derive(Default)]
pub struct LocalHost {
    state: Mutex<HostState>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers a raw event to every live listener. The state lock is released
    /// first so listeners can call back into the host.
    pub fn emit(&self, event: &HostEvent) -> EventVerdict {
        let listeners = {
            let mut state = self.state();
            state.listeners.retain(|listener| listener.strong_count() > 0);
            state
                .listeners
                .iter()
                .filter_map(|listener| listener.upgrade())
                .collect::<Vec<_>>()
        };

        listeners
            .iter()
            .fold(EventVerdict::PassThrough, |verdict, listener| {
                verdict.merge(deliver(listener.as_ref(), event))
            })
    }

    /// Clicks `slot` of whatever surface `user_id` is looking at.
    pub fn click(&self, user_id: UserId, slot: Slot) -> Option<EventVerdict> {
        let surface_id = self.viewing(user_id)?;
        Some(self.click_surface(surface_id, slot, user_id))
    }

    pub fn click_surface(&self, surface_id: SurfaceId, slot: Slot, user_id: UserId) -> EventVerdict {
        let current = usize::try_from(slot)
            .ok()
            .and_then(|slot| self.cell(surface_id, slot));
        self.emit(&HostEvent::Click {
            surface_id,
            slot,
            user_id,
            current,
        })
    }

    pub fn disconnect(&self, user_id: UserId) {
        self.state().viewers.remove(&user_id);
        self.emit(&HostEvent::Disconnect { user_id });
    }

    /// Moves the clock forward, running due tasks in scheduling order.
    /// Returns how many tasks ran.
    pub fn advance(&self, ticks: u64) -> usize {
        let mut ran = 0;
        for _ in 0..ticks {
            let due = {
                let mut state = self.state();
                state.tick += 1;
                let now = state.tick;
                let (mut due, pending): (Vec<_>, Vec<_>) = state
                    .tasks
                    .drain(..)
                    .partition(|task| task.due_tick <= now);
                state.tasks = pending;
                due.sort_by_key(|task| task.seq);
                due
            };
            for scheduled in due {
                (scheduled.task)();
                ran += 1;
            }
        }
        ran
    }

    pub fn current_tick(&self) -> u64 {
        self.state().tick
    }

    pub fn pending_tasks(&self) -> usize {
        self.state().tasks.len()
    }

    pub fn viewing(&self, user_id: UserId) -> Option<SurfaceId> {
        self.state().viewers.get(&user_id).copied()
    }

    pub fn cell(&self, surface_id: SurfaceId, slot: usize) -> Option<Content> {
        self.state()
            .surfaces
            .get(&surface_id)
            .and_then(|surface| surface.cells.get(slot).cloned().flatten())
    }

    pub fn cells(&self, surface_id: SurfaceId) -> Vec<Option<Content>> {
        self.state()
            .surfaces
            .get(&surface_id)
            .map(|surface| surface.cells.clone())
            .unwrap_or_default()
    }

    pub fn title(&self, surface_id: SurfaceId) -> Option<String> {
        self.state()
            .surfaces
            .get(&surface_id)
            .map(|surface| surface.title.clone())
    }

    pub fn owner(&self, surface_id: SurfaceId) -> Option<MenuId> {
        self.state()
            .surfaces
            .get(&surface_id)
            .map(|surface| surface.owner)
    }
}

impl Host for LocalHost {
    fn create_surface(&self, owner: MenuId, size: usize, title: &str) -> SurfaceId {
        let mut state = self.state();
        state.next_surface_id += 1;
        let surface_id = SurfaceId(state.next_surface_id);
        state.surfaces.insert(
            surface_id,
            Surface {
                owner,
                title: title.to_string(),
                cells: vec![None; size],
            },
        );
        debug!(surface_id = surface_id.0, %owner, size, title, "host: surface created");
        surface_id
    }

    fn set_cell(&self, surface_id: SurfaceId, slot: usize, content: Option<&Content>) {
        let mut state = self.state();
        let Some(surface) = state.surfaces.get_mut(&surface_id) else {
            warn!(surface_id = surface_id.0, "host: set_cell on unknown surface");
            return;
        };
        match surface.cells.get_mut(slot) {
            Some(cell) => *cell = content.cloned(),
            None => warn!(
                surface_id = surface_id.0,
                slot,
                size = surface.cells.len(),
                "host: set_cell outside surface bounds"
            ),
        }
    }

    fn clear_surface(&self, surface_id: SurfaceId) {
        if let Some(surface) = self.state().surfaces.get_mut(&surface_id) {
            surface.cells.iter_mut().for_each(|cell| *cell = None);
        }
    }

    fn show_surface(&self, user_id: UserId, surface_id: SurfaceId) {
        let previous = {
            let mut state = self.state();
            if !state.surfaces.contains_key(&surface_id) {
                warn!(%user_id, surface_id = surface_id.0, "host: show of unknown surface");
                return;
            }
            let previous = state.viewers.insert(user_id, surface_id);
            if previous == Some(surface_id) {
                return;
            }
            previous
        };

        if let Some(previous) = previous {
            self.emit(&HostEvent::Close {
                surface_id: previous,
                user_id,
            });
        }
        self.emit(&HostEvent::Open {
            surface_id,
            user_id,
        });
    }

    fn close_surface(&self, user_id: UserId) {
        let closed = self.state().viewers.remove(&user_id);
        if let Some(surface_id) = closed {
            self.emit(&HostEvent::Close {
                surface_id,
                user_id,
            });
        }
    }

    fn schedule_after_delay(&self, delay_ticks: u64, task: DeferredTask) {
        let mut state = self.state();
        let due_tick = state.tick + delay_ticks.max(1);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.push(ScheduledTask {
            due_tick,
            seq,
            task,
        });
    }

    fn register_listener(&self, listener: Weak<dyn HostListener>) {
        self.state().listeners.push(listener);
    }
}
