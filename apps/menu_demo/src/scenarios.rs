//! Scripted menus driven against the in-process host.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};

use anyhow::{bail, Result};
use host_integration::{Host, LocalHost};
use menu_core::{ButtonAction, Click, Content, Menu, MenuBehavior, SessionRouter, UserId};
use tracing::{error, info};

const MAX_STACK: u32 = 64;

fn coal(amount: u32) -> Content {
    Content::new(format!("coal×{amount}"))
}

fn adjust(amount: &AtomicU32, click: &Click<'_>, step: i64) -> ButtonAction {
    let current = i64::from(amount.load(Ordering::SeqCst));
    let next = (current + step).clamp(1, i64::from(MAX_STACK)) as u32;
    amount.store(next, Ordering::SeqCst);
    if let Err(error) = click.menu.set_item(4, coal(next)) {
        error!(%error, "demo: failed to redraw stack");
    }
    ButtonAction::Cancel
}

/// Arrow buttons on both ends move the coal stack in the middle slot.
pub fn counter_menu(host: Arc<dyn Host>) -> Result<Arc<Menu>> {
    let menu = Menu::new(host, 9, "Test Inventory")?;
    let amount = Arc::new(AtomicU32::new(1));
    menu.set_item(4, coal(1))?;

    let down = Arc::clone(&amount);
    menu.set_button(0, "arrow", move |click: &Click<'_>| adjust(&down, click, -1))?;
    let up = Arc::clone(&amount);
    menu.set_button(8, "arrow", move |click: &Click<'_>| adjust(&up, click, 1))?;

    Ok(Arc::new(menu))
}

pub fn run_counter(
    host: &Arc<LocalHost>,
    router: &SessionRouter,
    up: u32,
    down: u32,
) -> Result<()> {
    let user_id = UserId::random();
    let menu = counter_menu(host.clone())?;
    router.present(user_id, Arc::clone(&menu));

    for _ in 0..up {
        host.click(user_id, 8);
    }
    for _ in 0..down {
        host.click(user_id, 0);
    }

    let stack = host.cell(menu.surface_id(), 4);
    info!(%user_id, stack = ?stack, "demo: counter finished");
    println!(
        "stack after {up} up / {down} down clicks: {}",
        stack.map(|content| content.to_string()).unwrap_or_default()
    );

    host.close_surface(user_id);
    if router.open_menu(user_id).is_some() {
        bail!("counter menu should close when the user dismisses it");
    }
    Ok(())
}

struct ConfirmBehavior {
    chosen: Arc<AtomicBool>,
}

impl MenuBehavior for ConfirmBehavior {
    fn can_close(&self, _menu: &Menu, user_id: UserId) -> bool {
        let chosen = self.chosen.load(Ordering::SeqCst);
        if !chosen {
            info!(%user_id, "demo: confirmation pending, refusing to close");
        }
        chosen
    }

    fn on_close(&self, _menu: &Menu, user_id: UserId) {
        info!(%user_id, "demo: confirmation menu closed");
    }
}

/// A purchase confirmation the user cannot dismiss without choosing.
pub fn run_confirm(
    host: &Arc<LocalHost>,
    router: &SessionRouter,
    dismiss_attempts: u32,
) -> Result<()> {
    let user_id = UserId::random();
    let chosen = Arc::new(AtomicBool::new(false));
    let menu = Menu::with_behavior(
        host.clone(),
        9,
        "Confirm purchase",
        ConfirmBehavior {
            chosen: Arc::clone(&chosen),
        },
    )?;
    for (slot, label) in [(3, "emerald"), (5, "redstone")] {
        let choice = Arc::clone(&chosen);
        menu.set_button(slot, label, move |_: &Click<'_>| {
            choice.store(true, Ordering::SeqCst);
            ButtonAction::CloseGui
        })?;
    }
    let menu = Arc::new(menu);
    router.present(user_id, Arc::clone(&menu));

    let delay = router.settings().reopen_delay_ticks;
    for attempt in 1..=dismiss_attempts {
        host.close_surface(user_id);
        host.advance(delay);
        println!(
            "dismiss attempt {attempt}: menu {}",
            if host.viewing(user_id) == Some(menu.surface_id()) {
                "reopened"
            } else {
                "gone"
            }
        );
    }

    host.click(user_id, 3);
    println!(
        "after confirming: session {}",
        if router.open_menu(user_id).is_some() {
            "still open"
        } else {
            "closed"
        }
    );
    Ok(())
}
