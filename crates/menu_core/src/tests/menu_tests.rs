use super::*;
use host_integration::LocalHost;

fn menu(size: usize) -> (Arc<LocalHost>, Menu) {
    let host = Arc::new(LocalHost::new());
    let menu = Menu::new(host.clone(), size, "Test Inventory").expect("menu");
    (host, menu)
}

#[test]
fn construction_creates_a_titled_surface_owned_by_the_menu() {
    let (host, menu) = menu(9);
    assert_eq!(host.title(menu.surface_id()).as_deref(), Some("Test Inventory"));
    assert_eq!(host.owner(menu.surface_id()), Some(menu.id()));
    assert_eq!(host.cells(menu.surface_id()).len(), 9);
}

#[test]
fn zero_sized_menu_is_rejected() {
    let host = Arc::new(LocalHost::new());
    let err = Menu::new(host, 0, "empty").expect_err("invalid size");
    assert!(matches!(err, MenuError::InvalidSize { size: 0, .. }));
}

#[test]
fn set_renders_immediately() {
    let (host, menu) = menu(9);
    menu.set_item(4, "coal×1").expect("set");
    assert_eq!(host.cell(menu.surface_id(), 4), Some(Content::new("coal×1")));
}

#[test]
fn unset_blanks_the_rendered_slot() {
    let (host, menu) = menu(9);
    menu.set_item(4, "coal×1").expect("set");
    menu.unset(4).expect("unset");

    assert!(menu.get(4).is_none());
    assert_eq!(host.cell(menu.surface_id(), 4), None);
}

#[test]
fn out_of_bounds_set_leaves_menu_and_surface_untouched() {
    let (host, menu) = menu(9);
    menu.set_item(0, "arrow").expect("set");
    let before = host.cells(menu.surface_id());

    let err = menu.set_item(9, "stone").expect_err("out of bounds");
    assert_eq!(err, MenuError::out_of_bounds(9, 9, "Test Inventory"));
    assert_eq!(
        err.to_string(),
        "invalid slot 9 for menu of size 9 [Test Inventory]"
    );
    assert!(menu.set_item(-1, "stone").is_err());

    assert_eq!(host.cells(menu.surface_id()), before);
    assert_eq!(menu.contents(), vec![(0, Content::new("arrow"))]);
}

#[test]
fn clear_all_removes_entries_and_blanks_surface() {
    let (host, menu) = menu(9);
    for slot in [0, 4, 8] {
        menu.set_item(slot, "arrow").expect("set");
    }

    menu.clear_all();

    assert!((0..9).all(|slot| menu.get(slot).is_none()));
    assert!(host.cells(menu.surface_id()).iter().all(Option::is_none));
}

#[test]
fn render_is_idempotent() {
    let (host, menu) = menu(9);
    menu.set_item(2, "glass").expect("set");
    menu.render();
    let first = host.cells(menu.surface_id());
    menu.render();
    assert_eq!(host.cells(menu.surface_id()), first);
}

#[test]
fn present_renders_and_shows_the_surface() {
    let (host, menu) = menu(9);
    let user_id = UserId::random();
    menu.set_item(4, "coal×1").expect("set");

    menu.present(user_id);

    assert_eq!(host.viewing(user_id), Some(menu.surface_id()));
    assert_eq!(host.cell(menu.surface_id(), 4), Some(Content::new("coal×1")));
}

#[test]
fn default_behavior_allows_closing() {
    let (_host, menu) = menu(9);
    assert!(menu.can_close(UserId::random()));
}

#[test]
fn custom_behavior_can_veto_closing() {
    struct Locked;
    impl MenuBehavior for Locked {
        fn can_close(&self, _menu: &Menu, _user_id: UserId) -> bool {
            false
        }
    }

    let host = Arc::new(LocalHost::new());
    let menu = Menu::with_behavior(host, 9, "Confirm", Locked).expect("menu");
    assert!(!menu.can_close(UserId::random()));
}

#[test]
fn handler_may_rewrite_its_own_menu() {
    let (host, menu) = menu(9);
    menu.set_button(0, "arrow", |click: &Click<'_>| {
        click
            .menu
            .set_item(4, "coal×2")
            .expect("handler rewrite");
        ButtonAction::Cancel
    })
    .expect("set");

    let entry = menu.get(0).expect("entry");
    let handler = entry.on_click.expect("handler");
    let action = handler(&Click {
        menu: &menu,
        user_id: UserId::random(),
        slot: 0,
        content: &entry.content,
    });

    assert_eq!(action, ButtonAction::Cancel);
    assert_eq!(host.cell(menu.surface_id(), 4), Some(Content::new("coal×2")));
}
