#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn point_distance() {
    assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
}

#[test]
fn command_is_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.command());
    assert!(Modifiers { meta: true, ..Default::default() }.command());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.command());
}

#[test]
fn click_kind_from_modifiers() {
    assert_eq!(Modifiers::default().click_kind(), ClickKind::Replace);
    assert_eq!(Modifiers { shift: true, ..Default::default() }.click_kind(), ClickKind::Extend);
    assert_eq!(Modifiers { meta: true, ..Default::default() }.click_kind(), ClickKind::Toggle);
    // Command wins over shift.
    assert_eq!(Modifiers { ctrl: true, shift: true, ..Default::default() }.click_kind(), ClickKind::Toggle);
}

#[test]
fn key_is_char_ignores_case() {
    assert!(Key::new("z").is_char('z'));
    assert!(Key::new("Z").is_char('z'));
    assert!(!Key::new("Delete").is_char('d'));
    assert!(!Key::new("").is_char('a'));
}

#[test]
fn input_state_drag_context() {
    let drag = DragState { id: "r1".into(), start: Point::new(1.0, 2.0), baseline: String::new() };
    assert!(InputState::Idle.drag().is_none());
    assert_eq!(InputState::Pressed(drag.clone()).drag(), Some(&drag));
    assert_eq!(InputState::Dragging(drag.clone()).drag(), Some(&drag));
    assert_eq!(InputState::default(), InputState::Idle);
}
