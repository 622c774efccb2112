//! Input model: pointer positions, modifier keys, buttons, and the press/drag gesture.
//!
//! The host translates DOM events into these types (resolving the event target to a node
//! id through the id marker attribute) and feeds them to the engine. `InputState` tracks
//! the gesture between pointer-down and pointer-up: a press that never travels past the
//! drag threshold is a click, anything further is a drag and suppresses the click.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::tree::NodeId;

/// A point in screen space (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }

    /// How a click with these modifiers changes the selection.
    #[must_use]
    pub fn click_kind(self) -> ClickKind {
        if self.command() {
            ClickKind::Toggle
        } else if self.shift {
            ClickKind::Extend
        } else {
            ClickKind::Replace
        }
    }
}

/// Selection behaviour of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    /// Plain click: select exactly this node, or deselect it if it is the sole selection.
    Replace,
    /// Ctrl/Cmd+Click: toggle this node, leave the rest alone.
    Toggle,
    /// Shift+Click: add this node.
    Extend,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"z"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Whether this is the character key `c`, ignoring case.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(k), None) if k.eq_ignore_ascii_case(&c))
    }
}

/// Transient drag context. Never part of history.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Node under the pointer at pointer-down.
    pub id: NodeId,
    /// Screen position of the pointer at pointer-down.
    pub start: Point,
    /// The node's `transform` at pointer-down; every drag frame composes onto this.
    pub baseline: String,
}

/// Gesture state between pointer-down and pointer-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Pointer is down on a node and has not yet moved past the drag threshold.
    Pressed(DragState),
    /// Pointer moved past the threshold; the node follows it.
    Dragging(DragState),
}

impl InputState {
    /// Drag context of the current gesture, if any.
    #[must_use]
    pub fn drag(&self) -> Option<&DragState> {
        match self {
            Self::Idle => None,
            Self::Pressed(drag) | Self::Dragging(drag) => Some(drag),
        }
    }
}
