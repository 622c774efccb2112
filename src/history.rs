//! Linear undo/redo history and the debounce deadline for coalesced edits.
//!
//! DESIGN
//! ======
//! History is a list of full-tree snapshots plus a cursor. Trees are immutable once
//! built, so a snapshot is just another handle to a root; nothing can reach into a stored
//! snapshot and change it. Committing from a non-tip cursor discards the redo branch.
//!
//! Continuous edits (a color picker being dragged) are not snapshotted one by one. Each
//! such edit re-arms a single [`Debounce`] deadline; once input has been quiet for the
//! window the owner commits one snapshot of whatever the tree looks like by then.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::rc::Rc;

use crate::tree::NodeRef;

/// Ordered tree snapshots with a cursor.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<NodeRef>,
    index: usize,
}

impl History {
    /// Empty history (no document loaded).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a single entry.
    pub fn reset(&mut self, root: NodeRef) {
        self.entries = vec![root];
        self.index = 0;
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }

    /// Append a snapshot after the cursor, discarding any redo entries first.
    pub fn push(&mut self, root: NodeRef) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(root);
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry. `None` at the first entry.
    pub fn undo(&mut self) -> Option<NodeRef> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).map(Rc::clone)
    }

    /// Step forward one entry. `None` at the tip.
    pub fn redo(&mut self) -> Option<NodeRef> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).map(Rc::clone)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Snapshot under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&NodeRef> {
        self.entries.get(self.index)
    }

    /// Cursor position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trailing-edge debounce expressed as a deadline on a caller-supplied clock (ms).
///
/// Re-arming replaces the deadline in one assignment, so there is never more than one
/// pending commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debounce {
    window_ms: f64,
    deadline: Option<f64>,
}

impl Debounce {
    #[must_use]
    pub fn new(window_ms: f64) -> Self {
        Self { window_ms: window_ms.max(0.0), deadline: None }
    }

    /// Quiet period required before the pending commit fires.
    #[must_use]
    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Cancel any pending deadline and schedule a new one `window_ms` after `now_ms`.
    pub fn arm(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.window_ms);
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending commit is due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// Consume the deadline if it has passed at `now_ms`.
    pub fn take_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
