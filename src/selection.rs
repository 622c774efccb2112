//! Selection set and the control values derived from it.
//!
//! The selection is an insertion-ordered set of node ids. The root is never a member:
//! "nothing selected" is the root-focused state, and every entry point rejects the root,
//! text leaves and ids the current tree does not contain. Ids that go stale after a
//! delete are tolerated; lookups on them simply find nothing.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::HashSet;

use serde::Serialize;

use crate::consts::{DEFAULT_FILL, DEFAULT_STROKE};
use crate::input::ClickKind;
use crate::style::get_effective;
use crate::transform;
use crate::tree::{self, Node, NodeId, NodeRef};

/// Ordered set of selected node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<NodeId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// The id whose values drive the controls.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids as a set, for batch tree updates.
    #[must_use]
    pub fn to_set(&self) -> HashSet<NodeId> {
        self.ids.iter().cloned().collect()
    }

    /// Deselect everything (root focus). Returns whether anything changed.
    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    /// Select exactly `id` if it is selectable in `root`. Returns whether anything changed.
    pub fn select_only(&mut self, root: &NodeRef, id: &str) -> bool {
        if !tree::is_selectable(root, id) {
            return false;
        }
        if self.ids.len() == 1 && self.ids[0] == id {
            return false;
        }
        self.ids = vec![id.to_owned()];
        true
    }

    /// Apply a click on `id`. Returns whether the set changed.
    ///
    /// Clicks on the root, on text leaves and on unknown ids are ignored.
    pub fn click(&mut self, root: &NodeRef, id: &str, kind: ClickKind) -> bool {
        if !tree::is_selectable(root, id) {
            return false;
        }
        match kind {
            ClickKind::Replace => {
                if self.ids.len() == 1 && self.ids[0] == id {
                    self.ids.clear();
                } else {
                    self.ids = vec![id.to_owned()];
                }
                true
            }
            ClickKind::Toggle => {
                if let Some(pos) = self.ids.iter().position(|s| s == id) {
                    self.ids.remove(pos);
                } else {
                    self.ids.push(id.to_owned());
                }
                true
            }
            ClickKind::Extend => {
                if self.contains(id) {
                    return false;
                }
                self.ids.push(id.to_owned());
                true
            }
        }
    }

    /// Toggle between every selectable node and nothing.
    ///
    /// Selects everything unless everything is already selected, in which case the
    /// selection is cleared.
    pub fn select_all(&mut self, root: &NodeRef) -> bool {
        let all = tree::list_selectable_ids(root);
        if all.iter().all(|id| self.contains(id)) {
            return self.clear();
        }
        self.ids = all;
        true
    }

    /// Drop ids that no longer name a selectable node in `root`.
    pub fn prune(&mut self, root: &NodeRef) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| tree::is_selectable(root, id));
        self.ids.len() != before
    }
}

/// Values shown in the editing controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlValues {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_dasharray: String,
    pub opacity: f64,
    /// Rotation in degrees, read from the `transform` attribute.
    pub rotation: f64,
    pub text: String,
}

impl Default for ControlValues {
    fn default() -> Self {
        Self {
            fill: DEFAULT_FILL.to_owned(),
            stroke: DEFAULT_STROKE.to_owned(),
            stroke_width: 1.0,
            stroke_dasharray: String::new(),
            opacity: 1.0,
            rotation: 0.0,
            text: String::new(),
        }
    }
}

impl ControlValues {
    /// Read what `node` actually renders with, falling back to defaults per field.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        let defaults = Self::default();
        let number = |key: &str, fallback: f64| {
            match get_effective(node, key).map(|v| v.parse::<f64>()) {
                Some(Ok(v)) if v.is_finite() => v,
                _ => fallback,
            }
        };
        Self {
            fill: get_effective(node, "fill").unwrap_or(defaults.fill),
            stroke: get_effective(node, "stroke").unwrap_or(defaults.stroke),
            stroke_width: number("stroke-width", defaults.stroke_width),
            stroke_dasharray: get_effective(node, "stroke-dasharray").unwrap_or_default(),
            opacity: number("opacity", defaults.opacity),
            rotation: node
                .attr("transform")
                .and_then(|t| transform::parse(t).rotate)
                .unwrap_or(defaults.rotation),
            text: node.text_content().unwrap_or_default().to_owned(),
        }
    }

    /// Controls for the first selected id, or defaults when nothing resolves.
    #[must_use]
    pub fn derive(root: Option<&NodeRef>, selection: &Selection) -> Self {
        root.zip(selection.first())
            .and_then(|(root, id)| tree::find(root, id))
            .map(|node| Self::from_node(node))
            .unwrap_or_default()
    }
}
