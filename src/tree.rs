//! Document model: SVG nodes and the pure operations that rewrite them.
//!
//! A document is a single root [`Node`] (always the `svg` element). Children are held
//! behind [`Rc`], and every operation here is a function from an old root to a new one:
//! the node being changed is cloned, each ancestor on the path back to the root is
//! shallow-cloned, and every other subtree is shared by reference with the old root.
//! Nothing in this module touches a render surface, so the whole tree can be exercised
//! headless.
//!
//! Lookups and updates on ids that are not present are total: they report "not found"
//! or hand back the unchanged root instead of failing.

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::consts::{COPY_SUFFIX, GROUP_TAG, ID_ATTR, SYNTHETIC_ID_PREFIX, TEXT_TAG};

/// Identifier of a node, unique across one tree.
pub type NodeId = String;

/// Shared handle to an immutable node.
pub type NodeRef = Rc<Node>;

/// One element or text leaf in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identifier; mirrored into [`ID_ATTR`] on elements.
    pub id: NodeId,
    /// Element name, or [`TEXT_TAG`] for text leaves.
    pub tag: String,
    /// Open attribute bag. Unknown attributes round-trip untouched.
    pub attributes: BTreeMap<String, String>,
    /// Children in paint order.
    pub children: Vec<NodeRef>,
    /// Payload of a text leaf; `None` on elements.
    pub text: Option<String>,
}

impl Node {
    /// Create an element with no children. The id marker attribute is set.
    #[must_use]
    pub fn element(id: impl Into<NodeId>, tag: impl Into<String>) -> Self {
        let id = id.into();
        let mut attributes = BTreeMap::new();
        attributes.insert(ID_ATTR.to_owned(), id.clone());
        Self { id, tag: tag.into(), attributes, children: Vec::new(), text: None }
    }

    /// Create a text leaf. Text leaves carry no attributes.
    #[must_use]
    pub fn text_leaf(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: TEXT_TAG.to_owned(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: Some(text.into()),
        }
    }

    /// Builder: set an attribute and return the node.
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder: append a child and return the node.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Rc::new(child));
        self
    }

    /// Whether this node is a text leaf.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    /// Value of a bare attribute.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Insert or replace a bare attribute.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_owned(), value.to_owned());
    }

    /// Remove a bare attribute, returning its previous value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    /// Text of the first text-leaf child, if any.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.is_text())
            .and_then(|c| c.text.as_deref())
    }

    fn with_children(&self, children: Vec<NodeRef>) -> Self {
        Self {
            id: self.id.clone(),
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            children,
            text: self.text.clone(),
        }
    }
}

/// Source of synthetic ids (`node-1`, `node-2`, …).
///
/// Owned by whoever builds trees (the import pipeline and the engine), so several
/// editors can coexist without sharing a counter.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next synthetic id not contained in `taken`.
    pub fn fresh(&mut self, taken: &HashSet<NodeId>) -> NodeId {
        loop {
            self.next += 1;
            let id = format!("{SYNTHETIC_ID_PREFIX}{}", self.next);
            if !taken.contains(&id) {
                return id;
            }
        }
    }
}

// =============================================================
// Queries
// =============================================================

/// Deep copy with freshly allocated attribute maps and children. Ids are kept.
#[must_use]
pub fn deep_clone(node: &Node) -> Node {
    Node {
        id: node.id.clone(),
        tag: node.tag.clone(),
        attributes: node.attributes.clone(),
        children: node
            .children
            .iter()
            .map(|c| Rc::new(deep_clone(c)))
            .collect(),
        text: node.text.clone(),
    }
}

/// Depth-first search for the node with `id`.
#[must_use]
pub fn find<'a>(root: &'a NodeRef, id: &str) -> Option<&'a NodeRef> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find(c, id))
}

/// Immediate parent of the node with `id`. The root has no parent.
#[must_use]
pub fn find_parent<'a>(root: &'a NodeRef, id: &str) -> Option<&'a NodeRef> {
    for child in &root.children {
        if child.id == id {
            return Some(root);
        }
        if let Some(parent) = find_parent(child, id) {
            return Some(parent);
        }
    }
    None
}

/// Every node id in the tree, text leaves included.
#[must_use]
pub fn collect_ids(root: &Node) -> HashSet<NodeId> {
    fn walk(node: &Node, out: &mut HashSet<NodeId>) {
        out.insert(node.id.clone());
        for child in &node.children {
            walk(child, out);
        }
    }
    let mut out = HashSet::new();
    walk(root, &mut out);
    out
}

/// Total number of nodes, text leaves included.
#[must_use]
pub fn count_nodes(root: &Node) -> usize {
    1 + root.children.iter().map(|c| count_nodes(c)).sum::<usize>()
}

/// Depth-first listing of every id that may ever be selected: everything except the
/// root and text leaves.
#[must_use]
pub fn list_selectable_ids(root: &Node) -> Vec<NodeId> {
    fn walk(node: &Node, out: &mut Vec<NodeId>) {
        if node.is_text() {
            return;
        }
        out.push(node.id.clone());
        for child in &node.children {
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    for child in &root.children {
        walk(child, &mut out);
    }
    out
}

/// Whether `id` names a selectable node in this tree.
#[must_use]
pub fn is_selectable(root: &NodeRef, id: &str) -> bool {
    root.id != id && find(root, id).is_some_and(|n| !n.is_text())
}

// =============================================================
// Updates
// =============================================================

/// New tree with `mutate` applied to a clone of the node matching `id`.
///
/// Ancestors on the path are shallow-cloned; all other subtrees are shared with `root`.
/// When `id` is absent the returned root is `root` itself.
#[must_use]
pub fn update_one(root: &NodeRef, id: &str, mutate: impl FnOnce(&mut Node)) -> NodeRef {
    let mut mutate = Some(mutate);
    update_path(root, id, &mut mutate).unwrap_or_else(|| Rc::clone(root))
}

fn update_path<F: FnOnce(&mut Node)>(node: &NodeRef, id: &str, mutate: &mut Option<F>) -> Option<NodeRef> {
    if node.id == id {
        let mut next = (**node).clone();
        if let Some(f) = mutate.take() {
            f(&mut next);
        }
        return Some(Rc::new(next));
    }
    for (i, child) in node.children.iter().enumerate() {
        if let Some(updated) = update_path(child, id, mutate) {
            let mut children = node.children.clone();
            children[i] = updated;
            return Some(Rc::new(node.with_children(children)));
        }
    }
    None
}

/// New tree with `mutate` applied to every node whose id is in `ids`, at any depth,
/// in a single traversal. Nested matches are all mutated.
#[must_use]
pub fn update_many(root: &NodeRef, ids: &HashSet<NodeId>, mut mutate: impl FnMut(&mut Node)) -> NodeRef {
    update_matching(root, ids, &mut mutate).unwrap_or_else(|| Rc::clone(root))
}

fn update_matching(node: &NodeRef, ids: &HashSet<NodeId>, mutate: &mut dyn FnMut(&mut Node)) -> Option<NodeRef> {
    let mut children: Option<Vec<NodeRef>> = None;
    for (i, child) in node.children.iter().enumerate() {
        if let Some(updated) = update_matching(child, ids, mutate) {
            children.get_or_insert_with(|| node.children.clone())[i] = updated;
        }
    }
    let hit = ids.contains(node.id.as_str());
    if !hit && children.is_none() {
        return None;
    }
    let mut next = node.with_children(children.unwrap_or_else(|| node.children.clone()));
    if hit {
        mutate(&mut next);
    }
    Some(Rc::new(next))
}

/// New tree without the node matching `id`. `None` when the root itself is targeted.
#[must_use]
pub fn remove_one(root: &NodeRef, id: &str) -> Option<NodeRef> {
    if root.id == id {
        return None;
    }
    Some(remove_where(root, &|n: &Node| n.id == id).unwrap_or_else(|| Rc::clone(root)))
}

/// New tree without any node whose id is in `ids`, at any depth. `None` when the
/// root itself is in `ids`.
#[must_use]
pub fn remove_many(root: &NodeRef, ids: &HashSet<NodeId>) -> Option<NodeRef> {
    if ids.contains(root.id.as_str()) {
        return None;
    }
    Some(remove_where(root, &|n: &Node| ids.contains(n.id.as_str())).unwrap_or_else(|| Rc::clone(root)))
}

fn remove_where(node: &NodeRef, doomed: &dyn Fn(&Node) -> bool) -> Option<NodeRef> {
    let mut changed = false;
    let mut kept = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if doomed(child) {
            changed = true;
            continue;
        }
        if let Some(updated) = remove_where(child, doomed) {
            changed = true;
            kept.push(updated);
        } else {
            kept.push(Rc::clone(child));
        }
    }
    changed.then(|| Rc::new(node.with_children(kept)))
}

// =============================================================
// Structural edits
// =============================================================

/// Deep clone of `node` with every id in the subtree rewritten to a derived id that
/// is not in `taken`. New ids are added to `taken`.
///
/// An element that carried an SVG `id` attribute gets it rewritten as well, so the
/// copy never reintroduces a duplicate identifier on re-import.
#[must_use]
pub fn duplicate(node: &Node, taken: &mut HashSet<NodeId>) -> Node {
    let id = derive_copy_id(&node.id, taken);
    let children = node
        .children
        .iter()
        .map(|c| Rc::new(duplicate(c, taken)))
        .collect();
    let mut copy = Node {
        id: id.clone(),
        tag: node.tag.clone(),
        attributes: node.attributes.clone(),
        children,
        text: node.text.clone(),
    };
    if !copy.is_text() {
        if copy.attributes.contains_key("id") {
            copy.set_attr("id", &id);
        }
        copy.set_attr(ID_ATTR, &id);
    }
    copy
}

/// `<base>-copy`, then `<base>-copy-2`, `<base>-copy-3`, … until unused.
pub fn derive_copy_id(base: &str, taken: &mut HashSet<NodeId>) -> NodeId {
    let mut candidate = format!("{base}{COPY_SUFFIX}");
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}{COPY_SUFFIX}-{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// New tree with `node` inserted directly after the sibling `anchor_id`, so it paints
/// on top of it. Unchanged when the anchor is missing or is the root.
#[must_use]
pub fn insert_after(root: &NodeRef, anchor_id: &str, node: NodeRef) -> NodeRef {
    let Some(parent) = find_parent(root, anchor_id) else {
        return Rc::clone(root);
    };
    update_one(root, &parent.id, |p| {
        if let Some(i) = p.children.iter().position(|c| c.id == anchor_id) {
            p.children.insert(i + 1, node);
        }
    })
}

/// Wrap the node `id` in a new `<g>` occupying its paint position.
///
/// `None` when `id` is missing, is the root, or is a text leaf.
#[must_use]
pub fn group(root: &NodeRef, id: &str, group_id: &str) -> Option<NodeRef> {
    let target = find(root, id).filter(|n| !n.is_text())?;
    let parent = find_parent(root, id)?;
    let mut wrapper = Node::element(group_id, GROUP_TAG);
    wrapper.children.push(Rc::clone(target));
    let wrapper = Rc::new(wrapper);
    Some(update_one(root, &parent.id, |p| {
        if let Some(i) = p.children.iter().position(|c| c.id == id) {
            p.children[i] = wrapper;
        }
    }))
}

/// Splice the children of the `<g>` named `id` into its parent in its place.
///
/// The group's own `transform` is prefixed onto each lifted element so nothing moves.
/// Returns the new root and the id of the first lifted element, or `None` when `id` is
/// not a non-root group.
#[must_use]
pub fn ungroup(root: &NodeRef, id: &str) -> Option<(NodeRef, Option<NodeId>)> {
    let target = find(root, id).filter(|n| n.tag == GROUP_TAG)?;
    let parent = find_parent(root, id)?;

    let group_transform = target
        .attr("transform")
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let lifted: Vec<NodeRef> = match group_transform {
        Some(outer) => target
            .children
            .iter()
            .map(|c| {
                if c.is_text() {
                    return Rc::clone(c);
                }
                let mut child = (**c).clone();
                let combined = match child.attr("transform") {
                    Some(inner) => format!("{outer} {inner}"),
                    None => outer.to_owned(),
                };
                child.set_attr("transform", combined.trim());
                Rc::new(child)
            })
            .collect(),
        None => target.children.clone(),
    };
    let first = lifted.iter().find(|c| !c.is_text()).map(|c| c.id.clone());

    let next = update_one(root, &parent.id, |p| {
        if let Some(i) = p.children.iter().position(|c| c.id == id) {
            let tail = p.children.split_off(i + 1);
            p.children.pop();
            p.children.extend(lifted);
            p.children.extend(tail);
        }
    });
    Some((next, first))
}

/// Replace the node's first text-leaf child with `text`.
///
/// A leaf is appended (with an id from `fresh_id`) when none exists, and the existing
/// leaf is dropped when `text` is empty.
pub fn set_text(node: &mut Node, text: &str, fresh_id: impl FnOnce() -> NodeId) {
    let position = node.children.iter().position(|c| c.is_text());
    match position {
        Some(i) if text.is_empty() => {
            node.children.remove(i);
        }
        Some(i) => {
            let id = node.children[i].id.clone();
            node.children[i] = Rc::new(Node::text_leaf(id, text));
        }
        None if text.is_empty() => {}
        None => node.children.push(Rc::new(Node::text_leaf(fresh_id(), text))),
    }
}
