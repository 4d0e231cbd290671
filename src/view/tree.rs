//! The view tree: a slotmap arena with immutable parent links.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{ViewId, ViewNode};

const EMPTY_CHILDREN: &[ViewId] = &[];

/// Arena of view nodes.
///
/// A node's parent is assigned once, when it is inserted, and never changes.
/// Upward walks therefore cannot cycle, and the tree owns nodes only through
/// the arena (child lists are plain ids).
#[derive(Default)]
pub struct ViewTree {
    views: SlotMap<ViewId, ViewNode>,
    children: SecondaryMap<ViewId, Vec<ViewId>>,
    parent: SecondaryMap<ViewId, ViewId>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root-level view.
    pub fn insert(&mut self, node: ViewNode) -> ViewId {
        let id = self.views.insert(node);
        self.children.insert(id, Vec::new());
        id
    }

    /// Insert a view under `parent`. A missing parent yields a root view.
    pub fn insert_child(&mut self, parent: ViewId, node: ViewNode) -> ViewId {
        let id = self.insert(node);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
            self.parent.insert(id, parent);
        }
        id
    }

    /// Remove a view and all its descendants, returning the removed ids
    /// (the view first, then descendants breadth-first). Data cells of the
    /// removed wrappers are disposed.
    pub fn remove(&mut self, id: ViewId) -> Vec<ViewId> {
        if !self.views.contains_key(id) {
            return Vec::new();
        }
        if let Some(parent) = self.parent.get(id).copied() {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|&c| c != id);
            }
        }

        let mut removed = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                queue.extend(kids);
            }
            self.parent.remove(current);
            if let Some(node) = self.views.remove(current) {
                if let Some(data) = node.data {
                    data.dispose();
                }
                removed.push(current);
            }
        }
        removed
    }

    /// Remove every child subtree of `id`, keeping `id` itself.
    pub fn remove_children(&mut self, id: ViewId) -> Vec<ViewId> {
        let kids = self.children(id).to_vec();
        kids.into_iter().flat_map(|kid| self.remove(kid)).collect()
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.parent.get(id).copied()
    }

    pub fn children(&self, id: ViewId) -> &[ViewId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: ViewId) -> Vec<ViewId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent(current) {
            result.push(p);
            current = p;
        }
        result
    }

    pub fn get(&self, id: ViewId) -> Option<&ViewNode> {
        self.views.get(id)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut ViewNode> {
        self.views.get_mut(id)
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.views.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
