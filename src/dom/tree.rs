//! Tree operations: create, append, insert-before, detach, remove, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{ElementData, ElementId};

/// Empty slice constant for returning when an element has no children.
const EMPTY_CHILDREN: &[ElementId] = &[];

/// The document, backed by a slotmap arena.
///
/// All elements live in a single `SlotMap`. Parent/child relationships are
/// stored in secondary maps so that removal is O(subtree size) and lookup is
/// O(1). A `body` element is created with the document and is never removed;
/// an element is *connected* when its ancestor chain reaches it.
pub struct Document {
    pub(crate) elements: SlotMap<ElementId, ElementData>,
    children: SecondaryMap<ElementId, Vec<ElementId>>,
    parent: SecondaryMap<ElementId, ElementId>,
    body: ElementId,
}

impl Document {
    /// Create a document containing only `body`.
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let body = elements.insert(ElementData::new("body"));
        let mut children = SecondaryMap::new();
        children.insert(body, Vec::new());
        Self {
            elements,
            children,
            parent: SecondaryMap::new(),
            body,
        }
    }

    /// The root `body` element.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, data: ElementData) -> ElementId {
        let id = self.elements.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// Returns `false` (and does nothing) if either element is missing or the
    /// move would make `child` its own ancestor.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `next`.
    ///
    /// `None`, or a `next` that is not a child of `parent`, appends.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        next: Option<ElementId>,
    ) -> bool {
        if !self.contains(parent) || !self.contains(child) || child == self.body {
            return false;
        }
        if parent == child || self.ancestors(parent).contains(&child) {
            return false;
        }

        self.detach(child);

        let Some(siblings) = self.children.get_mut(parent) else {
            return false;
        };
        let index = next
            .and_then(|n| siblings.iter().position(|&s| s == n))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.parent.insert(child, parent);
        true
    }

    /// Remove `id` from its parent, keeping it (and its subtree) alive.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }
    }

    /// Remove an element and all its descendants.
    ///
    /// Returns the `ElementData` for the removed element, or `None` if it
    /// didn't exist. The body cannot be removed.
    pub fn remove(&mut self, id: ElementId) -> Option<ElementData> {
        if !self.elements.contains_key(id) || id == self.body {
            return None;
        }

        self.detach(id);

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed_root_data = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            let data = self.elements.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }

        removed_root_data
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parent.get(id).copied()
    }

    /// Children of an element; empty if it has none or does not exist.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to its root, collecting ancestor ids.
    ///
    /// The returned vec does **not** include `id` itself.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// The sibling immediately after `id` under its parent.
    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&s| s == id)?;
        siblings.get(index + 1).copied()
    }

    /// Whether `id` is the body or has the body as an ancestor.
    pub fn is_connected(&self, id: ElementId) -> bool {
        id == self.body || self.ancestors(id).last() == Some(&self.body)
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementData> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        self.elements.get_mut(id)
    }

    /// Number of elements, connected or not.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`: the body is always present.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.elements.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       body
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Document, ElementId, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element(ElementData::new("ul").with_id("a"));
        let b = doc.create_element(ElementData::new("div").with_id("b"));
        let c = doc.create_element(ElementData::new("li").with_id("c"));
        let d = doc.create_element(ElementData::new("li").with_id("d"));
        doc.append_child(body, a);
        doc.append_child(body, b);
        doc.append_child(a, c);
        doc.append_child(a, d);
        (doc, a, b, c, d)
    }

    #[test]
    fn new_document_has_body() {
        let doc = Document::new();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get(doc.body()).map(|e| e.tag.as_str()), Some("body"));
        assert!(doc.is_connected(doc.body()));
    }

    #[test]
    fn created_elements_are_detached() {
        let mut doc = Document::new();
        let el = doc.create_element(ElementData::new("p"));
        assert_eq!(doc.parent(el), None);
        assert!(!doc.is_connected(el));
    }

    #[test]
    fn append_and_children() {
        let (doc, a, b, c, d) = build_tree();
        assert_eq!(doc.children(doc.body()), &[a, b]);
        assert_eq!(doc.children(a), &[c, d]);
        assert_eq!(doc.parent(c), Some(a));
        assert!(doc.is_connected(d));
    }

    #[test]
    fn insert_before_positions_child() {
        let (mut doc, a, _b, c, d) = build_tree();
        let e = doc.create_element(ElementData::new("li"));
        assert!(doc.insert_before(a, e, Some(d)));
        assert_eq!(doc.children(a), &[c, e, d]);
        assert_eq!(doc.next_sibling(c), Some(e));
        assert_eq!(doc.next_sibling(d), None);
    }

    #[test]
    fn insert_before_foreign_next_appends() {
        let (mut doc, a, b, c, d) = build_tree();
        let e = doc.create_element(ElementData::new("li"));
        doc.insert_before(a, e, Some(b));
        assert_eq!(doc.children(a), &[c, d, e]);
    }

    #[test]
    fn reinserting_moves_element() {
        let (mut doc, a, b, c, d) = build_tree();
        doc.append_child(b, c);
        assert_eq!(doc.children(a), &[d]);
        assert_eq!(doc.ancestors(c), vec![b, doc.body()]);
    }

    #[test]
    fn refuses_cycles() {
        let (mut doc, a, _b, c, _d) = build_tree();
        assert!(!doc.append_child(c, a));
        assert!(!doc.append_child(a, a));
        assert!(!doc.append_child(a, doc.body()));
    }

    #[test]
    fn detach_keeps_subtree() {
        let (mut doc, a, b, c, d) = build_tree();
        doc.detach(a);
        assert_eq!(doc.children(doc.body()), &[b]);
        assert!(!doc.is_connected(c));
        assert_eq!(doc.children(a), &[c, d]);
    }

    #[test]
    fn remove_subtree() {
        let (mut doc, a, b, c, d) = build_tree();
        let removed = doc.remove(a);
        assert_eq!(removed.map(|e| e.tag), Some("ul".to_string()));
        assert!(!doc.contains(a));
        assert!(!doc.contains(c));
        assert!(!doc.contains(d));
        assert_eq!(doc.children(doc.body()), &[b]);
        assert_eq!(doc.len(), 2);
        assert!(doc.remove(a).is_none());
    }

    #[test]
    fn body_cannot_be_removed() {
        let mut doc = Document::new();
        assert!(doc.remove(doc.body()).is_none());
        assert!(!doc.is_empty());
    }

    #[test]
    fn walk_depth_first() {
        let (doc, a, b, c, d) = build_tree();
        assert_eq!(doc.walk_depth_first(doc.body()), vec![doc.body(), a, c, d, b]);
        assert_eq!(doc.walk_depth_first(a), vec![a, c, d]);
    }
}
