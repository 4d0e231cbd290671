//! Rendered regions: the live document range produced by a view.

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::dom::{Document, ElementId};

type AttachCallback = Box<dyn FnOnce(ElementId)>;

/// The top-level elements a view's last render pass produced, plus where
/// they sit in the document.
///
/// A region is *attached* once its parent element is connected to the body.
/// Callbacks registered with [`on_attached`](Self::on_attached) before that
/// fire exactly once, at the first attach.
pub struct Region {
    members: RefCell<Vec<ElementId>>,
    parent_element: Cell<Option<ElementId>>,
    attached: Cell<bool>,
    on_attached: RefCell<Vec<AttachCallback>>,
}

impl Region {
    pub fn new() -> Self {
        Self {
            members: RefCell::new(Vec::new()),
            parent_element: Cell::new(None),
            attached: Cell::new(false),
            on_attached: RefCell::new(Vec::new()),
        }
    }

    pub fn first_node(&self) -> Option<ElementId> {
        self.members.borrow().first().copied()
    }

    pub fn last_node(&self) -> Option<ElementId> {
        self.members.borrow().last().copied()
    }

    pub fn members(&self) -> Vec<ElementId> {
        self.members.borrow().clone()
    }

    pub fn set_members(&self, members: Vec<ElementId>) {
        *self.members.borrow_mut() = members;
    }

    /// The element the members are children of.
    pub fn parent_element(&self) -> Option<ElementId> {
        self.parent_element.get()
    }

    pub fn set_parent_element(&self, parent: ElementId) {
        self.parent_element.set(Some(parent));
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Whether `el` is a member or a descendant of one.
    pub fn contains_element(&self, doc: &Document, el: ElementId) -> bool {
        let members = self.members.borrow();
        if members.is_empty() || !doc.contains(el) {
            return false;
        }
        std::iter::once(el)
            .chain(doc.ancestors(el))
            .any(|candidate| members.contains(&candidate))
    }

    /// Run `f` with the parent element the first time the region attaches.
    ///
    /// Callers check [`is_attached`](Self::is_attached) first; a callback
    /// registered on an attached region waits for the next attach.
    pub fn on_attached(&self, f: impl FnOnce(ElementId) + 'static) {
        self.on_attached.borrow_mut().push(Box::new(f));
    }

    /// Mark the region attached under `parent` and drain pending callbacks.
    pub fn attach(&self, parent: ElementId) {
        self.parent_element.set(Some(parent));
        if self.attached.replace(true) {
            return;
        }
        let callbacks = std::mem::take(&mut *self.on_attached.borrow_mut());
        tracing::debug!(callbacks = callbacks.len(), "region attached");
        for callback in callbacks {
            callback(parent);
        }
    }

    /// Forget members and attachment; pending callbacks are dropped.
    pub fn detach(&self) {
        self.attached.set(false);
        self.parent_element.set(None);
        self.members.borrow_mut().clear();
        let dropped = std::mem::take(&mut *self.on_attached.borrow_mut());
        drop(dropped);
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("members", &self.members.borrow())
            .field("parent_element", &self.parent_element.get())
            .field("attached", &self.attached.get())
            .field("pending_callbacks", &self.on_attached.borrow().len())
            .finish()
    }
}
