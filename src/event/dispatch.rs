//! DOM events, the low-level `listen` primitive, and bubbling dispatch with
//! selector delegation.
//!
//! A listener is registered on one element for one event name, optionally
//! with a selector. When an event bubbles through that element the listener
//! fires once per element between the target and the listener element
//! (innermost first) that matches the selector; with no selector it fires
//! for the listener element's child on the bubble path. The matched element
//! is exposed as [`DomEvent::current_target`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use slotmap::{new_key_type, SlotMap};

use super::spec::parse_event_spec;
use crate::dom::selector::{parse_selector_list, Selector};
use crate::dom::{Document, ElementId};
use crate::error::SlotError;

new_key_type! {
    /// Identifies a registered listener.
    pub struct ListenerId;
}

// ---------------------------------------------------------------------------
// DomEvent
// ---------------------------------------------------------------------------

/// A synthetic document event.
#[derive(Debug)]
pub struct DomEvent {
    pub kind: String,
    pub target: ElementId,
    pub detail: Option<Value>,
    current_target: Cell<Option<ElementId>>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>, target: ElementId) -> Self {
        Self {
            kind: kind.into(),
            target,
            detail: None,
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
        }
    }

    /// Attach a payload (builder).
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// The element the running listener matched; `None` outside dispatch.
    pub fn current_target(&self) -> Option<ElementId> {
        self.current_target.get()
    }

    /// Stop bubbling after the current element's listeners have run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

// ---------------------------------------------------------------------------
// ListenerRegistry
// ---------------------------------------------------------------------------

pub type ListenerFn = Rc<dyn Fn(&DomEvent)>;

struct Listener {
    element: ElementId,
    event: String,
    selectors: Option<Vec<Selector>>,
    handler: ListenerFn,
    /// Registration order; slot reuse makes arena order unreliable.
    seq: u64,
}

type Listeners = RefCell<SlotMap<ListenerId, Listener>>;

/// Every live listener in a document. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Rc<Listeners>,
    next_seq: Rc<Cell<u64>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every clause of `spec` on `element`.
    pub fn listen(
        &self,
        element: ElementId,
        spec: &str,
        handler: impl Fn(&DomEvent) + 'static,
    ) -> Result<Vec<ListenerHandle>, SlotError> {
        let handler: ListenerFn = Rc::new(handler);
        Ok(parse_event_spec(spec)?
            .into_iter()
            .map(|clause| self.listen_parsed(element, &clause.event, clause.selectors, handler.clone()))
            .collect())
    }

    /// Register one listener with a selector string (`None` or empty for
    /// direct children).
    pub fn listen_one(
        &self,
        element: ElementId,
        event: &str,
        selector: Option<&str>,
        handler: ListenerFn,
    ) -> Result<ListenerHandle, SlotError> {
        let selectors = match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => Some(parse_selector_list(text)?),
            None => None,
        };
        Ok(self.listen_parsed(element, event, selectors, handler))
    }

    pub(crate) fn listen_parsed(
        &self,
        element: ElementId,
        event: &str,
        selectors: Option<Vec<Selector>>,
        handler: ListenerFn,
    ) -> ListenerHandle {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        let id = self.listeners.borrow_mut().insert(Listener {
            element,
            event: event.to_owned(),
            selectors,
            handler,
            seq,
        });
        ListenerHandle {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn is_active(&self, id: ListenerId) -> bool {
        self.listeners.borrow().contains_key(id)
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Live listeners registered on `element`.
    pub fn count_on(&self, element: ElementId) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|l| l.element == element)
            .count()
    }

    /// Bubble `event` from its target to the root, invoking matching
    /// listeners. Returns the number of handler invocations.
    ///
    /// No borrow of the document or the registry is held while a handler
    /// runs, so handlers may mutate both. A listener stopped by an earlier
    /// handler in the same dispatch does not fire.
    pub fn dispatch(&self, doc: &RefCell<Document>, event: &DomEvent) -> usize {
        let path = bubble_path(&doc.borrow(), event.target);
        let mut fired = 0;

        for (depth, &element) in path.iter().enumerate() {
            let matched = self.matches_at(&doc.borrow(), event, element, &path[..depth]);
            for (id, current, handler) in matched {
                if !self.is_active(id) {
                    continue;
                }
                event.current_target.set(Some(current));
                handler(event);
                fired += 1;
            }
            if event.is_propagation_stopped() {
                break;
            }
        }

        event.current_target.set(None);
        fired
    }

    /// `(listener, matched element, handler)` for every listener on
    /// `element`, in registration order. `inner` is the bubble path below
    /// `element`, target first.
    fn matches_at(
        &self,
        doc: &Document,
        event: &DomEvent,
        element: ElementId,
        inner: &[ElementId],
    ) -> Vec<(ListenerId, ElementId, ListenerFn)> {
        let listeners = self.listeners.borrow();
        let mut on_element: Vec<(ListenerId, &Listener)> = listeners
            .iter()
            .filter(|(_, l)| l.element == element && l.event == event.kind)
            .collect();
        on_element.sort_by_key(|(_, l)| l.seq);

        let mut matched = Vec::new();
        for (id, listener) in on_element {
            match &listener.selectors {
                None => {
                    if let Some(&child) = inner.last() {
                        matched.push((id, child, listener.handler.clone()));
                    }
                }
                Some(selectors) => {
                    for &candidate in inner {
                        if doc.matches_any(selectors, candidate) {
                            matched.push((id, candidate, listener.handler.clone()));
                        }
                    }
                }
            }
        }
        matched
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// `[start, parent, grandparent, ..., root]`; empty if `start` is gone.
pub fn bubble_path(doc: &Document, start: ElementId) -> Vec<ElementId> {
    if !doc.contains(start) {
        return Vec::new();
    }
    let mut path = vec![start];
    path.extend(doc.ancestors(start));
    path
}

// ---------------------------------------------------------------------------
// ListenerHandle
// ---------------------------------------------------------------------------

/// Stops its listener. Dropping the handle does *not* stop it.
pub struct ListenerHandle {
    id: ListenerId,
    listeners: Weak<Listeners>,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Unregister the listener. Idempotent.
    pub fn stop(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let removed = listeners.borrow_mut().remove(self.id);
            drop(removed);
        }
    }

    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|l| l.borrow().contains_key(self.id))
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
