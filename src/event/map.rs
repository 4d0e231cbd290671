//! Declarative event maps and what their handlers receive.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::dispatch::DomEvent;
use crate::dom::ElementId;
use crate::view::ViewId;

// ---------------------------------------------------------------------------
// SlotInstance
// ---------------------------------------------------------------------------

/// A snapshot of the slot a handler is bound to.
///
/// The node bounds are `None` while no region is mounted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlotInstance {
    pub view: Option<ViewId>,
    pub data: Option<Value>,
    pub first_node: Option<ElementId>,
    pub last_node: Option<ElementId>,
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// The handler's receiver: the bound `this` argument if one was given,
/// otherwise the element the listener matched.
#[derive(Clone)]
pub enum Receiver {
    Bound(Rc<dyn Any>),
    Element(ElementId),
}

impl Receiver {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Receiver::Bound(value) => value.downcast_ref::<T>(),
            Receiver::Element(_) => None,
        }
    }

    pub fn element(&self) -> Option<ElementId> {
        match self {
            Receiver::Element(el) => Some(*el),
            Receiver::Bound(_) => None,
        }
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Bound(_) => write!(f, "Bound(<any>)"),
            Receiver::Element(el) => f.debug_tuple("Element").field(el).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventContext
// ---------------------------------------------------------------------------

/// Everything an [`EventMap`] handler is called with.
#[derive(Debug)]
pub struct EventContext<'a> {
    pub event: &'a DomEvent,
    pub instance: SlotInstance,
    /// Data context of the view that rendered the matched element; `{}`
    /// when there is none.
    pub data: Value,
    pub receiver: Receiver,
}

// ---------------------------------------------------------------------------
// EventMap
// ---------------------------------------------------------------------------

pub type EventHandler = Rc<dyn Fn(&EventContext<'_>)>;

/// Event spec → handler, in insertion order.
///
/// Specs are parsed when the map is bound, so a malformed selector surfaces
/// as an error from [`Slot::events`](crate::slot::Slot::events).
#[derive(Clone, Default)]
pub struct EventMap {
    entries: Vec<(String, EventHandler)>,
}

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder).
    pub fn on(mut self, spec: impl Into<String>, handler: impl Fn(&EventContext<'_>) + 'static) -> Self {
        self.insert(spec, handler);
        self
    }

    pub fn insert(&mut self, spec: impl Into<String>, handler: impl Fn(&EventContext<'_>) + 'static) {
        self.entries.push((spec.into(), Rc::new(handler)));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventHandler)> {
        self.entries.iter().map(|(spec, handler)| (spec.as_str(), handler))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EventMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(spec, _)| spec))
            .finish()
    }
}
