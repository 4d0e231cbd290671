//! Binding an [`EventMap`] to a slot's rendered region.
//!
//! Listeners are delegated: each clause registers one low-level listener on
//! the region's parent element, and the listener ignores events whose matched
//! element is not inside the region. That check is what keeps a handler from
//! firing for a sibling region that shares the same parent.
//!
//! Rebinding always detaches first, so at most one set of listeners is live
//! per manager.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::debug;

use super::dispatch::{DomEvent, ListenerFn, ListenerHandle};
use super::map::{EventContext, EventHandler, EventMap, Receiver, SlotInstance};
use super::spec::{parse_event_spec, EventClause};
use crate::dom::ElementId;
use crate::error::SlotError;
use crate::view::Region;

/// What a binding manager needs from the thing that owns it.
pub trait EventScope {
    /// Register a low-level listener for one parsed clause.
    fn listen(&self, element: ElementId, clause: &EventClause, handler: ListenerFn) -> ListenerHandle;

    /// Whether `element` lies inside `region` right now.
    fn contains(&self, region: &Region, element: ElementId) -> bool;

    fn instance(&self) -> SlotInstance;

    /// Data context for an event's matched element.
    fn target_data(&self, element: ElementId) -> Value;
}

struct BoundEntry {
    clauses: Vec<EventClause>,
    handler: EventHandler,
}

#[derive(Default)]
struct BindingState {
    entries: Vec<BoundEntry>,
    this_arg: Option<Rc<dyn Any>>,
    handles: Vec<ListenerHandle>,
    /// Region the current listeners were attached for.
    region: Weak<Region>,
    /// Bumped on every bind, attach or reset; a deferred attach only runs if the
    /// generation it captured is still current.
    generation: u64,
}

pub struct EventBindingManager {
    state: Rc<RefCell<BindingState>>,
    scope: Weak<dyn EventScope>,
}

impl EventBindingManager {
    pub fn new(scope: Weak<dyn EventScope>) -> Self {
        Self {
            state: Rc::default(),
            scope,
        }
    }

    /// Replace the bound map, then attach to `region` if one is given.
    ///
    /// Every spec is parsed before anything changes; on error the previous
    /// binding stays in place.
    pub fn bind(
        &self,
        map: &EventMap,
        this_arg: Option<Rc<dyn Any>>,
        region: Option<&Rc<Region>>,
    ) -> Result<(), SlotError> {
        let entries = map
            .iter()
            .map(|(spec, handler)| {
                Ok(BoundEntry {
                    clauses: parse_event_spec(spec)?,
                    handler: handler.clone(),
                })
            })
            .collect::<Result<Vec<_>, SlotError>>()?;

        self.detach();
        {
            let mut state = self.state.borrow_mut();
            state.entries = entries;
            state.this_arg = this_arg;
            state.region = Weak::new();
            state.generation += 1;
        }
        if let Some(region) = region {
            self.attach(region);
        }
        Ok(())
    }

    /// Whether a map is bound (attached or not).
    pub fn has_map(&self) -> bool {
        !self.state.borrow().entries.is_empty()
    }

    /// Attach the bound map to `region`, detaching whatever was attached.
    ///
    /// If the region is not in the document yet, attaching waits for its
    /// first attach notification.
    pub fn attach(&self, region: &Rc<Region>) {
        self.detach();
        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.region = Rc::downgrade(region);
            state.generation
        };

        if region.is_attached() {
            register(&self.state, &self.scope, region);
            return;
        }

        debug!("deferring event attach until region is attached");
        let state = Rc::downgrade(&self.state);
        let scope = self.scope.clone();
        let weak_region = Rc::downgrade(region);
        region.on_attached(move |_| {
            let (Some(state), Some(region)) = (state.upgrade(), weak_region.upgrade()) else {
                return;
            };
            if state.borrow().generation != generation {
                return;
            }
            register(&state, &scope, &region);
        });
    }

    /// Called after every render pass. Attaches only when `region` is not
    /// the region already bound.
    pub fn on_rendered(&self, region: &Rc<Region>) {
        let (bound_here, has_entries) = {
            let state = self.state.borrow();
            let bound_here = state
                .region
                .upgrade()
                .is_some_and(|current| Rc::ptr_eq(&current, region));
            (bound_here, !state.entries.is_empty())
        };
        if has_entries && !bound_here {
            self.attach(region);
        }
    }

    /// Stop every live listener. Idempotent.
    pub fn detach(&self) {
        let handles = std::mem::take(&mut self.state.borrow_mut().handles);
        if !handles.is_empty() {
            debug!(count = handles.len(), "detaching event handlers");
        }
        for handle in &handles {
            handle.stop();
        }
    }

    /// Detach, forget the region, and cancel any pending deferred attach.
    /// The bound map is kept for the next region.
    pub fn reset(&self) {
        self.detach();
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        state.region = Weak::new();
    }

    /// Number of live low-level listeners.
    pub fn active_handles(&self) -> usize {
        self.state
            .borrow()
            .handles
            .iter()
            .filter(|handle| handle.is_active())
            .count()
    }
}

impl fmt::Debug for EventBindingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventBindingManager")
            .field("entries", &state.entries.len())
            .field("handles", &state.handles.len())
            .field("generation", &state.generation)
            .finish()
    }
}

/// Register one listener per clause on the region's parent element.
fn register(state: &Rc<RefCell<BindingState>>, scope: &Weak<dyn EventScope>, region: &Rc<Region>) {
    let Some(scope_rc) = scope.upgrade() else {
        return;
    };
    let Some(container) = region.parent_element() else {
        return;
    };
    let (entries, this_arg) = {
        let state = state.borrow();
        let entries: Vec<(Vec<EventClause>, EventHandler)> = state
            .entries
            .iter()
            .map(|entry| (entry.clauses.clone(), entry.handler.clone()))
            .collect();
        (entries, state.this_arg.clone())
    };

    let mut handles = Vec::new();
    for (clauses, handler) in entries {
        for clause in &clauses {
            let listener = scoped_listener(scope.clone(), Rc::downgrade(region), handler.clone(), this_arg.clone());
            handles.push(scope_rc.listen(container, clause, listener));
        }
    }
    debug!(count = handles.len(), "attached event handlers");
    state.borrow_mut().handles.extend(handles);
}

/// Wrap a map handler in the region containment check.
fn scoped_listener(
    scope: Weak<dyn EventScope>,
    region: Weak<Region>,
    handler: EventHandler,
    this_arg: Option<Rc<dyn Any>>,
) -> ListenerFn {
    Rc::new(move |event: &DomEvent| {
        let (Some(scope), Some(region)) = (scope.upgrade(), region.upgrade()) else {
            return;
        };
        let Some(current) = event.current_target() else {
            return;
        };
        if !scope.contains(&region, event.target) || !scope.contains(&region, current) {
            return;
        }
        let receiver = match &this_arg {
            Some(bound) => Receiver::Bound(bound.clone()),
            None => Receiver::Element(current),
        };
        let cx = EventContext {
            event,
            instance: scope.instance(),
            data: scope.target_data(current),
            receiver,
        };
        handler(&cx);
    })
}
