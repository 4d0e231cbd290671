//! Lifecycle phases and per-phase hook lists.
//!
//! A [`HookRegistry`] records callbacks per [`Phase`] and runs them in
//! registration order when the host reports that phase. The first failing
//! hook stops the run and its error is returned to whoever drove the phase.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::SlotError;

pub type HookError = Box<dyn std::error::Error>;

/// A lifecycle hook, called with the controller it is registered on.
pub type Hook<S> = Rc<dyn Fn(&S) -> Result<(), HookError>>;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// A point in a slot's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The slot's view exists; nothing is rendered yet.
    Created,
    /// The first render pass finished and its region is in the document.
    Ready,
    /// A render pass finished. Fires once per pass.
    Rendered,
    /// The slot was torn down.
    Destroyed,
    /// Application-defined.
    Custom(String),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Created => write!(f, "created"),
            Phase::Ready => write!(f, "ready"),
            Phase::Rendered => write!(f, "rendered"),
            Phase::Destroyed => write!(f, "destroyed"),
            Phase::Custom(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// HookRegistry
// ---------------------------------------------------------------------------

/// Ordered hooks per phase.
///
/// Hooks registered while a phase is running are kept, but only fire on the
/// next transition into that phase.
pub struct HookRegistry<S> {
    hooks: RefCell<HashMap<Phase, Vec<Hook<S>>>>,
}

impl<S> HookRegistry<S> {
    pub fn new() -> Self {
        Self {
            hooks: RefCell::new(HashMap::new()),
        }
    }

    /// Append `hook` to the list for `phase`.
    pub fn on(&self, phase: Phase, hook: impl Fn(&S) -> Result<(), HookError> + 'static) {
        self.hooks
            .borrow_mut()
            .entry(phase)
            .or_default()
            .push(Rc::new(hook));
    }

    /// Snapshot of the hooks for `phase`, in registration order.
    pub fn hooks_for(&self, phase: &Phase) -> Vec<Hook<S>> {
        self.hooks.borrow().get(phase).cloned().unwrap_or_default()
    }

    pub fn count(&self, phase: &Phase) -> usize {
        self.hooks.borrow().get(phase).map_or(0, Vec::len)
    }

    /// Run every hook for `phase` with `subject`. Stops at the first error.
    pub fn run(&self, phase: &Phase, subject: &S) -> Result<(), SlotError> {
        for hook in self.hooks_for(phase) {
            hook(subject).map_err(|source| SlotError::Hook {
                phase: phase.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl<S> Default for HookRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for HookRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.borrow();
        let mut map = f.debug_map();
        for (phase, list) in hooks.iter() {
            map.entry(phase, &list.len());
        }
        map.finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Log = RefCell<Vec<String>>;

    #[test]
    fn runs_in_registration_order() {
        let hooks: HookRegistry<Log> = HookRegistry::new();
        hooks.on(Phase::Rendered, |log: &Log| {
            log.borrow_mut().push("first".into());
            Ok(())
        });
        hooks.on(Phase::Rendered, |log: &Log| {
            log.borrow_mut().push("second".into());
            Ok(())
        });
        hooks.on(Phase::Created, |log: &Log| {
            log.borrow_mut().push("created".into());
            Ok(())
        });

        let log = Log::default();
        hooks.run(&Phase::Rendered, &log).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(hooks.count(&Phase::Rendered), 2);
        assert_eq!(hooks.count(&Phase::Destroyed), 0);
    }

    #[test]
    fn first_error_stops_the_run() {
        let hooks: HookRegistry<Cell<u32>> = HookRegistry::new();
        hooks.on(Phase::Ready, |_| Err("boom".into()));
        hooks.on(Phase::Ready, |calls: &Cell<u32>| {
            calls.set(calls.get() + 1);
            Ok(())
        });

        let calls = Cell::new(0);
        let err = hooks.run(&Phase::Ready, &calls).unwrap_err();
        assert_eq!(err.to_string(), "ready hook failed: boom");
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn hooks_added_during_a_run_wait_for_the_next_one() {
        let hooks: Rc<HookRegistry<Cell<u32>>> = Rc::new(HookRegistry::new());
        let hooks_c = Rc::downgrade(&hooks);
        hooks.on(Phase::Rendered, move |_| {
            if let Some(hooks) = hooks_c.upgrade() {
                hooks.on(Phase::Rendered, |calls: &Cell<u32>| {
                    calls.set(calls.get() + 1);
                    Ok(())
                });
            }
            Ok(())
        });

        let calls = Cell::new(0);
        hooks.run(&Phase::Rendered, &calls).unwrap();
        assert_eq!(calls.get(), 0);
        hooks.run(&Phase::Rendered, &calls).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn custom_phase_display() {
        assert_eq!(Phase::Custom("saved".into()).to_string(), "saved");
        assert_eq!(Phase::Destroyed.to_string(), "destroyed");
    }
}
