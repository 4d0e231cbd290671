//! Reactive getter/setter pairs for a slot's renderable and data context.
//!
//! Each resolver owns one [`Dependency`]; reads subscribe the running
//! effect, writes that change the stored source notify it. The two
//! dependencies are independent, so a data write never re-runs a computation
//! that only read the renderable.

use std::cell::RefCell;

use serde_json::Value;

use super::renderable::{Renderable, Source};
use crate::reactive::Dependency;

/// Swap `slot` to `value` unless it already holds the same source.
///
/// `None` when nothing changed; otherwise the previous source, so it can be
/// dropped outside the borrow.
fn replace_if_changed<T: PartialEq>(
    slot: &RefCell<Option<Source<T>>>,
    value: Option<Source<T>>,
) -> Option<Option<Source<T>>> {
    let mut current = slot.borrow_mut();
    let same = match (&*current, &value) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_as(b),
        _ => false,
    };
    if same {
        return None;
    }
    Some(std::mem::replace(&mut *current, value))
}

// ---------------------------------------------------------------------------
// RenderableResolver
// ---------------------------------------------------------------------------

/// Which renderable a slot shows: direct, else default, else none.
pub struct RenderableResolver {
    direct: RefCell<Option<Source<Renderable>>>,
    default: RefCell<Option<Source<Renderable>>>,
    dep: Dependency,
}

impl RenderableResolver {
    pub fn new(direct: Option<Source<Renderable>>, default: Option<Source<Renderable>>) -> Self {
        Self {
            direct: RefCell::new(direct),
            default: RefCell::new(default),
            dep: Dependency::new(),
        }
    }

    /// Tracked read.
    ///
    /// A direct source that is unset, or holds `Renderable::None`, falls
    /// through to the default. A direct accessor is always invoked, even if
    /// it yields `None`.
    pub fn get(&self) -> Renderable {
        self.dep.depend();
        let direct = self.direct.borrow().clone();
        match direct {
            Some(Source::Value(Renderable::None)) | None => {}
            Some(source) => return source.read(),
        }
        let default = self.default.borrow().clone();
        default.map(|source| source.read()).unwrap_or_default()
    }

    /// Store a new direct source. Returns `false`, without notifying, when
    /// it is the same as the current one.
    pub fn set(&self, value: Option<Source<Renderable>>) -> bool {
        let Some(previous) = replace_if_changed(&self.direct, value) else {
            return false;
        };
        drop(previous);
        self.dep.changed();
        true
    }

    /// Untracked; never notifies.
    pub fn get_default(&self) -> Option<Source<Renderable>> {
        self.default.borrow().clone()
    }

    /// Untracked; never notifies.
    pub fn set_default(&self, value: Option<Source<Renderable>>) {
        let previous = self.default.replace(value);
        drop(previous);
    }

    /// Unset the direct source and notify unconditionally.
    pub fn clear(&self) {
        let previous = self.direct.replace(None);
        drop(previous);
        self.dep.changed();
    }

    pub fn dependency(&self) -> Dependency {
        self.dep
    }
}

// ---------------------------------------------------------------------------
// DataContextResolver
// ---------------------------------------------------------------------------

/// The data context a slot passes to its renderable.
pub struct DataContextResolver {
    direct: RefCell<Option<Source<Option<Value>>>>,
    dep: Dependency,
}

impl DataContextResolver {
    pub fn new(direct: Option<Source<Option<Value>>>) -> Self {
        Self {
            direct: RefCell::new(direct),
            dep: Dependency::new(),
        }
    }

    /// Tracked read of the direct data, invoking an accessor.
    pub fn get(&self) -> Option<Value> {
        self.dep.depend();
        let direct = self.direct.borrow().clone();
        direct.and_then(|source| source.read())
    }

    /// The direct data, or `fallback()` when it is absent.
    pub fn get_or_else(&self, fallback: impl FnOnce() -> Option<Value>) -> Option<Value> {
        self.get().or_else(fallback)
    }

    pub fn set(&self, value: Option<Source<Option<Value>>>) -> bool {
        let Some(previous) = replace_if_changed(&self.direct, value) else {
            return false;
        };
        drop(previous);
        self.dep.changed();
        true
    }

    /// Unset the direct data without notifying.
    pub fn unset(&self) {
        let previous = self.direct.replace(None);
        drop(previous);
    }

    pub fn dependency(&self) -> Dependency {
        self.dep
    }
}
