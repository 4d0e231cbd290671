//! Higher-level reactive cells built on signals.
//!
//! - [`Dependency`]: a bare invalidation point (`depend` / `changed`) with a
//!   change counter.
//! - [`ReactiveVar`]: a value cell whose writes are ignored when the new value
//!   equals the old one.
//! - [`StateMap`]: a keyed map with one dependency per key, so readers of one
//!   key are not invalidated by writes to another.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::signal::{create_signal, dispose_signal, ReadSignal, WriteSignal};

// ---------------------------------------------------------------------------
// Dependency
// ---------------------------------------------------------------------------

/// A valueless invalidation point.
///
/// `depend()` subscribes the running effect; `changed()` re-runs every
/// subscriber. `Copy`: only stores ids.
#[derive(Clone, Copy)]
pub struct Dependency {
    read: ReadSignal<()>,
    write: WriteSignal<()>,
}

impl Dependency {
    pub fn new() -> Self {
        let (read, write) = create_signal(());
        Self { read, write }
    }

    /// Subscribe the running effect, if any.
    pub fn depend(&self) {
        self.read.with(|_| ());
    }

    /// Invalidate every subscriber.
    pub fn changed(&self) {
        self.write.set(());
    }

    /// Number of times [`changed`](Self::changed) has been called.
    pub fn change_count(&self) -> u64 {
        self.read.version()
    }

    /// Whether any effect currently depends on this.
    pub fn has_dependents(&self) -> bool {
        self.read.subscriber_count() > 0
    }
}

impl Default for Dependency {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("changes", &self.change_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ReactiveVar
// ---------------------------------------------------------------------------

/// A reactive value cell that only notifies when the value actually changes.
pub struct ReactiveVar<T: 'static> {
    read: ReadSignal<T>,
    write: WriteSignal<T>,
}

impl<T: 'static> Copy for ReactiveVar<T> {}
impl<T: 'static> Clone for ReactiveVar<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveVar<T> {
    pub fn new(initial: T) -> Self {
        let (read, write) = create_signal(initial);
        Self { read, write }
    }

    /// Tracked read.
    pub fn get(&self) -> T {
        self.read.get()
    }

    pub fn get_untracked(&self) -> T {
        self.read.get_untracked()
    }

    /// Tracked read, or `None` once the var is disposed.
    pub fn try_get(&self) -> Option<T> {
        if !self.read.is_alive() {
            return None;
        }
        Some(self.read.get())
    }

    /// Store `value` if it differs from the current one. Returns whether
    /// subscribers were notified; always `false` once disposed.
    pub fn set(&self, value: T) -> bool {
        if self.read.try_with_untracked(|old| old == &value) != Some(false) {
            return false;
        }
        self.write.set(value);
        true
    }

    /// Remove the backing signal. The var must not be read afterwards except
    /// through [`try_get`](Self::try_get).
    pub fn dispose(&self) {
        dispose_signal(self.read.id());
    }

    pub fn is_disposed(&self) -> bool {
        !self.read.is_alive()
    }

    /// Number of effective writes so far.
    pub fn version(&self) -> u64 {
        self.read.version()
    }
}

impl<T: 'static> fmt::Debug for ReactiveVar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveVar")
            .field("version", &self.read.version())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// StateMap
// ---------------------------------------------------------------------------

/// Keyed reactive state with per-key invalidation.
///
/// Cloning yields another handle to the same map.
#[derive(Clone, Default)]
pub struct StateMap {
    inner: Rc<StateMapInner>,
}

#[derive(Default)]
struct StateMapInner {
    values: RefCell<HashMap<String, Value>>,
    deps: RefCell<HashMap<String, Dependency>>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn dep(&self, key: &str) -> Dependency {
        *self
            .inner
            .deps
            .borrow_mut()
            .entry(key.to_owned())
            .or_default()
    }

    /// Tracked read of one key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.dep(key).depend();
        self.inner.values.borrow().get(key).cloned()
    }

    /// Write one key; readers of that key re-run only if the value changed.
    pub fn set(&self, key: &str, value: Value) -> bool {
        {
            let mut values = self.inner.values.borrow_mut();
            if values.get(key) == Some(&value) {
                return false;
            }
            values.insert(key.to_owned(), value);
        }
        self.dep(key).changed();
        true
    }

    /// Remove one key, invalidating its readers if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.values.borrow_mut().remove(key);
        if removed.is_some() {
            self.dep(key).changed();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values.borrow().is_empty()
    }
}

impl fmt::Debug for StateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.values.borrow().iter())
            .finish()
    }
}
