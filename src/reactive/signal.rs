//! Signal<T> and create_signal() for reactive state.
//!
//! Fine-grained reactive primitives: signals store values and effects
//! auto-track reads. Single-threaded, synchronous, thread-local runtime.
//!
//! Effects created while another effect is running are *owned* by it: when the
//! owner re-runs or is disposed, its children are disposed first. This is what
//! lets a render pass tear down the computations of the previous pass.
//!
//! Ids are never reused. A disposed effect or signal is removed from the
//! runtime, so long-lived hosts do not accumulate dead entries.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

/// Identifies a signal inside the [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

/// Identifies an effect inside the [`Runtime`].
///
/// Ordered by creation, so an owner always sorts before the effects it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

// ---------------------------------------------------------------------------
// Runtime internals
// ---------------------------------------------------------------------------

struct SignalState {
    value: Box<dyn Any>,
    /// Ordered so notification runs owners before the effects they own.
    subscribers: BTreeSet<EffectId>,
    /// Bumped on every write, whether or not anyone is subscribed.
    version: u64,
}

type Cleanup = Box<dyn FnOnce()>;

struct EffectState {
    /// The effect closure. Wrapped in `Option` so we can temporarily take it
    /// out while running (avoids holding a `RefMut` on the runtime across the
    /// user callback).
    callback: Option<Box<dyn FnMut()>>,
    dependencies: BTreeSet<SignalId>,
    /// Effects created during the last run of this one.
    children: Vec<EffectId>,
    /// Registered with [`on_cleanup`] during the last run.
    cleanups: Vec<Cleanup>,
}

struct Runtime {
    signals: HashMap<SignalId, SignalState>,
    effects: HashMap<EffectId, EffectState>,
    next_signal: u64,
    next_effect: u64,
    /// The effect currently executing (for auto-tracking and ownership).
    tracking: Option<EffectId>,
    /// Effects invalidated while the notification loop is already running.
    pending_effects: Vec<EffectId>,
    /// Guard against recursive effect execution triggered by `set` inside an
    /// effect that is itself being executed by the notification loop.
    running_effects: bool,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: HashMap::new(),
            effects: HashMap::new(),
            next_signal: 0,
            next_effect: 0,
            tracking: None,
            pending_effects: Vec::new(),
            running_effects: false,
        }
    }

    fn subscribers_of(&self, id: SignalId) -> Vec<EffectId> {
        self.signals
            .get(&id)
            .map(|state| state.subscribers.iter().copied().collect())
            .unwrap_or_default()
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

// ---------------------------------------------------------------------------
// Signal creation
// ---------------------------------------------------------------------------

/// Create a reactive signal with the given initial value.
///
/// Returns a `(ReadSignal<T>, WriteSignal<T>)` pair. Reading inside an effect
/// automatically subscribes that effect to changes.
pub fn create_signal<T: 'static>(initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
    let id = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = SignalId(rt.next_signal);
        rt.next_signal += 1;
        rt.signals.insert(
            id,
            SignalState {
                value: Box::new(initial),
                subscribers: BTreeSet::new(),
                version: 0,
            },
        );
        id
    });

    (
        ReadSignal {
            id,
            _marker: PhantomData,
        },
        WriteSignal {
            id,
            _marker: PhantomData,
        },
    )
}

/// Remove a signal from the runtime, dropping its value.
///
/// Later reads through a [`ReadSignal`] panic, and writes are ignored. Use
/// [`ReadSignal::try_with_untracked`] where a handle may outlive its signal.
pub fn dispose_signal(id: SignalId) {
    let removed = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let removed = rt_ref.signals.remove(&id);
        if let Some(state) = &removed {
            for eid in &state.subscribers {
                if let Some(effect) = rt_ref.effects.get_mut(eid) {
                    effect.dependencies.remove(&id);
                }
            }
        }
        removed
    });
    // The value may own closures; drop it outside the borrow.
    drop(removed);
}

// ---------------------------------------------------------------------------
// ReadSignal
// ---------------------------------------------------------------------------

/// Read-half of a signal. `Copy`: only stores an id.
pub struct ReadSignal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

// Manual impls so we don't require T: Copy/Clone for the signal itself.
impl<T: 'static> Copy for ReadSignal<T> {}
impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("id", &self.id.0)
            .finish()
    }
}

impl<T: 'static> ReadSignal<T> {
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Read the current value, subscribing the running effect (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(|v| v.clone())
    }

    /// Read by reference without cloning. Still subscribes the running effect.
    ///
    /// # Panics
    ///
    /// If the signal was disposed.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| {
            {
                let mut guard = rt.borrow_mut();
                let rt_ref = &mut *guard;
                if let Some(eid) = rt_ref.tracking {
                    if let Some(state) = rt_ref.signals.get_mut(&self.id) {
                        state.subscribers.insert(eid);
                        if let Some(effect) = rt_ref.effects.get_mut(&eid) {
                            effect.dependencies.insert(self.id);
                        }
                    }
                }
            }
            let rt_ref = rt.borrow();
            let any_ref = &rt_ref.signals.get(&self.id).expect("signal read after dispose").value;
            f(any_ref.downcast_ref::<T>().expect("signal type mismatch"))
        })
    }

    /// Read by reference without subscribing any running effect.
    ///
    /// # Panics
    ///
    /// If the signal was disposed.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.try_with_untracked(f).expect("signal read after dispose")
    }

    /// Like [`with_untracked`](Self::with_untracked), but `None` once the
    /// signal is disposed.
    pub fn try_with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        RUNTIME.with(|rt| {
            let rt_ref = rt.borrow();
            let any_ref = &rt_ref.signals.get(&self.id)?.value;
            Some(f(any_ref.downcast_ref::<T>().expect("signal type mismatch")))
        })
    }

    /// Read without tracking. Will not subscribe any running effect.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(|v| v.clone())
    }

    /// How many times this signal has been written. Zero once disposed.
    pub fn version(&self) -> u64 {
        RUNTIME.with(|rt| rt.borrow().signals.get(&self.id).map_or(0, |s| s.version))
    }

    /// Number of effects currently subscribed to this signal.
    pub fn subscriber_count(&self) -> usize {
        RUNTIME.with(|rt| rt.borrow().signals.get(&self.id).map_or(0, |s| s.subscribers.len()))
    }

    /// Whether the signal still exists in the runtime.
    pub fn is_alive(&self) -> bool {
        RUNTIME.with(|rt| rt.borrow().signals.contains_key(&self.id))
    }
}

// ---------------------------------------------------------------------------
// WriteSignal
// ---------------------------------------------------------------------------

/// Write-half of a signal. `Copy`: only stores an id.
pub struct WriteSignal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

impl<T: 'static> Copy for WriteSignal<T> {}
impl<T: 'static> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal")
            .field("id", &self.id.0)
            .finish()
    }
}

impl<T: 'static> WriteSignal<T> {
    /// Overwrite the signal value and notify subscribers. Ignored once the
    /// signal is disposed.
    pub fn set(&self, value: T) {
        let Some((subs, old)) = RUNTIME.with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let state = rt_ref.signals.get_mut(&self.id)?;
            let old = std::mem::replace(&mut state.value, Box::new(value));
            state.version += 1;
            Some((rt_ref.subscribers_of(self.id), old))
        }) else {
            return;
        };
        // The previous value may own closures; drop it outside the borrow.
        drop(old);
        notify_subscribers(subs);
    }

    /// Mutate the value in-place and notify subscribers. Ignored once the
    /// signal is disposed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let subs = RUNTIME.with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let state = rt_ref.signals.get_mut(&self.id)?;
            let val = state
                .value
                .downcast_mut::<T>()
                .expect("signal type mismatch");
            f(val);
            state.version += 1;
            Some(rt_ref.subscribers_of(self.id))
        });
        if let Some(subs) = subs {
            notify_subscribers(subs);
        }
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Create a side-effect that auto-tracks signal reads.
///
/// The closure runs immediately once (establishing initial subscriptions),
/// then re-runs whenever any tracked signal changes.
pub fn create_effect(f: impl FnMut() + 'static) {
    let eid = register_effect(Box::new(f));
    run_effect(eid);
}

/// Create an effect and return its [`EffectId`] so it can later be disposed.
pub fn create_effect_with_id(f: impl FnMut() + 'static) -> EffectId {
    let eid = register_effect(Box::new(f));
    run_effect(eid);
    eid
}

/// Register a callback to run before the current effect re-runs, or when it
/// is disposed. Outside of an effect the callback is dropped unrun.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    let rejected = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let tracking = rt_ref.tracking;
        match tracking.and_then(|eid| rt_ref.effects.get_mut(&eid)) {
            Some(effect) => {
                effect.cleanups.push(Box::new(f));
                None
            }
            None => Some(f),
        }
    });
    drop(rejected);
}

/// Run `f` without subscribing the current effect to anything it reads.
///
/// Effects created inside `f` are not owned by the current effect.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let prev = RUNTIME.with(|rt| rt.borrow_mut().tracking.take());
    let out = f();
    RUNTIME.with(|rt| rt.borrow_mut().tracking = prev);
    out
}

// ---------------------------------------------------------------------------
// Dispose
// ---------------------------------------------------------------------------

/// Remove an effect (and every effect it owns) so it no longer re-runs.
///
/// Pending cleanups run once. Disposing twice is a no-op.
pub fn dispose_effect(eid: EffectId) {
    let mut cleanups: Vec<Cleanup> = Vec::new();
    let mut dropped: Vec<Box<dyn FnMut()>> = Vec::new();

    RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let mut stack = vec![eid];
        while let Some(id) = stack.pop() {
            let Some(mut state) = rt_ref.effects.remove(&id) else {
                continue;
            };
            stack.append(&mut state.children);
            cleanups.append(&mut state.cleanups);
            // `None` while the effect is running; run_effect drops it then.
            dropped.extend(state.callback.take());
            for sid in &state.dependencies {
                if let Some(signal) = rt_ref.signals.get_mut(sid) {
                    signal.subscribers.remove(&id);
                }
            }
        }
    });

    untrack(|| {
        for cleanup in cleanups {
            cleanup();
        }
    });
    drop(dropped);
}

/// Whether an effect is still active (not disposed).
pub fn is_effect_active(eid: EffectId) -> bool {
    RUNTIME.with(|rt| rt.borrow().effects.contains_key(&eid))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Allocate an effect, owned by the running effect if there is one.
fn register_effect(callback: Box<dyn FnMut()>) -> EffectId {
    RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let eid = EffectId(rt_ref.next_effect);
        rt_ref.next_effect += 1;
        rt_ref.effects.insert(
            eid,
            EffectState {
                callback: Some(callback),
                dependencies: BTreeSet::new(),
                children: Vec::new(),
                cleanups: Vec::new(),
            },
        );
        if let Some(owner) = rt_ref.tracking {
            if let Some(owner) = rt_ref.effects.get_mut(&owner) {
                owner.children.push(eid);
            }
        }
        eid
    })
}

/// Run a single effect: run cleanups, dispose owned effects, clear old deps,
/// set tracking, execute callback.
fn run_effect(eid: EffectId) {
    let prepared = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let state = rt_ref.effects.get_mut(&eid)?;
        // Already running further up the stack.
        let cb = state.callback.take()?;
        let children = std::mem::take(&mut state.children);
        let cleanups = std::mem::take(&mut state.cleanups);
        let old_deps = std::mem::take(&mut state.dependencies);
        for sid in old_deps {
            if let Some(signal) = rt_ref.signals.get_mut(&sid) {
                signal.subscribers.remove(&eid);
            }
        }
        Some((cb, children, cleanups))
    });

    let Some((mut cb, children, cleanups)) = prepared else {
        return;
    };

    untrack(|| {
        for cleanup in cleanups {
            cleanup();
        }
        for child in children {
            dispose_effect(child);
        }
    });

    let prev_tracking = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let prev = rt_ref.tracking.take();
        rt_ref.tracking = Some(eid);
        prev
    });

    // Run the user callback; signal reads will subscribe us.
    cb();

    let leftover = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        rt_ref.tracking = prev_tracking;
        // Put callback back only if the effect survived its own run.
        match rt_ref.effects.get_mut(&eid) {
            Some(state) => {
                state.callback = Some(cb);
                None
            }
            None => Some(cb),
        }
    });
    drop(leftover);
}

/// Notify a list of subscriber effects that a signal changed.
fn notify_subscribers(subs: Vec<EffectId>) {
    if subs.is_empty() {
        return;
    }

    // Guard against re-entrant notification (effect -> set -> effect -> ...).
    let already_running = RUNTIME.with(|rt| rt.borrow().running_effects);

    if already_running {
        RUNTIME.with(|rt| {
            rt.borrow_mut().pending_effects.extend(subs);
        });
        return;
    }

    RUNTIME.with(|rt| {
        rt.borrow_mut().running_effects = true;
    });

    let mut queue: Vec<EffectId> = subs;
    while !queue.is_empty() {
        let current_batch: BTreeSet<EffectId> = std::mem::take(&mut queue).into_iter().collect();
        for eid in current_batch {
            if is_effect_active(eid) {
                run_effect(eid);
            }
        }
        RUNTIME.with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            queue.append(&mut rt_ref.pending_effects);
        });
    }

    RUNTIME.with(|rt| {
        rt.borrow_mut().running_effects = false;
    });
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Reset the thread-local runtime between tests.
#[cfg(test)]
pub(crate) fn reset_runtime() {
    let old = RUNTIME.with(|rt| std::mem::replace(&mut *rt.borrow_mut(), Runtime::new()));
    drop(old);
}

/// Live `(signals, effects)` in this thread's runtime.
#[cfg(test)]
pub(crate) fn runtime_size() -> (usize, usize) {
    RUNTIME.with(|rt| {
        let rt_ref = rt.borrow();
        (rt_ref.signals.len(), rt_ref.effects.len())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
