//! Reactive state: signals, owned effects, and the cells built on them.
//!
//! - [`create_signal`]: create a read/write signal pair.
//! - [`create_effect`]: auto-tracking side effect (owns effects created inside it).
//! - [`Dependency`], [`ReactiveVar`], [`StateMap`]: invalidation point,
//!   equality-guarded cell, per-key map.

pub mod signal;
pub mod effect;
pub mod var;

pub use signal::{create_signal, dispose_signal, ReadSignal, SignalId, WriteSignal};
pub use effect::{
    create_effect, create_effect_with_id, dispose_effect, is_effect_active, on_cleanup, untrack,
    EffectId,
};
pub use var::{Dependency, ReactiveVar, StateMap};
