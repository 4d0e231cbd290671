//! Event system: spec parsing, listeners and dispatch, event maps, and
//! region-scoped binding.

pub mod binding;
pub mod dispatch;
pub mod map;
pub mod spec;

pub use binding::{EventBindingManager, EventScope};
pub use dispatch::{bubble_path, DomEvent, ListenerFn, ListenerHandle, ListenerId, ListenerRegistry};
pub use map::{EventContext, EventHandler, EventMap, Receiver, SlotInstance};
pub use spec::{parse_event_spec, EventClause};
