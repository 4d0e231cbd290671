//! # dynslot
//!
//! Reactive dynamic template slots: a [`Slot`] renders a template chosen at
//! runtime, with a data context that can also change at runtime, and
//! re-renders itself whenever either changes.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: signals, effects with ownership, dependencies and reactive vars
//! - **[`dom`]**: slotmap-backed element arena with selector queries
//! - **[`view`]**: view tree, rendered regions, ancestor data resolution
//! - **[`template`]**: template registry and renderable/data resolution
//! - **[`slot`]**: the slot controller and its render pipeline
//! - **[`event`]**: delegated listeners and slot-scoped event maps
//! - **[`lifecycle`]**: `created` / `ready` / `rendered` / `destroyed` hooks
//! - **[`lookup`]**: lookup hosts publishing state to descendant views
//! - **[`host`]**: the host renderer tying it all together
//! - **[`testing`]**: headless pilot and snapshot helpers
//!
//! ## Example
//!
//! ```
//! use dynslot::{ElementData, Host, InsertOptions, Slot, SlotOptions, Template};
//! use serde_json::json;
//!
//! let host = Host::new();
//! host.register_template(Template::new("Greeting", |cx| {
//!     let name = cx.text("name");
//!     cx.element(ElementData::new("p").with_text(format!("Hello, {name}")));
//! }));
//!
//! let slot = Slot::new(&host, SlotOptions::new().template("Greeting").data(json!({"name": "Ann"})));
//! slot.insert(InsertOptions::new()).unwrap();
//! slot.set_data(json!({"name": "Bob"}));
//!
//! let doc = host.document();
//! let p = doc.children(doc.body())[0];
//! assert_eq!(doc.get(p).unwrap().text.as_deref(), Some("Hello, Bob"));
//! ```

// Foundation
pub mod error;
pub mod reactive;

// Document and views
pub mod dom;
pub mod view;

// Templates and slots
pub mod lifecycle;
pub mod lookup;
pub mod slot;
pub mod template;

// Events
pub mod event;

// Host
pub mod host;

// Test support
pub mod testing;

pub use dom::{Document, ElementData, ElementId};
pub use error::SlotError;
pub use event::{DomEvent, EventContext, EventMap, Receiver, SlotInstance};
pub use host::{Host, HostConfig, DEFAULT_ERROR_TEMPLATE};
pub use lifecycle::{HookError, Phase};
pub use lookup::LookupHost;
pub use reactive::{Dependency, ReactiveVar, StateMap};
pub use slot::{InsertOptions, InsertTarget, Slot, SlotOptions, DEFAULT_SLOT_NAME, ERROR_CLASS};
pub use template::{RenderContext, Renderable, ResolvedRenderable, Template};
pub use view::{ViewId, ViewKind, ViewNode};

// Proc macros (feature-gated)
#[cfg(feature = "macros")]
pub use dynslot_macros::events;
