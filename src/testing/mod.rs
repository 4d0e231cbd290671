//! Headless testing helpers: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive a [`Host`](crate::host::Host) by selector
//! without any real document. Use [`render_to_string`] and related helpers to
//! capture the document as plain text for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{render_children, render_subtree, render_to_string};
