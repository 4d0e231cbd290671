//! Slot controllers: construction options, the [`Slot`] itself, and its
//! render pipeline.

pub mod controller;
pub mod options;
mod render;

pub use controller::Slot;
pub use options::{InsertOptions, InsertTarget, SlotOptions, DEFAULT_SLOT_NAME};
pub use render::ERROR_CLASS;
