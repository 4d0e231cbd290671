//! Document arena: slotmap-backed element tree with selector queries.

pub mod node;
pub mod tree;
pub mod selector;
pub mod query;

pub use node::{ElementData, ElementId};
pub use selector::{parse_selector_list, Selector};
pub use tree::Document;
