//! View tree: views, rendered regions, and ancestor data resolution.

pub mod node;
pub mod tree;
pub mod region;
pub mod ancestry;

pub use ancestry::{args, resolve_ancestor_data, resolve_inclusion_arguments, InclusionArgs};
pub use node::{ViewId, ViewKind, ViewNode};
pub use region::Region;
pub use tree::ViewTree;
