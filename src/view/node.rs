//! View node types: ViewId, ViewKind, ViewNode.

use std::rc::Rc;

use serde_json::Value;
use slotmap::new_key_type;

use super::region::Region;
use crate::reactive::ReactiveVar;

new_key_type! {
    /// Unique identifier for a view in the [`ViewTree`](super::ViewTree).
    pub struct ViewId;
}

/// What a view node is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// The view mounted by a slot controller.
    Slot,
    /// A plain data wrapper. When `inclusion_args` is set the wrapper only
    /// carries the arguments passed where a template was included, and data
    /// resolution skips it.
    With { inclusion_args: bool },
    /// Literal block content rendered inside a slot.
    Content,
    /// Any other view (template bodies, host containers).
    Plain,
}

/// A node in the view tree.
///
/// The parent link is fixed at insertion; see [`ViewTree::insert_child`](super::ViewTree::insert_child).
#[derive(Debug)]
pub struct ViewNode {
    pub name: String,
    pub kind: ViewKind,
    /// Reactive data cell; only `With` wrappers carry one.
    pub data: Option<ReactiveVar<Option<Value>>>,
    /// The document range this view currently renders into.
    pub region: Option<Rc<Region>>,
    /// Completed render passes.
    pub render_count: u64,
}

impl ViewNode {
    pub fn new(name: impl Into<String>, kind: ViewKind) -> Self {
        Self {
            name: name.into(),
            kind,
            data: None,
            region: None,
            render_count: 0,
        }
    }

    /// A `With` wrapper holding `data`.
    pub fn with_data(data: Option<Value>, inclusion_args: bool) -> Self {
        let name = if inclusion_args { "InclusionArgs" } else { "with" };
        Self {
            data: Some(ReactiveVar::new(data)),
            ..Self::new(name, ViewKind::With { inclusion_args })
        }
    }

    /// Whether data resolution stops here.
    pub fn is_plain_data(&self) -> bool {
        matches!(self.kind, ViewKind::With { inclusion_args: false })
    }

    pub fn is_inclusion_args(&self) -> bool {
        matches!(self.kind, ViewKind::With { inclusion_args: true })
    }
}
