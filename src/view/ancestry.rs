//! Upward data resolution over the view tree.

use serde_json::Value;

use super::node::ViewId;
use super::tree::ViewTree;
use crate::reactive::ReactiveVar;

/// Data of the nearest plain data wrapper above `view`.
///
/// Starts at the parent of `view`, skips inclusion-argument carriers and any
/// other non-wrapper views, and returns `None` at the root. Reads the
/// wrapper's data cell, so a running effect re-runs when it changes.
pub fn resolve_ancestor_data(tree: &ViewTree, view: ViewId) -> Option<Value> {
    tree.ancestors(view)
        .into_iter()
        .filter_map(|id| tree.get(id))
        .find(|node| node.is_plain_data())
        .and_then(|node| node.data.as_ref())
        .and_then(|data| data.get())
}

/// Arguments passed where the template containing `view` was included: the
/// data of the immediate parent when that parent is an inclusion-arguments
/// carrier.
pub fn resolve_inclusion_arguments(tree: &ViewTree, view: ViewId) -> Option<Value> {
    args(tree, view).all()
}

/// Lazy handle to the inclusion arguments of `view`.
///
/// Nothing is tracked until [`get`](InclusionArgs::get) or
/// [`all`](InclusionArgs::all) is called.
pub fn args(tree: &ViewTree, view: ViewId) -> InclusionArgs {
    let cell = tree
        .parent(view)
        .and_then(|parent| tree.get(parent))
        .filter(|node| node.is_inclusion_args())
        .and_then(|node| node.data);
    InclusionArgs { cell }
}

#[derive(Debug, Clone, Copy)]
pub struct InclusionArgs {
    cell: Option<ReactiveVar<Option<Value>>>,
}

impl InclusionArgs {
    /// One argument by name. An explicit `null` is returned as
    /// `Some(Value::Null)`; only a missing key yields `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.all().and_then(|args| args.get(key).cloned())
    }

    /// The whole argument object. `None` once the carrier view is removed.
    pub fn all(&self) -> Option<Value> {
        self.cell.and_then(|cell| cell.try_get()).flatten()
    }

    /// Whether the view was included with an arguments carrier at all.
    pub fn is_present(&self) -> bool {
        self.cell.is_some()
    }
}
