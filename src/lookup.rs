//! Lookup hosts: objects attached to a view that publish keyed state to the
//! views below it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use slotmap::SecondaryMap;

use crate::error::SlotError;
use crate::reactive::StateMap;
use crate::view::{ViewId, ViewTree};

/// Something that answers keyed state queries, reactively.
pub trait LookupHost {
    fn state(&self, key: &str) -> Option<Value>;
}

impl LookupHost for StateMap {
    fn state(&self, key: &str) -> Option<Value> {
        self.get(key)
    }
}

/// View → host associations. At most one host per view.
///
/// Hosts are held weakly: the view does not keep its host alive.
#[derive(Default)]
pub struct LookupHostRegistry {
    hosts: RefCell<SecondaryMap<ViewId, Weak<dyn LookupHost>>>,
}

impl LookupHostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `host` with `view`, replacing any previous host.
    pub fn register(
        &self,
        tree: &ViewTree,
        view: ViewId,
        host: Weak<dyn LookupHost>,
    ) -> Result<(), SlotError> {
        if !tree.contains(view) {
            return Err(SlotError::InvalidLookupTarget);
        }
        if host.strong_count() == 0 {
            return Err(SlotError::InvalidLookupHost);
        }
        self.hosts.borrow_mut().insert(view, host);
        Ok(())
    }

    /// Whether `view` has a live host.
    pub fn is_host(&self, view: ViewId) -> bool {
        self.get_host(view).is_some()
    }

    pub fn get_host(&self, view: ViewId) -> Option<Rc<dyn LookupHost>> {
        self.hosts.borrow().get(view).and_then(Weak::upgrade)
    }

    pub fn remove(&self, view: ViewId) {
        self.hosts.borrow_mut().remove(view);
    }

    /// Walk from `view` (inclusive) upward to the first view with a live
    /// host and ask it for `key`.
    pub fn resolve_key(&self, tree: &ViewTree, view: ViewId, key: &str) -> Option<Value> {
        let host = std::iter::once(view)
            .chain(tree.ancestors(view))
            .find_map(|id| self.get_host(id))?;
        host.state(key)
    }
}

impl fmt::Debug for LookupHostRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupHostRegistry")
            .field("hosts", &self.hosts.borrow().len())
            .finish()
    }
}
