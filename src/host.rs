//! The host renderer: owns the document, the view tree and every registry a
//! slot talks to.
//!
//! [`Host`] is a cheap handle (`Rc` inside). Slots keep a clone; nothing in
//! the host points back at a slot.
//!
//! Borrows of the document and view tree are short and never held across
//! user callbacks, except that template render functions run while the
//! document is mutably borrowed: a render function must not call back into
//! the host.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{json, Value};
use tracing::debug;

use crate::dom::{Document, ElementData, ElementId};
use crate::error::SlotError;
use crate::event::{DomEvent, ListenerRegistry};
use crate::lookup::{LookupHost, LookupHostRegistry};
use crate::template::{Template, TemplateRegistry};
use crate::view::ancestry;
use crate::view::{InclusionArgs, Region, ViewId, ViewKind, ViewNode, ViewTree};

/// Template name the error diagnostic renders with, when registered.
pub const DEFAULT_ERROR_TEMPLATE: &str = "__DynamicTemplateError__";

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

/// Host-wide rendering options.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Registry name of the template used to render "template not found"
    /// diagnostics. It receives `{"msg": <message>}` as its data. When no
    /// such template is registered a plain `div.dynslot-error` is rendered.
    pub error_template_name: String,
    /// Retry missing template names in camelCase before giving up.
    pub normalize_names: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            error_template_name: DEFAULT_ERROR_TEMPLATE.to_owned(),
            normalize_names: true,
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error template name (builder).
    pub fn with_error_template(mut self, name: impl Into<String>) -> Self {
        self.error_template_name = name.into();
        self
    }

    /// Enable or disable camelCase name fallback (builder).
    pub fn with_normalize_names(mut self, normalize: bool) -> Self {
        self.normalize_names = normalize;
        self
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Host {
    inner: Rc<HostInner>,
}

struct HostInner {
    config: HostConfig,
    document: RefCell<Document>,
    views: RefCell<ViewTree>,
    templates: RefCell<TemplateRegistry>,
    lookup: LookupHostRegistry,
    listeners: ListenerRegistry,
    /// Regions waiting for (or past) their first attach notification.
    regions: RefCell<Vec<Weak<Region>>>,
}

impl Host {
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    pub fn with_config(config: HostConfig) -> Self {
        Self {
            inner: Rc::new(HostInner {
                config,
                document: RefCell::new(Document::new()),
                views: RefCell::new(ViewTree::new()),
                templates: RefCell::new(TemplateRegistry::new()),
                lookup: LookupHostRegistry::new(),
                listeners: ListenerRegistry::new(),
                regions: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    // -- templates ----------------------------------------------------------

    /// Register a template under its own name, returning the one it replaced.
    pub fn register_template(&self, template: Template) -> Option<Template> {
        self.inner.templates.borrow_mut().register(template)
    }

    pub fn templates(&self) -> Ref<'_, TemplateRegistry> {
        self.inner.templates.borrow()
    }

    // -- document -----------------------------------------------------------

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    pub(crate) fn document_cell(&self) -> &RefCell<Document> {
        &self.inner.document
    }

    pub fn body(&self) -> ElementId {
        self.document().body()
    }

    /// Create an element and append it under `parent`, then notify any
    /// region that became connected.
    pub fn append_element(&self, parent: ElementId, data: ElementData) -> ElementId {
        let el = self.document_mut().create_element(data);
        self.attach_element(parent, el);
        el
    }

    /// Move `child` under `parent`, then notify any region that became
    /// connected. Returns `false` if the move was refused.
    pub fn attach_element(&self, parent: ElementId, child: ElementId) -> bool {
        let moved = self.document_mut().append_child(parent, child);
        if moved {
            self.notify_attached();
        }
        moved
    }

    /// Detach `el` (with its subtree) from the document without deleting it.
    pub fn detach_element(&self, el: ElementId) {
        self.document_mut().detach(el);
    }

    pub(crate) fn track_region(&self, region: &Rc<Region>) {
        self.inner.regions.borrow_mut().push(Rc::downgrade(region));
    }

    /// Fire the attach notification of every tracked region whose parent
    /// element is now connected. Returns how many attached.
    pub fn notify_attached(&self) -> usize {
        let regions: Vec<Rc<Region>> = {
            let mut regions = self.inner.regions.borrow_mut();
            regions.retain(|region| region.strong_count() > 0);
            regions.iter().filter_map(Weak::upgrade).collect()
        };
        let ready: Vec<(Rc<Region>, ElementId)> = {
            let doc = self.document();
            regions
                .into_iter()
                .filter(|region| !region.is_attached())
                .filter_map(|region| {
                    let parent = region.parent_element()?;
                    doc.is_connected(parent).then_some((region, parent))
                })
                .collect()
        };
        for (region, parent) in &ready {
            region.attach(*parent);
        }
        if !ready.is_empty() {
            debug!(count = ready.len(), "regions attached");
        }
        ready.len()
    }

    // -- views --------------------------------------------------------------

    pub fn views(&self) -> Ref<'_, ViewTree> {
        self.inner.views.borrow()
    }

    pub(crate) fn views_mut(&self) -> RefMut<'_, ViewTree> {
        self.inner.views.borrow_mut()
    }

    /// Add a view under `parent`, or as a root.
    pub fn add_view(&self, parent: Option<ViewId>, node: ViewNode) -> ViewId {
        let mut views = self.views_mut();
        match parent {
            Some(parent) => views.insert_child(parent, node),
            None => views.insert(node),
        }
    }

    /// Add a `With` data wrapper. `inclusion_args` marks it as an
    /// inclusion-arguments carrier.
    pub fn add_data_view(&self, parent: Option<ViewId>, data: Option<Value>, inclusion_args: bool) -> ViewId {
        self.add_view(parent, ViewNode::with_data(data, inclusion_args))
    }

    /// Replace a wrapper's data. Returns whether readers were notified.
    pub fn set_view_data(&self, view: ViewId, data: Option<Value>) -> bool {
        // Copy the cell out so no borrow is held while readers re-run.
        let cell = self.views().get(view).and_then(|node| node.data);
        cell.is_some_and(|cell| cell.set(data))
    }

    /// Remove `view` and its descendants, with their lookup-host entries.
    pub fn remove_view(&self, view: ViewId) -> Vec<ViewId> {
        let removed = self.views_mut().remove(view);
        for id in &removed {
            self.inner.lookup.remove(*id);
        }
        removed
    }

    pub(crate) fn remove_child_views(&self, view: ViewId) {
        let removed = self.views_mut().remove_children(view);
        for id in removed {
            self.inner.lookup.remove(id);
        }
    }

    pub fn resolve_ancestor_data(&self, view: ViewId) -> Option<Value> {
        ancestry::resolve_ancestor_data(&self.views(), view)
    }

    pub fn resolve_inclusion_arguments(&self, view: ViewId) -> Option<Value> {
        ancestry::resolve_inclusion_arguments(&self.views(), view)
    }

    pub fn args(&self, view: ViewId) -> InclusionArgs {
        ancestry::args(&self.views(), view)
    }

    /// Data context for an element: the data of the nearest plain data
    /// wrapper at or above the view that rendered it, `{}` when there is
    /// none.
    pub fn data_for_element(&self, el: ElementId) -> Value {
        let rendered_by = {
            let doc = self.document();
            std::iter::once(el)
                .chain(doc.ancestors(el))
                .find_map(|id| doc.get(id).and_then(|data| data.view))
        };
        let Some(start) = rendered_by else {
            return json!({});
        };
        let views = self.views();
        std::iter::once(start)
            .chain(views.ancestors(start))
            .filter_map(|id| views.get(id))
            .find(|node| node.is_plain_data())
            .and_then(|node| node.data)
            .and_then(|cell| cell.get_untracked())
            .filter(|data| !data.is_null())
            .unwrap_or_else(|| json!({}))
    }

    /// The region currently attached to `view`, if any.
    pub fn region_of(&self, view: ViewId) -> Option<Rc<Region>> {
        self.views().get(view).and_then(|node| node.region.clone())
    }

    pub fn view_kind(&self, view: ViewId) -> Option<ViewKind> {
        self.views().get(view).map(|node| node.kind)
    }

    // -- lookup hosts -------------------------------------------------------

    pub fn register_lookup_host(&self, view: ViewId, host: &Rc<dyn LookupHost>) -> Result<(), SlotError> {
        self.inner
            .lookup
            .register(&self.views(), view, Rc::downgrade(host))
    }

    pub fn is_lookup_host(&self, view: ViewId) -> bool {
        self.inner.lookup.is_host(view)
    }

    pub fn get_lookup_host(&self, view: ViewId) -> Option<Rc<dyn LookupHost>> {
        self.inner.lookup.get_host(view)
    }

    pub(crate) fn remove_lookup_host(&self, view: ViewId) {
        self.inner.lookup.remove(view);
    }

    /// Read `key` from the nearest lookup host at or above `view`.
    /// Reactive through the host's own state.
    pub fn lookup(&self, view: ViewId, key: &str) -> Option<Value> {
        self.inner.lookup.resolve_key(&self.views(), view, key)
    }

    // -- events -------------------------------------------------------------

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.inner.listeners
    }

    /// Bubble `event` through the document. Returns handler invocations.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        self.inner.listeners.dispatch(&self.inner.document, event)
    }

    /// Dispatch a fresh event of `kind` at `target`.
    pub fn trigger(&self, kind: &str, target: ElementId) -> usize {
        self.dispatch(&DomEvent::new(kind, target))
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.inner.config)
            .field("elements", &self.document().len())
            .field("views", &self.views().len())
            .field("templates", &self.templates().len())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal::reset_runtime;
    use crate::reactive::StateMap;
    use std::cell::Cell;

    fn setup() -> Host {
        reset_runtime();
        Host::new()
    }

    #[test]
    fn config_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.error_template_name, "__DynamicTemplateError__");
        assert!(config.normalize_names);
        let config = config.with_error_template("Oops").with_normalize_names(false);
        assert_eq!(config.error_template_name, "Oops");
        assert!(!config.normalize_names);
    }

    #[test]
    fn data_for_element_walks_to_nearest_wrapper() {
        let host = setup();
        let outer = host.add_data_view(None, Some(json!({"n": 1})), false);
        let args = host.add_data_view(Some(outer), Some(json!({"template": "X"})), true);
        let leaf = host.add_view(Some(args), ViewNode::new("Item", ViewKind::Plain));

        let mut data = ElementData::new("li");
        data.view = Some(leaf);
        let li = host.append_element(host.body(), data);
        let span = host.append_element(li, ElementData::new("span"));
        let loose = host.append_element(host.body(), ElementData::new("p"));

        assert_eq!(host.data_for_element(span), json!({"n": 1}));
        assert_eq!(host.data_for_element(loose), json!({}));
    }

    #[test]
    fn set_view_data_notifies_only_on_change() {
        let host = setup();
        let view = host.add_data_view(None, Some(json!(1)), false);
        assert!(!host.set_view_data(view, Some(json!(1))));
        assert!(host.set_view_data(view, Some(json!(2))));
        let plain = host.add_view(None, ViewNode::new("plain", ViewKind::Plain));
        assert!(!host.set_view_data(plain, Some(json!(3))));
    }

    #[test]
    fn regions_attach_when_their_parent_connects() {
        let host = setup();
        let container = host.document_mut().create_element(ElementData::new("div"));
        let region = Rc::new(Region::new());
        region.set_parent_element(container);
        host.track_region(&region);

        let fired = Rc::new(Cell::new(0));
        let fired_c = fired.clone();
        region.on_attached(move |_| fired_c.set(fired_c.get() + 1));

        assert_eq!(host.notify_attached(), 0);
        assert!(host.attach_element(host.body(), container));
        assert!(region.is_attached());
        assert_eq!(host.notify_attached(), 0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn removing_a_view_drops_its_lookup_host() {
        let host = setup();
        let view = host.add_view(None, ViewNode::new("layout", ViewKind::Plain));
        let child = host.add_view(Some(view), ViewNode::new("page", ViewKind::Plain));
        let state = StateMap::new();
        state.set("title", json!("Home"));
        let lookup: Rc<dyn LookupHost> = Rc::new(state);
        host.register_lookup_host(view, &lookup).unwrap();
        assert_eq!(host.lookup(child, "title"), Some(json!("Home")));

        assert_eq!(host.remove_view(view).len(), 2);
        assert!(!host.is_lookup_host(view));
        assert!(host.lookup(child, "title").is_none());
    }
}
