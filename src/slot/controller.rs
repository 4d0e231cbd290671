//! The slot controller.
//!
//! A [`Slot`] owns what to render and with which data, plus its lifecycle
//! hooks, event binding and optional lookup host. The host renderer does the
//! rest: once inserted, the slot re-renders by itself whenever anything it
//! read changes.
//!
//! State machine: uncreated → created → (rendered)* → destroyed. A destroyed
//! slot can be created again.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::debug;

use super::options::{InsertOptions, InsertTarget, SlotOptions, DEFAULT_SLOT_NAME};
use super::render;
use crate::dom::ElementId;
use crate::error::SlotError;
use crate::event::{
    EventBindingManager, EventClause, EventMap, EventScope, ListenerFn, ListenerHandle, SlotInstance,
};
use crate::host::Host;
use crate::lifecycle::{HookError, HookRegistry, Phase};
use crate::lookup::LookupHost;
use crate::reactive::{untrack, Dependency, EffectId, ReactiveVar};
use crate::template::{
    DataContextResolver, Renderable, RenderableResolver, ResolvedRenderable, Source, Template,
};
use crate::view::{Region, ViewId, ViewKind, ViewNode};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

pub(crate) struct SlotInner {
    pub(crate) name: String,
    pub(crate) host: Host,
    pub(crate) renderable: RenderableResolver,
    pub(crate) data: DataContextResolver,
    pub(crate) content: Option<Template>,
    pub(crate) hooks: HookRegistry<Slot>,
    pub(crate) events: EventBindingManager,
    lookup_host: RefCell<Option<Weak<dyn LookupHost>>>,
    /// Changes on every `set_host`.
    host_changed: Dependency,
    /// Changes only when a host appears or goes away.
    host_presence: Dependency,
    pub(crate) state: RefCell<SlotState>,
    this: Weak<SlotInner>,
}

#[derive(Default)]
pub(crate) struct SlotState {
    pub(crate) view: Option<ViewId>,
    pub(crate) created: bool,
    pub(crate) destroyed: bool,
    pub(crate) inserted: bool,
    /// Root render computations, disposed on unmount.
    pub(crate) effects: Vec<EffectId>,
    pub(crate) resolved: Option<ResolvedRenderable>,
    /// Top-level elements of the last render pass.
    pub(crate) rendered: Vec<ElementId>,
    /// The view the last render pass rendered through.
    pub(crate) rendered_view: Option<ViewId>,
    /// Data wrapper publishing the slot's data context while inserted.
    pub(crate) content_view: Option<ViewId>,
    pub(crate) template_var: Option<ReactiveVar<Renderable>>,
    pub(crate) next_node: Option<ElementId>,
    /// Set while `insert` runs the first pass; its hooks fire from `insert`.
    pub(crate) mounting: bool,
}

impl SlotInner {
    /// Direct data, else the nearest ancestor data above the slot's view.
    pub(crate) fn current_data(&self) -> Option<Value> {
        let view = self.state.borrow().view;
        self.data
            .get_or_else(|| view.and_then(|view| self.host.resolve_ancestor_data(view)))
    }

    fn instance(&self) -> SlotInstance {
        let (view, destroyed) = {
            let state = self.state.borrow();
            (state.view, state.destroyed)
        };
        let data = untrack(|| self.current_data());
        let region = view
            .filter(|_| !destroyed)
            .and_then(|view| self.host.region_of(view));
        SlotInstance {
            view,
            data,
            first_node: region.as_ref().and_then(|r| r.first_node()),
            last_node: region.as_ref().and_then(|r| r.last_node()),
        }
    }

    /// A [`Slot`] handle for hook calls.
    pub(crate) fn handle(&self) -> Option<Slot> {
        self.this.upgrade().map(|inner| Slot { inner })
    }
}

impl EventScope for SlotInner {
    fn listen(&self, element: ElementId, clause: &EventClause, handler: ListenerFn) -> ListenerHandle {
        self.host
            .listeners()
            .listen_parsed(element, &clause.event, clause.selectors.clone(), handler)
    }

    fn contains(&self, region: &Region, element: ElementId) -> bool {
        region.contains_element(&self.host.document(), element)
    }

    fn instance(&self) -> SlotInstance {
        SlotInner::instance(self)
    }

    fn target_data(&self, element: ElementId) -> Value {
        self.host.data_for_element(element)
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A reactive slot whose renderable and data can change at runtime.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone)]
pub struct Slot {
    pub(crate) inner: Rc<SlotInner>,
}

impl Slot {
    pub fn new(host: &Host, options: SlotOptions) -> Self {
        let SlotOptions {
            template,
            default_template,
            data,
            content,
            name,
        } = options;
        let inner = Rc::new_cyclic(|this: &Weak<SlotInner>| {
            let scope: Weak<dyn EventScope> = this.clone();
            SlotInner {
                name: name.unwrap_or_else(|| DEFAULT_SLOT_NAME.to_owned()),
                host: host.clone(),
                renderable: RenderableResolver::new(template, default_template),
                data: DataContextResolver::new(data),
                content,
                hooks: HookRegistry::new(),
                events: EventBindingManager::new(scope),
                lookup_host: RefCell::new(None),
                host_changed: Dependency::new(),
                host_presence: Dependency::new(),
                state: RefCell::new(SlotState::default()),
                this: this.clone(),
            }
        });
        Self { inner }
    }

    /// A slot reading `template` and `data` from the inclusion arguments of
    /// `view`, created under `view`.
    ///
    /// Arguments are read lazily, so the slot follows later changes to them.
    /// A string `template` argument is a template name; anything else
    /// renders `content`.
    pub fn from_inclusion(host: &Host, view: ViewId, content: Option<Template>) -> Result<Self, SlotError> {
        let args = host.args(view);
        let mut options = SlotOptions::new()
            .template_fn(move || match args.get("template") {
                Some(Value::String(name)) => Renderable::Name(name),
                _ => Renderable::None,
            })
            .data_fn(move || args.get("data"));
        if let Some(content) = content {
            options = options.content(content);
        }
        let slot = Self::new(host, options);
        slot.create(Some(view))?;
        Ok(slot)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    // -- renderable ---------------------------------------------------------

    /// The renderable to show, tracked.
    pub fn template(&self) -> Renderable {
        self.inner.renderable.get()
    }

    /// Returns `false` when `template` equals the current direct value.
    pub fn set_template(&self, template: impl Into<Renderable>) -> bool {
        self.inner
            .renderable
            .set(Some(Source::Value(template.into())))
    }

    pub fn set_template_fn(&self, f: impl Fn() -> Renderable + 'static) -> bool {
        self.inner.renderable.set(Some(Source::accessor(f)))
    }

    /// Untracked.
    pub fn default_template(&self) -> Option<Source<Renderable>> {
        self.inner.renderable.get_default()
    }

    /// Never invalidates anything.
    pub fn set_default_template(&self, template: impl Into<Renderable>) {
        self.inner
            .renderable
            .set_default(Some(Source::Value(template.into())));
    }

    // -- data ---------------------------------------------------------------

    /// The directly assigned data, tracked. Ancestor data is not consulted;
    /// see [`current_data`](Self::current_data).
    pub fn data(&self) -> Option<Value> {
        self.inner.data.get()
    }

    pub fn set_data(&self, data: Value) -> bool {
        self.inner.data.set(Some(Source::Value(Some(data))))
    }

    pub fn set_data_fn(&self, f: impl Fn() -> Option<Value> + 'static) -> bool {
        self.inner.data.set(Some(Source::accessor(f)))
    }

    /// The data context the slot renders with: direct data, else the nearest
    /// ancestor data wrapper's. Tracked.
    pub fn current_data(&self) -> Option<Value> {
        self.inner.current_data()
    }

    /// Unset the renderable and the data. Only readers of the renderable are
    /// invalidated.
    pub fn clear(&self) {
        self.inner.data.unset();
        self.inner.renderable.clear();
    }

    // -- lifecycle ----------------------------------------------------------

    pub fn is_created(&self) -> bool {
        self.inner.state.borrow().created
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }

    pub fn is_inserted(&self) -> bool {
        self.inner.state.borrow().inserted
    }

    /// The slot's view, while created.
    pub fn view(&self) -> Option<ViewId> {
        self.inner.state.borrow().view
    }

    /// The data wrapper the slot renders under, while inserted.
    ///
    /// It carries the slot's current data context, so a slot inserted with
    /// this as its [`parent_view`](InsertOptions::parent_view) and no data of
    /// its own renders with the outer slot's data. The wrapper survives
    /// re-renders; it goes away when the slot is removed or destroyed.
    pub fn content_view(&self) -> Option<ViewId> {
        self.inner.state.borrow().content_view
    }

    /// Add the slot's view under `parent_view` (or as a root) and run the
    /// `Created` hooks.
    pub fn create(&self, parent_view: Option<ViewId>) -> Result<ViewId, SlotError> {
        if self.is_created() {
            return Err(SlotError::AlreadyCreated {
                name: self.inner.name.clone(),
            });
        }
        let host = &self.inner.host;
        let view = host.add_view(parent_view, ViewNode::new(self.inner.name.clone(), ViewKind::Slot));
        {
            let mut state = self.inner.state.borrow_mut();
            state.view = Some(view);
            state.created = true;
            state.destroyed = false;
        }

        if let Some(lookup) = untrack(|| self.get_host()) {
            if let Err(err) = host.register_lookup_host(view, &lookup) {
                self.discard_view();
                return Err(err);
            }
        }
        debug!(slot = %self.inner.name, "slot created");

        if let Err(err) = self.inner.hooks.run(&Phase::Created, self) {
            self.discard_view();
            return Err(err);
        }
        Ok(view)
    }

    /// Render the slot into the document.
    ///
    /// Creates the view first if needed. A second call on an inserted slot
    /// does nothing. On error nothing stays mounted, and a view created by
    /// this call is removed again.
    pub fn insert(&self, options: InsertOptions) -> Result<(), SlotError> {
        if self.is_inserted() {
            return Ok(());
        }
        let parent = self.resolve_target(&options.target)?;
        let created_here = !self.is_created();
        if created_here {
            self.create(options.parent_view)?;
        }

        match render::mount(self, parent, options.next_node) {
            Ok(()) => {
                self.inner.state.borrow_mut().inserted = true;
                debug!(slot = %self.inner.name, "slot inserted");
                Ok(())
            }
            Err(err) => {
                render::unmount(&self.inner);
                if created_here {
                    self.discard_view();
                }
                Err(err)
            }
        }
    }

    /// Tear everything down and run the `Destroyed` hooks. No-op unless
    /// created.
    ///
    /// Teardown always completes; a failing hook's error is returned after.
    pub fn destroy(&self) -> Result<(), SlotError> {
        if !self.is_created() {
            return Ok(());
        }
        render::unmount(&self.inner);
        let view = self.inner.state.borrow_mut().view.take();
        if let Some(view) = view {
            self.inner.host.remove_view(view);
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.created = false;
            state.inserted = false;
            state.destroyed = true;
            state.resolved = None;
        }
        debug!(slot = %self.inner.name, "slot destroyed");
        self.inner.hooks.run(&Phase::Destroyed, self)
    }

    /// Remove a view made by `create` after a later step failed.
    fn discard_view(&self) {
        let view = {
            let mut state = self.inner.state.borrow_mut();
            state.created = false;
            state.view.take()
        };
        if let Some(view) = view {
            self.inner.host.remove_view(view);
        }
    }

    fn resolve_target(&self, target: &InsertTarget) -> Result<ElementId, SlotError> {
        let host = &self.inner.host;
        match target {
            InsertTarget::Body => Ok(host.body()),
            InsertTarget::Element(el) => {
                if host.document().contains(*el) {
                    Ok(*el)
                } else {
                    Err(SlotError::NoTargetElement {
                        selector: format!("{el:?}"),
                    })
                }
            }
            InsertTarget::Selector(selector) => host
                .document()
                .query_selector(selector)?
                .ok_or_else(|| SlotError::NoTargetElement {
                    selector: selector.clone(),
                }),
        }
    }

    /// Register a hook for `phase`. Hooks only fire on later transitions.
    pub fn on(&self, phase: Phase, hook: impl Fn(&Slot) -> Result<(), HookError> + 'static) -> &Self {
        self.inner.hooks.on(phase, hook);
        self
    }

    // -- events -------------------------------------------------------------

    /// Bind `map`, replacing any previous map.
    ///
    /// With a rendered region the handlers attach now; before the slot is
    /// created they attach on the first render. A created slot that has not
    /// rendered yet returns [`SlotError::NoRegion`], but keeps the map for
    /// its first render.
    pub fn events(&self, map: EventMap, this_arg: Option<Rc<dyn Any>>) -> Result<(), SlotError> {
        let view = self.view();
        let region = self.rendered_region();
        self.inner.events.bind(&map, this_arg, region.as_ref())?;
        if view.is_some() && region.is_none() {
            return Err(SlotError::NoRegion {
                name: self.inner.name.clone(),
            });
        }
        Ok(())
    }

    /// Live low-level listeners held by this slot.
    pub fn active_listener_count(&self) -> usize {
        self.inner.events.active_handles()
    }

    // -- lookup host --------------------------------------------------------

    /// Publish `lookup` to the views below this slot, or clear it with
    /// `None`. The slot holds the host weakly.
    ///
    /// On a live view the host is registered right away; renders that
    /// already happened are not revisited.
    pub fn set_host(&self, lookup: Option<&Rc<dyn LookupHost>>) -> Result<(), SlotError> {
        if let Some(view) = self.view() {
            match lookup {
                Some(lookup) => self.inner.host.register_lookup_host(view, lookup)?,
                None => self.inner.host.remove_lookup_host(view),
            }
        }
        let had_host = self
            .inner
            .lookup_host
            .replace(lookup.map(Rc::downgrade))
            .is_some_and(|old| old.strong_count() > 0);
        if had_host != lookup.is_some() {
            self.inner.host_presence.changed();
        }
        self.inner.host_changed.changed();
        Ok(())
    }

    /// The current lookup host, tracked.
    pub fn get_host(&self) -> Option<Rc<dyn LookupHost>> {
        self.inner.host_changed.depend();
        self.inner.lookup_host.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Whether a lookup host is set. Only invalidates when that flips.
    pub fn has_host(&self) -> bool {
        self.inner.host_presence.depend();
        self.inner
            .lookup_host
            .borrow()
            .as_ref()
            .is_some_and(|host| host.strong_count() > 0)
    }

    // -- introspection ------------------------------------------------------

    /// Data and node bounds, as event handlers see them.
    pub fn instance(&self) -> SlotInstance {
        self.inner.instance()
    }

    /// What the last render pass resolved to.
    pub fn resolved(&self) -> Option<ResolvedRenderable> {
        self.inner.state.borrow().resolved.clone()
    }

    /// Completed render passes since the slot was inserted.
    pub fn render_count(&self) -> u64 {
        self.view()
            .and_then(|view| self.inner.host.views().get(view).map(|node| node.render_count))
            .unwrap_or(0)
    }

    /// The region of a slot that has rendered at least once.
    pub fn rendered_region(&self) -> Option<Rc<Region>> {
        let view = self.view()?;
        let views = self.inner.host.views();
        let node = views.get(view)?;
        node.region.clone().filter(|_| node.render_count > 0)
    }

    /// Top-level elements of the last render pass.
    pub fn rendered_elements(&self) -> Vec<ElementId> {
        self.inner.state.borrow().rendered.clone()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Slot")
            .field("name", &self.inner.name)
            .field("view", &state.view)
            .field("created", &state.created)
            .field("inserted", &state.inserted)
            .field("destroyed", &state.destroyed)
            .field("resolved", &state.resolved)
            .field("events", &self.inner.events)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementData;
    use crate::slot::ERROR_CLASS;
    use crate::reactive::signal::{create_effect, reset_runtime, runtime_size};
    use crate::reactive::StateMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;

    fn setup() -> Host {
        reset_runtime();
        let host = Host::new();
        host.register_template(Template::new("Card", |cx| {
            let name = cx.text("name");
            let card = cx.element(ElementData::new("div").with_class("card").with_text(name));
            cx.child(card, ElementData::new("button").with_class("delete"));
        }));
        host.register_template(Template::new("userCard", |cx| {
            let name = cx.text("name");
            cx.element(ElementData::new("section").with_text(name));
        }));
        host
    }

    fn body_texts(host: &Host) -> Vec<String> {
        let doc = host.document();
        doc.children(doc.body())
            .iter()
            .filter_map(|&el| doc.get(el))
            .map(|data| data.text.clone().unwrap_or_default())
            .collect()
    }

    fn body_tags(host: &Host) -> Vec<String> {
        let doc = host.document();
        doc.children(doc.body())
            .iter()
            .filter_map(|&el| doc.get(el))
            .map(|data| data.tag.clone())
            .collect()
    }

    // ── create / destroy ─────────────────────────────────────────────

    #[test]
    fn create_twice_fails_and_destroy_allows_recreate() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().name("sidebar"));
        let view = slot.create(None).unwrap();
        assert!(matches!(
            slot.create(None),
            Err(SlotError::AlreadyCreated { name }) if name == "sidebar"
        ));

        slot.destroy().unwrap();
        assert!(slot.is_destroyed());
        assert!(!host.views().contains(view));

        slot.create(None).unwrap();
        assert!(slot.is_created());
        assert!(!slot.is_destroyed());
    }

    #[test]
    fn destroy_before_create_is_a_noop() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new());
        slot.destroy().unwrap();
        assert!(!slot.is_destroyed());
        assert_eq!(slot.name(), DEFAULT_SLOT_NAME);
    }

    // ── rendering ────────────────────────────────────────────────────

    #[test]
    fn insert_renders_template_with_data() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card").data(json!({"name": "Ann"})));
        slot.insert(InsertOptions::new()).unwrap();

        assert!(slot.is_inserted());
        assert_eq!(body_texts(&host), vec!["Ann"]);
        assert_eq!(slot.render_count(), 1);
        assert_eq!(slot.rendered_elements().len(), 1);
        assert!(matches!(slot.resolved(), Some(ResolvedRenderable::Template(t)) if t.name() == "Card"));

        // Second insert is ignored.
        slot.insert(InsertOptions::new()).unwrap();
        assert_eq!(body_texts(&host), vec!["Ann"]);
    }

    #[test]
    fn data_change_rerenders_without_reading_the_template_again() {
        let host = setup();
        let reads = Rc::new(Cell::new(0));
        let reads_c = reads.clone();
        let slot = Slot::new(
            &host,
            SlotOptions::new()
                .template_fn(move || {
                    reads_c.set(reads_c.get() + 1);
                    Renderable::Name("Card".into())
                })
                .data(json!({"name": "Ann"})),
        );
        slot.insert(InsertOptions::new()).unwrap();
        assert_eq!(reads.get(), 1);

        assert!(slot.set_data(json!({"name": "Bob"})));
        assert_eq!(body_texts(&host), vec!["Bob"]);
        assert_eq!(slot.render_count(), 2);
        assert_eq!(reads.get(), 1);

        // Equal data is not a change.
        assert!(!slot.set_data(json!({"name": "Bob"})));
        assert_eq!(slot.render_count(), 2);
    }

    #[test]
    fn setting_the_same_template_does_not_rerender() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card").data(json!({"name": "Ann"})));
        slot.insert(InsertOptions::new()).unwrap();
        assert!(!slot.set_template("Card"));
        assert_eq!(slot.render_count(), 1);

        assert!(slot.set_template("userCard"));
        assert_eq!(body_tags(&host), vec!["section"]);
        assert_eq!(body_texts(&host), vec!["Ann"]);
    }

    #[test]
    fn missing_template_renders_inline_error() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("no-such"));
        slot.insert(InsertOptions::new()).unwrap();

        let doc = host.document();
        let el = doc.children(doc.body())[0];
        let data = doc.get(el).unwrap();
        assert!(data.has_class(ERROR_CLASS));
        let text = data.text.clone().unwrap();
        assert!(text.contains("\"no-such\""), "{text}");
        assert!(text.contains("\"noSuch\""), "{text}");
        drop(doc);
        assert!(slot.resolved().unwrap().is_error());
    }

    #[test]
    fn missing_template_uses_registered_error_template() {
        let host = setup();
        host.register_template(Template::new(crate::host::DEFAULT_ERROR_TEMPLATE, |cx| {
            let msg = cx.text("msg");
            cx.element(ElementData::new("p").with_class("oops").with_text(msg));
        }));
        let slot = Slot::new(&host, SlotOptions::new().template("Gone"));
        slot.insert(InsertOptions::new()).unwrap();

        assert_eq!(body_tags(&host), vec!["p"]);
        assert!(body_texts(&host)[0].starts_with("Couldn't find a template named \"Gone\""));
    }

    #[test]
    fn camel_case_fallback_finds_template() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("user_card").data(json!({"name": "Cy"})));
        slot.insert(InsertOptions::new()).unwrap();
        assert_eq!(body_tags(&host), vec!["section"]);
    }

    #[test]
    fn clear_falls_back_to_default_then_content() {
        let host = setup();
        let slot = Slot::new(
            &host,
            SlotOptions::new()
                .template("Card")
                .default_template("userCard")
                .data(json!({"name": "Ann"})),
        );
        slot.insert(InsertOptions::new()).unwrap();
        assert_eq!(body_tags(&host), vec!["div"]);

        slot.clear();
        assert_eq!(body_tags(&host), vec!["section"]);
        // Data was unset along with the template.
        assert_eq!(body_texts(&host), vec![""]);
        assert!(slot.data().is_none());

        let content = Template::new("fallback", |cx| {
            cx.element(ElementData::new("em").with_text("empty"));
        });
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card").content(content));
        slot.insert(InsertOptions::new()).unwrap();
        slot.clear();
        assert_eq!(body_tags(&host), vec!["em"]);
        assert!(matches!(slot.resolved(), Some(ResolvedRenderable::Block(_))));
    }

    #[test]
    fn ancestor_data_is_used_without_direct_data() {
        let host = setup();
        let outer = host.add_data_view(None, Some(json!({"name": "Outer"})), false);
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        slot.insert(InsertOptions::new().parent_view(outer)).unwrap();
        assert_eq!(body_texts(&host), vec!["Outer"]);
        assert_eq!(slot.current_data(), Some(json!({"name": "Outer"})));

        host.set_view_data(outer, Some(json!({"name": "Changed"})));
        assert_eq!(body_texts(&host), vec!["Changed"]);
    }

    #[test]
    fn rerenders_keep_their_position() {
        let host = setup();
        let body = host.body();
        host.append_element(body, ElementData::new("header"));
        let footer = host.append_element(body, ElementData::new("footer"));

        let slot = Slot::new(&host, SlotOptions::new().template("Card").data(json!({"name": "Ann"})));
        slot.insert(InsertOptions::new().before(footer)).unwrap();
        assert_eq!(body_tags(&host), vec!["header", "div", "footer"]);

        slot.set_data(json!({"name": "Bob"}));
        assert_eq!(body_tags(&host), vec!["header", "div", "footer"]);
        slot.set_template("userCard");
        assert_eq!(body_tags(&host), vec!["header", "section", "footer"]);
    }

    #[test]
    fn insert_into_missing_selector_fails_cleanly() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        let err = slot
            .insert(InsertOptions::new().into_selector("#missing"))
            .unwrap_err();
        assert!(matches!(err, SlotError::NoTargetElement { selector } if selector == "#missing"));
        assert!(!slot.is_created());
        assert!(host.views().is_empty());
    }

    #[test]
    fn insert_into_selector_target() {
        let host = setup();
        let main = host.append_element(host.body(), ElementData::new("main").with_id("main"));
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        slot.insert(InsertOptions::new().into_selector("#main")).unwrap();
        assert_eq!(host.document().children(main).len(), 1);
    }

    #[test]
    fn destroy_removes_rendered_elements() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        slot.insert(InsertOptions::new()).unwrap();
        slot.destroy().unwrap();
        assert!(body_tags(&host).is_empty());
        assert!(host.views().is_empty());
        assert_eq!(slot.render_count(), 0);
        assert!(slot.instance().first_node.is_none());

        // Changes after destroy render nothing.
        slot.set_data(json!({"name": "late"}));
        assert!(body_tags(&host).is_empty());
    }

    // ── hooks ────────────────────────────────────────────────────────

    #[test]
    fn hooks_fire_in_lifecycle_order() {
        let host = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        for phase in [Phase::Created, Phase::Ready, Phase::Rendered, Phase::Destroyed] {
            let log = log.clone();
            let label = phase.to_string();
            slot.on(phase, move |_| {
                log.borrow_mut().push(label.clone());
                Ok(())
            });
        }

        slot.insert(InsertOptions::new()).unwrap();
        slot.set_data(json!({"name": "Bob"}));
        slot.destroy().unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["created", "ready", "rendered", "rendered", "destroyed"]
        );
    }

    #[test]
    fn ready_hook_error_rolls_back_insert() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        slot.on(Phase::Ready, |_| Err("boom".into()));

        let err = slot.insert(InsertOptions::new()).unwrap_err();
        assert!(matches!(&err, SlotError::Hook { phase, .. } if phase == "ready"));
        assert_eq!(err.to_string(), "ready hook failed: boom");
        assert!(!slot.is_created());
        assert!(!slot.is_inserted());
        assert!(body_tags(&host).is_empty());
        assert!(host.views().is_empty());
    }

    #[test]
    fn created_hook_error_discards_view() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new());
        slot.on(Phase::Created, |_| Err("nope".into()));
        assert!(slot.create(None).is_err());
        assert!(slot.view().is_none());
        assert!(host.views().is_empty());
    }

    // ── events ───────────────────────────────────────────────────────

    #[test]
    fn events_receive_instance_and_target_data() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card").data(json!({"name": "Ann"})));
        slot.insert(InsertOptions::new()).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_c = seen.clone();
        slot.events(
            EventMap::new().on("click .delete", move |cx| {
                seen_c
                    .borrow_mut()
                    .push((cx.data.clone(), cx.instance.data.clone(), cx.receiver.element()));
            }),
            None,
        )
        .unwrap();
        assert_eq!(slot.active_listener_count(), 1);

        let button = host.document().query_selector(".delete").unwrap().unwrap();
        assert_eq!(host.trigger("click", button), 1);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, json!({"name": "Ann"}));
        assert_eq!(seen[0].1, Some(json!({"name": "Ann"})));
        assert_eq!(seen[0].2, Some(button));
    }

    #[test]
    fn events_on_unrendered_slot_wait_for_first_render() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        slot.create(None).unwrap();

        let clicks = Rc::new(Cell::new(0));
        let clicks_c = clicks.clone();
        let err = slot
            .events(EventMap::new().on("click", move |_| clicks_c.set(clicks_c.get() + 1)), None)
            .unwrap_err();
        assert!(matches!(err, SlotError::NoRegion { .. }));
        assert_eq!(slot.active_listener_count(), 0);

        slot.insert(InsertOptions::new()).unwrap();
        assert_eq!(slot.active_listener_count(), 1);
        let card = slot.rendered_elements()[0];
        host.trigger("click", card);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn events_follow_template_swaps() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card"));
        let clicks = Rc::new(Cell::new(0));
        let clicks_c = clicks.clone();
        slot.events(EventMap::new().on("click", move |_| clicks_c.set(clicks_c.get() + 1)), None)
            .unwrap();
        slot.insert(InsertOptions::new()).unwrap();

        slot.set_template("userCard");
        slot.set_template("Card");
        assert_eq!(slot.active_listener_count(), 1);
        host.trigger("click", slot.rendered_elements()[0]);
        assert_eq!(clicks.get(), 1);

        slot.destroy().unwrap();
        assert_eq!(slot.active_listener_count(), 0);
        assert!(host.listeners().is_empty());
    }

    // ── lookup host ──────────────────────────────────────────────────

    #[test]
    fn has_host_only_invalidates_on_presence_flip() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new());
        let runs = Rc::new(Cell::new(0));
        {
            let slot = slot.clone();
            let runs = runs.clone();
            create_effect(move || {
                slot.has_host();
                runs.set(runs.get() + 1);
            });
        }
        assert_eq!(runs.get(), 1);

        let a: Rc<dyn LookupHost> = Rc::new(StateMap::new());
        let b: Rc<dyn LookupHost> = Rc::new(StateMap::new());
        slot.set_host(Some(&a)).unwrap();
        assert_eq!(runs.get(), 2);
        slot.set_host(Some(&b)).unwrap();
        assert_eq!(runs.get(), 2);
        slot.set_host(None).unwrap();
        assert_eq!(runs.get(), 3);
        assert!(!slot.has_host());
    }

    #[test]
    fn lookup_host_is_visible_below_the_slot() {
        let host = setup();
        let state = StateMap::new();
        state.set("title", json!("Inbox"));
        let lookup: Rc<dyn LookupHost> = Rc::new(state);

        let slot = Slot::new(&host, SlotOptions::new());
        slot.set_host(Some(&lookup)).unwrap();
        let view = slot.create(None).unwrap();
        assert!(host.is_lookup_host(view));

        let child = host.add_view(Some(view), ViewNode::new("item", ViewKind::Plain));
        assert_eq!(host.lookup(child, "title"), Some(json!("Inbox")));

        slot.set_host(None).unwrap();
        assert!(host.lookup(child, "title").is_none());
    }

    // ── nesting and teardown ─────────────────────────────────────────

    #[test]
    fn template_swaps_and_reinserts_do_not_grow_the_runtime() {
        let host = setup();
        let slot = Slot::new(&host, SlotOptions::new().template("Card").data(json!({"name": "Ann"})));
        slot.insert(InsertOptions::new()).unwrap();
        let views = host.views().len();
        let before = runtime_size();

        for i in 0..200 {
            slot.set_template(if i % 2 == 0 { "userCard" } else { "Card" });
        }
        slot.set_template("Missing");
        slot.set_template("Card");
        assert_eq!(runtime_size(), before);
        assert_eq!(host.views().len(), views);
        assert_eq!(body_texts(&host), vec!["Ann"]);

        for _ in 0..20 {
            slot.destroy().unwrap();
            slot.insert(InsertOptions::new()).unwrap();
        }
        assert_eq!(runtime_size(), before);
        assert_eq!(host.views().len(), views);
    }

    #[test]
    fn nested_slot_inherits_the_outer_data_context() {
        let host = setup();
        let outer = Slot::new(&host, SlotOptions::new().template("Card").data(json!({"name": "outer"})));
        assert_eq!(outer.content_view(), None);
        outer.insert(InsertOptions::new()).unwrap();
        let wrapper = outer.content_view().unwrap();

        let aside = host.append_element(host.body(), ElementData::new("aside"));
        let inner = Slot::new(&host, SlotOptions::new().template("userCard"));
        inner
            .insert(InsertOptions::new().into_element(aside).parent_view(wrapper))
            .unwrap();
        let inner_text = |host: &Host| {
            let doc = host.document();
            let text = doc
                .children(aside)
                .first()
                .and_then(|&el| doc.get(el))
                .and_then(|data| data.text.clone());
            text
        };
        assert_eq!(inner.current_data(), Some(json!({"name": "outer"})));
        assert_eq!(inner_text(&host).as_deref(), Some("outer"));

        outer.set_data(json!({"name": "changed"}));
        assert_eq!(inner_text(&host).as_deref(), Some("changed"));

        // The wrapper and the nested view survive a template swap.
        outer.set_template("userCard");
        assert_eq!(outer.content_view(), Some(wrapper));
        assert!(host.views().contains(inner.view().unwrap()));
        assert_eq!(inner_text(&host).as_deref(), Some("changed"));

        outer.destroy().unwrap();
        assert_eq!(outer.content_view(), None);
        assert!(!host.views().contains(wrapper));
    }

    // ── inclusion ────────────────────────────────────────────────────

    #[test]
    fn from_inclusion_reads_template_and_data_arguments() {
        let host = setup();
        let args = host.add_data_view(
            None,
            Some(json!({"template": "Card", "data": {"name": "Dee"}})),
            true,
        );
        let included = host.add_view(Some(args), ViewNode::new("layout", ViewKind::Plain));
        let slot = Slot::from_inclusion(&host, included, None).unwrap();
        assert!(slot.is_created());

        slot.insert(InsertOptions::new()).unwrap();
        assert_eq!(body_texts(&host), vec!["Dee"]);

        host.set_view_data(args, Some(json!({"template": "userCard", "data": {"name": "Eve"}})));
        assert_eq!(body_tags(&host), vec!["section"]);
        assert_eq!(body_texts(&host), vec!["Eve"]);
    }

    #[test]
    fn explicit_null_data_argument_is_not_replaced_by_ancestor_data() {
        let host = setup();
        let outer = host.add_data_view(None, Some(json!({"name": "Outer"})), false);
        let args = host.add_data_view(
            Some(outer),
            Some(json!({"template": "Card", "data": null})),
            true,
        );
        let included = host.add_view(Some(args), ViewNode::new("layout", ViewKind::Plain));
        let slot = Slot::from_inclusion(&host, included, None).unwrap();
        assert_eq!(slot.current_data(), Some(Value::Null));

        host.set_view_data(args, Some(json!({"template": "Card"})));
        assert_eq!(slot.current_data(), Some(json!({"name": "Outer"})));
    }
}
