//! Construction and insertion options for [`Slot`](super::Slot).

use serde_json::Value;

use crate::dom::ElementId;
use crate::template::{Renderable, Source, Template};
use crate::view::ViewId;

/// Slot name used when none is given.
pub const DEFAULT_SLOT_NAME: &str = "DynamicTemplate";

// ---------------------------------------------------------------------------
// SlotOptions
// ---------------------------------------------------------------------------

/// How a slot starts out.
#[derive(Debug, Clone, Default)]
pub struct SlotOptions {
    pub template: Option<Source<Renderable>>,
    pub default_template: Option<Source<Renderable>>,
    pub data: Option<Source<Option<Value>>>,
    /// Literal block content, rendered when no template resolves.
    pub content: Option<Template>,
    pub name: Option<String>,
}

impl SlotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the renderable (builder). Accepts a name, a [`Template`], or a
    /// [`Renderable`].
    pub fn template(mut self, template: impl Into<Renderable>) -> Self {
        self.template = Some(Source::Value(template.into()));
        self
    }

    /// Compute the renderable on every read (builder).
    pub fn template_fn(mut self, f: impl Fn() -> Renderable + 'static) -> Self {
        self.template = Some(Source::accessor(f));
        self
    }

    pub fn default_template(mut self, template: impl Into<Renderable>) -> Self {
        self.default_template = Some(Source::Value(template.into()));
        self
    }

    pub fn default_template_fn(mut self, f: impl Fn() -> Renderable + 'static) -> Self {
        self.default_template = Some(Source::accessor(f));
        self
    }

    /// Set the data context (builder).
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(Source::Value(Some(data)));
        self
    }

    /// Compute the data context on every read (builder). Returning `None`
    /// falls back to the ancestor data.
    pub fn data_fn(mut self, f: impl Fn() -> Option<Value> + 'static) -> Self {
        self.data = Some(Source::accessor(f));
        self
    }

    pub fn content(mut self, content: Template) -> Self {
        self.content = Some(content);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ---------------------------------------------------------------------------
// InsertOptions
// ---------------------------------------------------------------------------

/// Where [`Slot::insert`](super::Slot::insert) puts the rendered content.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InsertTarget {
    #[default]
    Body,
    Element(ElementId),
    /// First element matching a selector.
    Selector(String),
}

#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    pub target: InsertTarget,
    /// Insert before this child of the target; append when `None`.
    pub next_node: Option<ElementId>,
    /// Parent for the slot's view when `insert` has to create it.
    pub parent_view: Option<ViewId>,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_element(mut self, el: ElementId) -> Self {
        self.target = InsertTarget::Element(el);
        self
    }

    pub fn into_selector(mut self, selector: impl Into<String>) -> Self {
        self.target = InsertTarget::Selector(selector.into());
        self
    }

    pub fn before(mut self, next: ElementId) -> Self {
        self.next_node = Some(next);
        self
    }

    pub fn parent_view(mut self, view: ViewId) -> Self {
        self.parent_view = Some(view);
        self
    }
}
