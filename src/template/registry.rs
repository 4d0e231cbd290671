//! Templates and the name → template registry.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::dom::{Document, ElementData, ElementId};
use crate::view::ViewId;

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// What a template's render function sees: the data context, and a handle on
/// the document for building its elements.
///
/// Elements created with [`element`](Self::element) become the top level of
/// the rendered region; [`child`](Self::child) nests under them. Every element
/// is tagged with the rendering view so events can find its data context.
pub struct RenderContext<'a> {
    doc: &'a mut Document,
    view: ViewId,
    data: Option<Value>,
    roots: Vec<ElementId>,
}

impl<'a> RenderContext<'a> {
    pub fn new(doc: &'a mut Document, view: ViewId, data: Option<Value>) -> Self {
        Self {
            doc,
            view,
            data,
            roots: Vec::new(),
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    /// The data context; `None` when absent.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// One field of an object data context.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// A field rendered as text: strings unquoted, other values as JSON,
    /// missing fields empty.
    pub fn text(&self, key: &str) -> String {
        match self.field(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Create a top-level element of the region.
    pub fn element(&mut self, data: ElementData) -> ElementId {
        let el = self.create(data);
        self.roots.push(el);
        el
    }

    /// Create an element under `parent`.
    pub fn child(&mut self, parent: ElementId, data: ElementData) -> ElementId {
        let el = self.create(data);
        self.doc.append_child(parent, el);
        el
    }

    fn create(&mut self, mut data: ElementData) -> ElementId {
        data.view = Some(self.view);
        self.doc.create_element(data)
    }

    /// Top-level elements created so far, in order.
    pub fn into_roots(self) -> Vec<ElementId> {
        self.roots
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

type RenderFn = dyn Fn(&mut RenderContext<'_>);

/// A named renderable: a render function over a data context.
///
/// Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct Template {
    inner: Rc<TemplateInner>,
}

struct TemplateInner {
    name: String,
    render: Box<RenderFn>,
}

impl Template {
    pub fn new(name: impl Into<String>, render: impl Fn(&mut RenderContext<'_>) + 'static) -> Self {
        Self {
            inner: Rc::new(TemplateInner {
                name: name.into(),
                render: Box::new(render),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn render(&self, cx: &mut RenderContext<'_>) {
        (self.inner.render)(cx)
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.inner.name).finish()
    }
}

// ---------------------------------------------------------------------------
// TemplateRegistry
// ---------------------------------------------------------------------------

/// Templates by name.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the template's own name, replacing any previous one.
    pub fn register(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(template.name().to_owned(), template)
    }

    pub fn lookup(&self, name: &str) -> Option<Template> {
        self.templates.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Normalize a template name to camelCase.
///
/// Splits on `_`, `-` and `.`; the first segment gets a lowercase first
/// letter, later segments an uppercase one. The rest of each segment is kept.
///
/// ```
/// use dynslot::template::camel_case;
/// assert_eq!(camel_case("user-card"), "userCard");
/// assert_eq!(camel_case("Missing"), "missing");
/// ```
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let segments = name.split(['_', '-', '.']).filter(|s| !s.is_empty());
    for (i, segment) in segments.enumerate() {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slotmap::SlotMap;

    fn view_id() -> ViewId {
        let mut views: SlotMap<ViewId, ()> = SlotMap::with_key();
        views.insert(())
    }

    #[test]
    fn camel_case_variants() {
        assert_eq!(camel_case("user-card"), "userCard");
        assert_eq!(camel_case("user_card.item"), "userCardItem");
        assert_eq!(camel_case("UserCard"), "userCard");
        assert_eq!(camel_case("Missing"), "missing");
        assert_eq!(camel_case("--a--b"), "aB");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn registry_lookup_and_replace() {
        let mut registry = TemplateRegistry::new();
        let first = Template::new("card", |_| {});
        let second = Template::new("card", |_| {});
        assert!(registry.register(first.clone()).is_none());
        assert_eq!(registry.register(second.clone()), Some(first));
        assert_eq!(registry.lookup("card"), Some(second));
        assert_eq!(registry.lookup("Card"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn template_equality_is_identity() {
        let a = Template::new("x", |_| {});
        let b = Template::new("x", |_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "Template(\"x\")");
    }

    #[test]
    fn render_context_builds_tagged_elements() {
        let mut doc = Document::new();
        let view = view_id();
        let template = Template::new("card", |cx| {
            let root = cx.element(ElementData::new("div").with_class("card"));
            let text = cx.text("name");
            cx.child(root, ElementData::new("span").with_text(text));
            cx.element(ElementData::new("hr"));
        });

        let mut cx = RenderContext::new(&mut doc, view, Some(json!({"name": "Ann", "age": 3})));
        assert_eq!(cx.text("age"), "3");
        assert_eq!(cx.text("missing"), "");
        template.render(&mut cx);
        let roots = cx.into_roots();

        assert_eq!(roots.len(), 2);
        let span = doc.children(roots[0])[0];
        assert_eq!(doc.get(span).and_then(|e| e.text.clone()), Some("Ann".into()));
        assert_eq!(doc.get(span).and_then(|e| e.view), Some(view));
        assert_eq!(doc.parent(roots[0]), None);
    }
}
