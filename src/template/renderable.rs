//! What a slot renders: the `Renderable` reference, value-or-accessor
//! sources, and resolution against the registry.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::registry::{camel_case, Template, TemplateRegistry};

/// A reference to something renderable, tagged when it is assigned.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Renderable {
    /// A template name, looked up in the registry at render time.
    Name(String),
    /// An already-resolved template.
    Handle(Template),
    /// Literal block content.
    Block(Template),
    #[default]
    None,
}

impl Renderable {
    pub fn is_none(&self) -> bool {
        matches!(self, Renderable::None)
    }
}

impl From<&str> for Renderable {
    fn from(name: &str) -> Self {
        Renderable::Name(name.to_owned())
    }
}

impl From<String> for Renderable {
    fn from(name: String) -> Self {
        Renderable::Name(name)
    }
}

impl From<Template> for Renderable {
    fn from(template: Template) -> Self {
        Renderable::Handle(template)
    }
}

impl<T: Into<Renderable>> From<Option<T>> for Renderable {
    fn from(value: Option<T>) -> Self {
        value.map_or(Renderable::None, Into::into)
    }
}

/// A stored value, or a function producing one on each read.
pub enum Source<T> {
    Value(T),
    Accessor(Rc<dyn Fn() -> T>),
}

impl<T> Source<T> {
    pub fn accessor(f: impl Fn() -> T + 'static) -> Self {
        Source::Accessor(Rc::new(f))
    }

    /// The current value, invoking the accessor if there is one.
    pub fn read(&self) -> T
    where
        T: Clone,
    {
        match self {
            Source::Value(v) => v.clone(),
            Source::Accessor(f) => f(),
        }
    }

    /// Values compare by equality, accessors by identity. Accessors are
    /// never invoked.
    pub fn same_as(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        match (self, other) {
            (Source::Value(a), Source::Value(b)) => a == b,
            (Source::Accessor(a), Source::Accessor(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> From<T> for Source<T> {
    fn from(value: T) -> Self {
        Source::Value(value)
    }
}

impl<T> Clone for Source<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Source::Value(v) => Source::Value(v.clone()),
            Source::Accessor(f) => Source::Accessor(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Source::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

/// A renderable after registry lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRenderable {
    Template(Template),
    Block(Template),
    /// A name that is not registered; renders as an inline diagnostic.
    Error { message: String },
    Nothing,
}

impl ResolvedRenderable {
    /// The template to render, if any.
    pub fn template(&self) -> Option<&Template> {
        match self {
            ResolvedRenderable::Template(t) | ResolvedRenderable::Block(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResolvedRenderable::Error { .. })
    }
}

/// Resolve `renderable` against `registry`.
///
/// Names fall back to their camelCase form when `normalize` is set; a name
/// that is still missing becomes [`ResolvedRenderable::Error`]. `None` falls
/// back to the slot's block `content`.
pub fn resolve_renderable(
    registry: &TemplateRegistry,
    renderable: &Renderable,
    content: Option<&Template>,
    normalize: bool,
) -> ResolvedRenderable {
    match renderable {
        Renderable::Name(name) => {
            let normalized = normalize.then(|| camel_case(name));
            let found = registry
                .lookup(name)
                .or_else(|| normalized.as_deref().and_then(|n| registry.lookup(n)));
            match found {
                Some(template) => ResolvedRenderable::Template(template),
                None => {
                    tracing::warn!(template = %name, "template not found");
                    ResolvedRenderable::Error {
                        message: not_found_message(name, normalized.as_deref()),
                    }
                }
            }
        }
        Renderable::Handle(template) => ResolvedRenderable::Template(template.clone()),
        Renderable::Block(template) => ResolvedRenderable::Block(template.clone()),
        Renderable::None => content
            .cloned()
            .map_or(ResolvedRenderable::Nothing, ResolvedRenderable::Block),
    }
}

/// The diagnostic shown in place of a missing template. Names are quoted as
/// JSON strings.
pub fn not_found_message(name: &str, normalized: Option<&str>) -> String {
    let quoted = Value::from(name).to_string();
    match normalized {
        Some(alt) => format!(
            "Couldn't find a template named {quoted} or {}. Are you sure you defined it?",
            Value::from(alt)
        ),
        None => format!("Couldn't find a template named {quoted}. Are you sure you defined it?"),
    }
}
