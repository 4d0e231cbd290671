//! Templates, the template registry, and the renderable/data resolvers.

pub mod registry;
pub mod renderable;
pub mod resolver;

pub use registry::{camel_case, RenderContext, Template, TemplateRegistry};
pub use renderable::{
    not_found_message, resolve_renderable, Renderable, ResolvedRenderable, Source,
};
pub use resolver::{DataContextResolver, RenderableResolver};
