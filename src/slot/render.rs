//! The render pipeline behind an inserted slot.
//!
//! Three computations, outermost first:
//!
//! 1. a tracker that copies the resolved renderable into a [`ReactiveVar`],
//!    so equal values never reach the renderer;
//! 2. the template pass, which reads that var and resolves it against the
//!    registry;
//! 3. the content pass, owned by the template pass, which evaluates the data
//!    context, publishes it on the slot's data wrapper view and renders the
//!    elements.
//!
//! A data change re-runs only the content pass. A renderable change re-runs
//! the template pass, which disposes the old content pass with it.
//!
//! The data wrapper lives as long as the mount. Each pass removes only the
//! views it rendered itself, so slots nested under the wrapper survive the
//! outer slot's re-renders.

use std::rc::Rc;

use serde_json::{json, Value};
use tracing::error;

use super::controller::{Slot, SlotInner};
use crate::dom::{ElementData, ElementId};
use crate::error::SlotError;
use crate::lifecycle::Phase;
use crate::reactive::{create_effect, create_effect_with_id, dispose_effect, on_cleanup, untrack, ReactiveVar};
use crate::template::{resolve_renderable, RenderContext, Renderable, ResolvedRenderable};
use crate::view::{Region, ViewId, ViewKind, ViewNode};

/// Class of the element rendered for a missing template when no error
/// template is registered.
pub const ERROR_CLASS: &str = "dynslot-error";

/// Mount a created slot under `parent` and run its first render pass.
///
/// `Ready` and the first `Rendered` fire here so their errors reach the
/// caller; later passes log hook errors instead.
pub(crate) fn mount(slot: &Slot, parent: ElementId, next_node: Option<ElementId>) -> Result<(), SlotError> {
    let inner = &slot.inner;
    let Some(view) = inner.state.borrow().view else {
        return Ok(());
    };
    let host = &inner.host;

    let region = Rc::new(Region::new());
    region.set_parent_element(parent);
    if let Some(node) = host.views_mut().get_mut(view) {
        node.region = Some(region.clone());
        node.render_count = 0;
    }
    host.track_region(&region);
    let with_view = host.add_data_view(Some(view), None, false);
    let template_var = ReactiveVar::new(Renderable::None);
    {
        let mut state = inner.state.borrow_mut();
        state.next_node = next_node;
        state.mounting = true;
        state.content_view = Some(with_view);
        state.template_var = Some(template_var);
    }

    let weak = Rc::downgrade(inner);
    let tracker = {
        let weak = weak.clone();
        untrack(|| {
            create_effect_with_id(move || {
                if let Some(inner) = weak.upgrade() {
                    template_var.set(inner.renderable.get());
                }
            })
        })
    };
    let template_pass = untrack(|| {
        create_effect_with_id(move || {
            if let Some(inner) = weak.upgrade() {
                run_template_pass(&inner, view, with_view, template_var);
            }
        })
    });
    {
        let mut state = inner.state.borrow_mut();
        state.effects = vec![tracker, template_pass];
        state.mounting = false;
    }

    inner.hooks.run(&Phase::Ready, slot)?;
    inner.hooks.run(&Phase::Rendered, slot)
}

/// Dispose the render computations and remove everything they rendered.
/// The slot's own view survives.
pub(crate) fn unmount(inner: &SlotInner) {
    let (effects, view, template_var) = {
        let mut state = inner.state.borrow_mut();
        state.content_view = None;
        (std::mem::take(&mut state.effects), state.view, state.template_var.take())
    };
    for effect in effects {
        dispose_effect(effect);
    }
    clear_rendered(inner);
    if let Some(var) = template_var {
        var.dispose();
    }

    if let Some(view) = view {
        let region = inner.host.views_mut().get_mut(view).and_then(|node| {
            node.render_count = 0;
            node.region.take()
        });
        if let Some(region) = region {
            region.detach();
        }
        inner.host.remove_child_views(view);
    }
    inner.events.reset();
    let mut state = inner.state.borrow_mut();
    state.rendered.clear();
    state.rendered_view = None;
}

fn run_template_pass(
    inner: &Rc<SlotInner>,
    view: ViewId,
    with_view: ViewId,
    template_var: ReactiveVar<Renderable>,
) {
    let renderable = template_var.get();
    let resolved = {
        let templates = inner.host.templates();
        resolve_renderable(
            &templates,
            &renderable,
            inner.content.as_ref(),
            inner.host.config().normalize_names,
        )
    };
    inner.state.borrow_mut().resolved = Some(resolved.clone());

    let weak = Rc::downgrade(inner);
    {
        let weak = weak.clone();
        on_cleanup(move || {
            if let Some(inner) = weak.upgrade() {
                clear_rendered(&inner);
                remove_rendered_view(&inner);
            }
        });
    }

    create_effect(move || {
        if let Some(inner) = weak.upgrade() {
            run_content_pass(&inner, view, with_view, &resolved);
        }
    });
}

fn run_content_pass(inner: &Rc<SlotInner>, view: ViewId, with_view: ViewId, resolved: &ResolvedRenderable) {
    let Some(region) = inner.host.region_of(view) else {
        return;
    };
    let Some(parent) = region.parent_element() else {
        return;
    };

    let data = inner
        .data
        .get_or_else(|| inner.host.resolve_ancestor_data(view));
    inner.host.set_view_data(with_view, data.clone());

    let anchor = clear_rendered(inner);
    remove_rendered_view(inner);
    let (roots, rendered_view) = render_resolved(inner, with_view, resolved, data);

    let connected = {
        let mut doc = inner.host.document_mut();
        for &root in &roots {
            doc.insert_before(parent, root, anchor);
        }
        doc.is_connected(parent)
    };
    region.set_members(roots.clone());
    {
        let mut state = inner.state.borrow_mut();
        state.rendered = roots;
        state.rendered_view = rendered_view;
    }
    if let Some(node) = inner.host.views_mut().get_mut(view) {
        node.render_count += 1;
    }

    if connected {
        region.attach(parent);
    }
    inner.events.on_rendered(&region);

    if inner.state.borrow().mounting {
        return;
    }
    if let Some(slot) = inner.handle() {
        if let Err(err) = untrack(|| inner.hooks.run(&Phase::Rendered, &slot)) {
            error!(slot = %inner.name, %err, "rendered hook failed");
        }
    }
}

/// Render `resolved` into detached elements under `with_view`. Returns the
/// top-level elements and the view they were rendered by.
fn render_resolved(
    inner: &SlotInner,
    with_view: ViewId,
    resolved: &ResolvedRenderable,
    data: Option<Value>,
) -> (Vec<ElementId>, Option<ViewId>) {
    let host = &inner.host;
    match resolved {
        ResolvedRenderable::Template(template) => {
            let view = host.add_view(Some(with_view), ViewNode::new(template.name(), ViewKind::Plain));
            let mut doc = host.document_mut();
            let mut cx = RenderContext::new(&mut doc, view, data);
            template.render(&mut cx);
            (cx.into_roots(), Some(view))
        }
        ResolvedRenderable::Block(block) => {
            let view = host.add_view(Some(with_view), ViewNode::new(block.name(), ViewKind::Content));
            let mut doc = host.document_mut();
            let mut cx = RenderContext::new(&mut doc, view, data);
            block.render(&mut cx);
            (cx.into_roots(), Some(view))
        }
        ResolvedRenderable::Error { message } => render_error(inner, with_view, message),
        ResolvedRenderable::Nothing => (Vec::new(), None),
    }
}

/// The error template with `{"msg": message}` as its data, or a plain
/// `div.dynslot-error` when none is registered.
fn render_error(inner: &SlotInner, with_view: ViewId, message: &str) -> (Vec<ElementId>, Option<ViewId>) {
    let host = &inner.host;
    let msg = json!({ "msg": message });
    let msg_view = host.add_data_view(Some(with_view), Some(msg.clone()), false);
    let template = host.templates().lookup(&host.config().error_template_name);

    let roots = match template {
        Some(template) => {
            let view = host.add_view(Some(msg_view), ViewNode::new(template.name(), ViewKind::Plain));
            let mut doc = host.document_mut();
            let mut cx = RenderContext::new(&mut doc, view, Some(msg));
            template.render(&mut cx);
            cx.into_roots()
        }
        None => {
            let mut doc = host.document_mut();
            let mut cx = RenderContext::new(&mut doc, msg_view, Some(msg));
            cx.element(ElementData::new("div").with_class(ERROR_CLASS).with_text(message));
            cx.into_roots()
        }
    };
    (roots, Some(msg_view))
}

/// Delete the last pass's top-level elements. Returns where the next pass
/// should insert: where the old content ended, or the mount anchor when
/// nothing was rendered.
pub(crate) fn clear_rendered(inner: &SlotInner) -> Option<ElementId> {
    let old = std::mem::take(&mut inner.state.borrow_mut().rendered);
    let mut doc = inner.host.document_mut();
    if let Some(&last) = old.last() {
        inner.state.borrow_mut().next_node = doc.next_sibling(last);
    }
    for el in old {
        doc.remove(el);
    }
    inner.state.borrow().next_node
}

/// Remove the view tree of the last pass, keeping the data wrapper and
/// anything nested under it by other slots.
fn remove_rendered_view(inner: &SlotInner) {
    let rendered_view = inner.state.borrow_mut().rendered_view.take();
    if let Some(view) = rendered_view {
        inner.host.remove_view(view);
    }
}
