//! Snapshot rendering helpers.
//!
//! Functions for converting a [`Document`] into an indented, HTML-like text
//! outline suitable for snapshot testing and assertions.

use std::fmt::Write;

use crate::dom::{Document, ElementId};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render the whole document, starting at `<body>`.
///
/// One element per line, indented two spaces per level:
///
/// ```text
/// <body>
///   <div#main.card> Ann
///     <button.delete>
/// ```
///
/// Lines are separated by `'\n'`. The final line does not have a trailing
/// newline.
pub fn render_to_string(doc: &Document) -> String {
    render_subtree(doc, doc.body())
}

/// Render `root` and everything below it.
pub fn render_subtree(doc: &Document, root: ElementId) -> String {
    let mut lines = Vec::new();
    push_lines(doc, root, 0, &mut lines);
    lines.join("\n")
}

/// Render the children of `parent` without the parent itself.
pub fn render_children(doc: &Document, parent: ElementId) -> String {
    let mut lines = Vec::new();
    for &child in doc.children(parent) {
        push_lines(doc, child, 0, &mut lines);
    }
    lines.join("\n")
}

/// A single element as `<tag#id.class1.class2> text`.
pub fn element_label(doc: &Document, el: ElementId) -> String {
    let Some(data) = doc.get(el) else {
        return String::new();
    };
    let mut label = format!("<{}", data.tag);
    if let Some(id) = &data.id {
        let _ = write!(label, "#{id}");
    }
    for class in &data.classes {
        let _ = write!(label, ".{class}");
    }
    label.push('>');
    if let Some(text) = data.text.as_deref().filter(|t| !t.is_empty()) {
        let _ = write!(label, " {text}");
    }
    label
}

fn push_lines(doc: &Document, el: ElementId, depth: usize, lines: &mut Vec<String>) {
    if !doc.contains(el) {
        return;
    }
    lines.push(format!("{}{}", "  ".repeat(depth), element_label(doc, el)));
    for &child in doc.children(el) {
        push_lines(doc, child, depth + 1, lines);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementData;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        let mut doc = Document::new();
        let body = doc.body();
        let card = doc.create_element(ElementData::new("div").with_id("main").with_class("card").with_text("Ann"));
        doc.append_child(body, card);
        let button = doc.create_element(ElementData::new("button").with_class("delete"));
        doc.append_child(card, button);
        let footer = doc.create_element(ElementData::new("footer"));
        doc.append_child(body, footer);
        doc
    }

    #[test]
    fn renders_empty_body() {
        let doc = Document::new();
        assert_eq!(render_to_string(&doc), "<body>");
    }

    #[test]
    fn renders_nested_outline() {
        let doc = sample();
        assert_eq!(
            render_to_string(&doc),
            "<body>\n  <div#main.card> Ann\n    <button.delete>\n  <footer>"
        );
    }

    #[test]
    fn renders_children_only() {
        let doc = sample();
        assert_eq!(
            render_children(&doc, doc.body()),
            "<div#main.card> Ann\n  <button.delete>\n<footer>"
        );
    }

    #[test]
    fn detached_elements_are_not_rendered() {
        let mut doc = sample();
        let footer = doc.query_by_tag("footer")[0];
        doc.detach(footer);
        assert!(!render_to_string(&doc).contains("footer"));
        assert_eq!(render_subtree(&doc, footer), "<footer>");
    }

    #[test]
    fn snapshot_document_outline() {
        let doc = sample();
        insta::assert_snapshot!(render_to_string(&doc), @r"
        <body>
          <div#main.card> Ann
            <button.delete>
          <footer>
        ");
    }
}
