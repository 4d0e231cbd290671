//! Element types: ElementId, ElementData.

use slotmap::new_key_type;

use crate::view::ViewId;

new_key_type! {
    /// Unique identifier for a document element. Copy, lightweight (u64).
    pub struct ElementId;
}

/// Data associated with a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name (e.g. "div", "button"), matched by type selectors.
    pub tag: String,
    /// Optional unique id (`#id` selector).
    pub id: Option<String>,
    /// Classes (`.class` selector).
    pub classes: Vec<String>,
    /// Text content rendered inside the element.
    pub text: Option<String>,
    /// The view whose render pass produced this element.
    pub view: Option<ViewId>,
}

impl ElementData {
    /// Create a new `ElementData` with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            text: None,
            view: None,
        }
    }

    /// Set the id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Add multiple classes (builder).
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for class in classes {
            self = self.with_class(class);
        }
        self
    }

    /// Set the text content (builder).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_owned());
        }
    }

    /// Remove a class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Toggle a class: add if absent, remove if present.
    pub fn toggle_class(&mut self, class: &str) {
        if self.has_class(class) {
            self.remove_class(class);
        } else {
            self.add_class(class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults() {
        let data = ElementData::new("div");
        assert_eq!(data.tag, "div");
        assert!(data.id.is_none());
        assert!(data.classes.is_empty());
        assert!(data.text.is_none());
        assert!(data.view.is_none());
    }

    #[test]
    fn builder_chain() {
        let data = ElementData::new("button")
            .with_id("save")
            .with_classes(["btn", "primary", "btn"])
            .with_text("Save");
        assert_eq!(data.id.as_deref(), Some("save"));
        assert_eq!(data.classes, vec!["btn", "primary"]);
        assert_eq!(data.text.as_deref(), Some("Save"));
    }

    #[test]
    fn class_mutation() {
        let mut data = ElementData::new("li");
        data.add_class("active");
        data.add_class("active");
        assert_eq!(data.classes.len(), 1);
        data.toggle_class("active");
        assert!(!data.has_class("active"));
        data.toggle_class("active");
        data.remove_class("active");
        data.remove_class("missing");
        assert!(data.classes.is_empty());
    }

    #[test]
    fn element_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<ElementId>();
    }
}
