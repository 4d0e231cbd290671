//! Document queries: by id, class, tag, and selector matching.

use super::node::{ElementData, ElementId};
use super::selector::{
    parse_selector_list, Combinator, CompoundSelector, Selector, SelectorComponent, SelectorPart,
};
use super::tree::Document;
use crate::error::SlotError;

impl Document {
    /// Find the first connected element whose `id` matches, in tree order.
    pub fn query_by_id(&self, id: &str) -> Option<ElementId> {
        self.walk_depth_first(self.body())
            .into_iter()
            .find(|&el| self.get(el).is_some_and(|d| d.id.as_deref() == Some(id)))
    }

    /// All connected elements with the given class, in tree order.
    pub fn query_by_class(&self, class: &str) -> Vec<ElementId> {
        self.query_all(|data| data.has_class(class))
    }

    /// All connected elements with the given tag, in tree order.
    pub fn query_by_tag(&self, tag: &str) -> Vec<ElementId> {
        self.query_all(|data| data.tag == tag)
    }

    /// All connected elements matching an arbitrary predicate, in tree order.
    pub fn query_all(&self, predicate: impl Fn(&ElementData) -> bool) -> Vec<ElementId> {
        self.walk_depth_first(self.body())
            .into_iter()
            .filter(|&el| self.get(el).is_some_and(&predicate))
            .collect()
    }

    /// All connected elements matching a selector list, in tree order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, SlotError> {
        let selectors = parse_selector_list(selector)?;
        Ok(self
            .walk_depth_first(self.body())
            .into_iter()
            .filter(|&el| self.matches_any(&selectors, el))
            .collect())
    }

    /// First connected element matching a selector list.
    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementId>, SlotError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Whether `el` matches any selector in the list.
    pub fn matches_any(&self, selectors: &[Selector], el: ElementId) -> bool {
        selectors.iter().any(|s| self.matches(s, el))
    }

    /// Whether `el` matches `selector`, evaluated right to left.
    pub fn matches(&self, selector: &Selector, el: ElementId) -> bool {
        match selector.parts.split_last() {
            Some((SelectorPart::Compound(last), rest)) => {
                self.matches_compound_at(last, el) && self.matches_rest(rest, el)
            }
            _ => false,
        }
    }

    /// Match the remaining `[.., Compound, Combinator]` prefix against the
    /// ancestors of `el`, backtracking over descendant combinators.
    fn matches_rest(&self, rest: &[SelectorPart], el: ElementId) -> bool {
        let [head @ .., SelectorPart::Compound(compound), SelectorPart::Combinator(combinator)] =
            rest
        else {
            return rest.is_empty();
        };

        match combinator {
            Combinator::Child => self.parent(el).is_some_and(|p| {
                self.matches_compound_at(compound, p) && self.matches_rest(head, p)
            }),
            Combinator::Descendant => self.ancestors(el).into_iter().any(|a| {
                self.matches_compound_at(compound, a) && self.matches_rest(head, a)
            }),
        }
    }

    fn matches_compound_at(&self, compound: &CompoundSelector, el: ElementId) -> bool {
        self.get(el).is_some_and(|data| matches_compound(compound, data))
    }
}

fn matches_compound(compound: &CompoundSelector, data: &ElementData) -> bool {
    compound.components.iter().all(|component| match component {
        SelectorComponent::Type(tag) => data.tag == *tag,
        SelectorComponent::Class(name) => data.has_class(name),
        SelectorComponent::Id(id) => data.id.as_deref() == Some(id.as_str()),
        SelectorComponent::Universal => true,
    })
}

#[cfg(test)]
mod tests {
    use crate::dom::node::{ElementData, ElementId};
    use crate::dom::tree::Document;
    use crate::error::SlotError;

    /// Build a test tree for queries:
    /// ```text
    ///          body
    ///         /    \
    ///   nav#sidebar  main.content
    ///        |          |
    ///   ul.menu      section
    ///    /    \         |
    /// li#save li#cancel  li.item
    /// (.btn)  (.btn)
    /// ```
    fn build_query_tree() -> (Document, Vec<ElementId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let add = |doc: &mut Document, parent, data| {
            let el = doc.create_element(data);
            doc.append_child(parent, el);
            el
        };
        let nav = add(&mut doc, body, ElementData::new("nav").with_id("sidebar"));
        let main = add(&mut doc, body, ElementData::new("main").with_class("content"));
        let ul = add(&mut doc, nav, ElementData::new("ul").with_class("menu"));
        let save = add(&mut doc, ul, ElementData::new("li").with_id("save").with_class("btn"));
        let cancel = add(&mut doc, ul, ElementData::new("li").with_id("cancel").with_class("btn"));
        let section = add(&mut doc, main, ElementData::new("section"));
        let item = add(&mut doc, section, ElementData::new("li").with_class("item"));
        (doc, vec![nav, main, ul, save, cancel, section, item])
    }

    #[test]
    fn query_by_id_and_class() {
        let (doc, ids) = build_query_tree();
        assert_eq!(doc.query_by_id("save"), Some(ids[3]));
        assert_eq!(doc.query_by_id("nope"), None);
        assert_eq!(doc.query_by_class("btn"), vec![ids[3], ids[4]]);
        assert_eq!(doc.query_by_tag("li").len(), 3);
    }

    #[test]
    fn detached_elements_are_not_queried() {
        let (mut doc, _) = build_query_tree();
        let _floating = doc.create_element(ElementData::new("li").with_id("floating"));
        assert_eq!(doc.query_by_id("floating"), None);
        assert_eq!(doc.query_by_tag("li").len(), 3);
    }

    #[test]
    fn selector_child_and_descendant() {
        let (doc, ids) = build_query_tree();
        assert_eq!(doc.query_selector_all("ul > li").unwrap(), vec![ids[3], ids[4]]);
        assert_eq!(doc.query_selector_all("main li").unwrap(), vec![ids[6]]);
        assert_eq!(doc.query_selector_all("nav > li").unwrap(), Vec::<ElementId>::new());
        assert_eq!(doc.query_selector_all("#sidebar li.btn#cancel").unwrap(), vec![ids[4]]);
    }

    #[test]
    fn descendant_matching_backtracks() {
        // `nav > ul li`: the first ancestor matching `ul` is fine, but the
        // `nav >` step must be checked against that ancestor's parent.
        let (doc, ids) = build_query_tree();
        assert_eq!(doc.query_selector_all("nav > ul li").unwrap(), vec![ids[3], ids[4]]);
        assert_eq!(doc.query_selector_all("body > * li").unwrap().len(), 3);
    }

    #[test]
    fn selector_list_in_tree_order() {
        let (doc, ids) = build_query_tree();
        assert_eq!(
            doc.query_selector_all(".item, #save").unwrap(),
            vec![ids[3], ids[6]]
        );
        assert_eq!(doc.query_selector(".menu").unwrap(), Some(ids[2]));
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let (doc, _) = build_query_tree();
        assert!(matches!(
            doc.query_selector_all("ul >"),
            Err(SlotError::InvalidSelector { .. })
        ));
    }
}
