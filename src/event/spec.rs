//! Event-spec strings: `"click .item, keydown input"`.
//!
//! A spec is one or more clauses separated by a comma *followed by
//! whitespace*; a bare comma stays inside the clause, so `"click .a,.b"` is a
//! single clause with the selector list `.a,.b`. Each clause is an event name
//! followed by an optional selector.

use crate::dom::selector::{parse_selector_list, Selector};
use crate::error::SlotError;

/// One `"<event> <selector>"` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct EventClause {
    pub event: String,
    /// Selector text as written; `None` targets the region's top-level elements.
    pub selector: Option<String>,
    pub(crate) selectors: Option<Vec<Selector>>,
}

impl EventClause {
    pub fn selectors(&self) -> Option<&[Selector]> {
        self.selectors.as_deref()
    }
}

/// Parse every clause of `spec`. Fails on the first malformed selector.
pub fn parse_event_spec(spec: &str) -> Result<Vec<EventClause>, SlotError> {
    let mut clauses = Vec::new();
    for clause in split_clauses(spec) {
        let mut words = clause.split_whitespace();
        let Some(event) = words.next() else {
            continue;
        };
        let selector = words.collect::<Vec<_>>().join(" ");
        let (selector, selectors) = if selector.is_empty() {
            (None, None)
        } else {
            let parsed = parse_selector_list(&selector)?;
            (Some(selector), Some(parsed))
        };
        clauses.push(EventClause {
            event: event.to_owned(),
            selector,
            selectors,
        });
    }
    if clauses.is_empty() {
        return Err(SlotError::invalid_selector(spec, "event spec has no event name"));
    }
    Ok(clauses)
}

/// Split at each comma that is followed by whitespace.
fn split_clauses(spec: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut chars = spec.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == ',' && chars.peek().is_some_and(|&(_, next)| next.is_whitespace()) {
            clauses.push(&spec[start..i]);
            start = i + 1;
        }
    }
    clauses.push(&spec[start..]);
    clauses
}
