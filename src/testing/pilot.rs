//! Pilot: programmatic interaction with a headless [`Host`].
//!
//! The `Pilot` wraps a host and provides methods to simulate user events on
//! elements picked by selector, and to render the document to text for
//! snapshot testing.

use serde_json::json;

use crate::dom::{ElementData, ElementId};
use crate::error::SlotError;
use crate::event::DomEvent;
use crate::host::Host;
use crate::template::Template;

use super::snapshot;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless host driver for testing.
///
/// # Examples
///
/// ```ignore
/// use dynslot::testing::Pilot;
/// use dynslot::{InsertOptions, Slot, SlotOptions};
///
/// let pilot = Pilot::new();
/// let slot = Slot::new(pilot.host(), SlotOptions::new().template("Row"));
/// slot.insert(InsertOptions::new()).unwrap();
/// pilot.click(".delete").unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pilot {
    host: Host,
}

impl Pilot {
    /// A pilot over a fresh host with the default config.
    pub fn new() -> Self {
        Self { host: Host::new() }
    }

    /// A pilot over an existing host.
    pub fn with_host(host: Host) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Register templates (builder).
    pub fn with_templates(self, templates: impl IntoIterator<Item = Template>) -> Self {
        for template in templates {
            self.host.register_template(template);
        }
        self
    }

    // ── Document setup ───────────────────────────────────────────────

    /// Append an element under `<body>`.
    pub fn append(&self, data: ElementData) -> ElementId {
        self.host.append_element(self.host.body(), data)
    }

    // ── Query ────────────────────────────────────────────────────────

    /// First element matching `selector`.
    pub fn find(&self, selector: &str) -> Result<ElementId, SlotError> {
        self.host
            .document()
            .query_selector(selector)?
            .ok_or_else(|| SlotError::NoTargetElement {
                selector: selector.to_owned(),
            })
    }

    /// Number of connected elements matching `selector`.
    pub fn count(&self, selector: &str) -> Result<usize, SlotError> {
        Ok(self.host.document().query_selector_all(selector)?.len())
    }

    /// Text of the first element matching `selector`.
    pub fn text(&self, selector: &str) -> Result<Option<String>, SlotError> {
        let el = self.find(selector)?;
        Ok(self.host.document().get(el).and_then(|data| data.text.clone()))
    }

    // ── Event simulation ─────────────────────────────────────────────

    /// Dispatch a `click` at the first element matching `selector`.
    /// Returns how many listeners ran.
    pub fn click(&self, selector: &str) -> Result<usize, SlotError> {
        self.trigger("click", selector)
    }

    /// Dispatch an event of `kind` at the first element matching `selector`.
    pub fn trigger(&self, kind: &str, selector: &str) -> Result<usize, SlotError> {
        let target = self.find(selector)?;
        Ok(self.host.trigger(kind, target))
    }

    /// Dispatch a `keydown` carrying `{"key": key}` as its detail at the
    /// first element matching `selector`.
    pub fn press_key(&self, selector: &str, key: &str) -> Result<usize, SlotError> {
        let target = self.find(selector)?;
        Ok(self
            .host
            .dispatch(&DomEvent::new("keydown", target).with_detail(json!({ "key": key }))))
    }

    /// Dispatch a prepared event.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        self.host.dispatch(event)
    }

    // ── Render helpers ───────────────────────────────────────────────

    /// The document as an indented outline.
    pub fn render(&self) -> String {
        snapshot::render_to_string(&self.host.document())
    }

    /// Only what sits under `<body>`.
    pub fn render_body(&self) -> String {
        let doc = self.host.document();
        snapshot::render_children(&doc, doc.body())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
