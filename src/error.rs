//! Crate error type.
//!
//! A template that cannot be found is not an error value: it resolves to
//! [`ResolvedRenderable::Error`](crate::template::ResolvedRenderable::Error)
//! and renders an inline diagnostic instead.

/// Errors raised synchronously by slot, lookup and event operations.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// `create()` called on a slot that already has a view.
    #[error("slot `{name}` has already been created")]
    AlreadyCreated { name: String },

    /// `insert()` target selector resolved to zero elements.
    #[error("no element matches insert target `{selector}`")]
    NoTargetElement { selector: String },

    /// Events attached to a slot whose view exists but has not rendered.
    #[error("slot `{name}` has no rendered region to attach events to")]
    NoRegion { name: String },

    /// Lookup host registered against a view that is not in the tree.
    #[error("lookup host target is not a live view")]
    InvalidLookupTarget,

    /// Lookup host registered with a host that has already been dropped.
    #[error("lookup host has already been dropped")]
    InvalidLookupHost,

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    /// A lifecycle callback returned an error.
    #[error("{phase} hook failed: {source}")]
    Hook {
        phase: String,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

impl SlotError {
    pub(crate) fn invalid_selector(selector: &str, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_owned(),
            message: message.into(),
        }
    }
}
