//! Proc macros for dynslot: `events!` event maps checked at compile time.
//!
//! This crate is not meant to be used directly. Enable the `macros` feature
//! on `dynslot`.

use proc_macro::TokenStream;

mod events_macro;

/// Build an `EventMap` from `"spec" => handler` pairs.
///
/// Each spec is validated while compiling: every clause needs an event name,
/// and selectors must use the supported syntax (type, `*`, `.class`, `#id`,
/// compounds, descendant and `>` combinators, comma lists). The same spec
/// may not appear twice.
///
/// # Example
///
/// ```ignore
/// let map = events! {
///     "click .delete" => |cx| remove(cx.data.clone()),
///     "keydown input, change select" => on_edit,
/// };
/// slot.events(map, None)?;
/// ```
#[proc_macro]
pub fn events(input: TokenStream) -> TokenStream {
    events_macro::events_impl(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
