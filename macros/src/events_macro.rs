//! `events!` macro: parse `"spec" => handler` pairs, validate each spec at
//! compile time, and generate `EventMap` construction code.

use std::collections::HashSet;
use std::ops::Range;

use logos::Logos;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Error, Expr, LitStr, Result, Token};

// ---------------------------------------------------------------------------
// AST types
// ---------------------------------------------------------------------------

/// One `"spec" => handler` entry.
struct EventEntry {
    spec: LitStr,
    handler: Expr,
}

/// The top-level input to the events! macro.
struct EventsInput {
    entries: Vec<EventEntry>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Parse for EventEntry {
    fn parse(input: ParseStream) -> Result<Self> {
        let spec: LitStr = input.parse()?;
        input.parse::<Token![=>]>()?;
        let handler: Expr = input.parse()?;
        Ok(EventEntry { spec, handler })
    }
}

impl Parse for EventsInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let entries = input.parse_terminated(EventEntry::parse, Token![,])?;
        Ok(EventsInput {
            entries: entries.into_iter().collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Split at each comma followed by whitespace, the same way the runtime
/// parser does.
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

fn is_event_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
}

/// Selector tokens, lexed with the same rules as `dynslot::dom::selector::Token`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum Token {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    #[token(".")]
    Dot,

    #[token("#")]
    Hash,

    #[token("*")]
    Star,

    #[token(">")]
    GreaterThan,

    #[token(",")]
    Comma,
}

/// Tokens with their byte spans.
fn tokenize(selector: &str) -> std::result::Result<Vec<(Token, Range<usize>)>, String> {
    Token::lexer(selector)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => {
                let c = selector[span.start..].chars().next().unwrap_or('?');
                Err(format!("unexpected character `{c}` at byte {}", span.start))
            }
        })
        .collect()
}

/// Check `selector` against the supported grammar.
pub(crate) fn validate_selector(selector: &str) -> std::result::Result<(), String> {
    let tokens = tokenize(selector)?;
    let mut need_compound = true;
    let mut iter = tokens.iter();
    while let Some((token, span)) = iter.next() {
        match token {
            Token::Dot | Token::Hash => {
                let sigil = if *token == Token::Dot { '.' } else { '#' };
                match iter.next() {
                    Some((Token::Ident, name)) if name.start == span.end => {}
                    _ => return Err(format!("expected a name right after `{sigil}`")),
                }
                need_compound = false;
            }
            Token::Ident | Token::Star => need_compound = false,
            Token::GreaterThan | Token::Comma => {
                if need_compound {
                    let what = if *token == Token::GreaterThan { "`>`" } else { "`,`" };
                    return Err(format!("{what} must follow a selector"));
                }
                need_compound = true;
            }
        }
    }
    if need_compound {
        return Err(if tokens.is_empty() {
            "empty selector".to_owned()
        } else {
            "selector ends with a combinator".to_owned()
        });
    }
    Ok(())
}

/// Check a whole event spec.
pub(crate) fn validate_spec(spec: &str) -> std::result::Result<(), String> {
    let mut clauses = 0;
    for clause in split_clauses(spec) {
        let mut words = clause.split_whitespace();
        let Some(event) = words.next() else {
            continue;
        };
        if !is_event_name(event) {
            return Err(format!("invalid event name `{event}`"));
        }
        let selector = words.collect::<Vec<_>>().join(" ");
        if !selector.is_empty() {
            validate_selector(&selector).map_err(|msg| format!("in `{}`: {msg}", clause.trim()))?;
        }
        clauses += 1;
    }
    if clauses == 0 {
        return Err("event spec has no event name".to_owned());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

pub(crate) fn events_impl(input: TokenStream) -> Result<TokenStream> {
    let parsed: EventsInput = syn::parse2(input)?;

    let mut seen = HashSet::new();
    let mut inserts = Vec::with_capacity(parsed.entries.len());
    for EventEntry { spec, handler } in &parsed.entries {
        let text = spec.value();
        validate_spec(&text).map_err(|msg| Error::new(spec.span(), msg))?;
        if !seen.insert(text.clone()) {
            return Err(Error::new(spec.span(), format!("duplicate event spec `{text}`")));
        }
        inserts.push(quote! { __map.insert(#spec, #handler); });
    }

    Ok(quote! {
        {
            let mut __map = ::dynslot::event::EventMap::new();
            #(#inserts)*
            __map
        }
    })
}

// ===========================================================================
// Tests
// ===========================================================================
