//! Selector model, logos tokenizer and recursive descent parser.
//!
//! Supported syntax: type (`li`), universal (`*`), class (`.item`), id
//! (`#save`), compound (`li.item#first`), descendant (`ul li`) and child
//! (`ul > li`) combinators, and comma-separated selector lists.

use logos::Logos;

use crate::error::SlotError;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Selector token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    /// Tag, class or id name.
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

/// A token with its source text and byte span (for adjacency detection).
#[derive(Debug, Clone)]
struct SpannedToken {
    token: Token,
    text: String,
    start: usize,
    end: usize,
}

fn tokenize(input: &str) -> Result<Vec<SpannedToken>, SlotError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        let token = result.map_err(|()| {
            SlotError::invalid_selector(
                input,
                format!("unexpected character at byte {}", span.start),
            )
        })?;
        tokens.push(SpannedToken {
            token,
            text: input[span.clone()].to_owned(),
            start: span.start,
            end: span.end,
        });
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A single simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorComponent {
    /// Matches the element tag name.
    Type(String),
    /// `*`
    Universal,
    /// `.classname`
    Class(String),
    /// `#id`
    Id(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: `A B`.
    Descendant,
    /// `A > B`.
    Child,
}

/// A sequence of simple selectors with no combinator between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

/// One element in a selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPart {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

/// A complex selector: compound selectors joined by combinators.
///
/// `ul > li.item` is `[Compound(ul), Combinator(Child), Compound(li.item)]`.
/// Always starts and ends with a `SelectorPart::Compound`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a comma-separated selector list.
pub fn parse_selector_list(input: &str) -> Result<Vec<Selector>, SlotError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SlotError::invalid_selector(input, "empty selector"));
    }
    let mut parser = Parser {
        input,
        tokens,
        cursor: 0,
    };

    let mut selectors = vec![parser.parse_selector()?];
    while parser.peek() == Some(Token::Comma) {
        parser.cursor += 1;
        selectors.push(parser.parse_selector()?);
    }

    if let Some(tok) = parser.tokens.get(parser.cursor) {
        return Err(parser.error(format!("unexpected `{}`", tok.text)));
    }
    Ok(selectors)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<SpannedToken>,
    cursor: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|t| t.token)
    }

    fn error(&self, message: impl Into<String>) -> SlotError {
        SlotError::invalid_selector(self.input, message)
    }

    /// Whether the current token touches the previous one (no whitespace).
    fn is_adjacent(&self) -> bool {
        match (self.cursor.checked_sub(1), self.tokens.get(self.cursor)) {
            (Some(prev), Some(curr)) => curr.start == self.tokens[prev].end,
            _ => false,
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, SlotError> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound()?)];

        loop {
            match self.peek() {
                Some(Token::GreaterThan) => {
                    self.cursor += 1;
                    parts.push(SelectorPart::Combinator(Combinator::Child));
                    parts.push(SelectorPart::Compound(self.parse_compound()?));
                }
                // A selector-starting token that the compound did not absorb
                // was preceded by whitespace.
                Some(Token::Ident | Token::Dot | Token::Hash | Token::Star) => {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound()?));
                }
                _ => break,
            }
        }

        Ok(Selector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SlotError> {
        let mut components = Vec::new();

        match self.peek() {
            Some(Token::Ident) => {
                components.push(SelectorComponent::Type(self.tokens[self.cursor].text.clone()));
                self.cursor += 1;
            }
            Some(Token::Star) => {
                components.push(SelectorComponent::Universal);
                self.cursor += 1;
            }
            Some(Token::Dot | Token::Hash) => components.push(self.parse_qualifier()?),
            _ => return Err(self.error("expected selector part")),
        }

        while self.is_adjacent() && matches!(self.peek(), Some(Token::Dot | Token::Hash)) {
            components.push(self.parse_qualifier()?);
        }

        Ok(CompoundSelector { components })
    }

    /// `.name` or `#name`, with the name immediately after the prefix.
    fn parse_qualifier(&mut self) -> Result<SelectorComponent, SlotError> {
        let prefix = self.peek();
        self.cursor += 1;
        let name = match self.tokens.get(self.cursor) {
            Some(tok) if tok.token == Token::Ident && self.is_adjacent() => tok.text.clone(),
            _ => {
                let what = if prefix == Some(Token::Dot) { "class" } else { "id" };
                return Err(self.error(format!("expected {what} name")));
            }
        };
        self.cursor += 1;
        Ok(if prefix == Some(Token::Dot) {
            SelectorComponent::Class(name)
        } else {
            SelectorComponent::Id(name)
        })
    }
}
