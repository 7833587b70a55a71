//! Placeholder scanner for serialized template documents using logos
//!
//! Two grammars are recognised:
//!
//! - `{{name}}` a string placeholder, sitting inside a JSON string literal
//! - `"{i{name}}"` an integer placeholder, quotes included, so the template
//!   stays valid JSON until the number is written in
//!
//! Names are one or more ASCII word characters. The lexer uses longest-match,
//! so the `{{name}}` inside an integer placeholder is never reported twice.

use std::fmt;

use logos::Logos;

use crate::error::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
enum Token<'a> {
    #[regex(r#""\{i\{[A-Za-z0-9_]+\}\}""#, |lex| { let s = lex.slice(); &s[4..s.len() - 3] })]
    Integer(&'a str),

    #[regex(r"\{\{[A-Za-z0-9_]+\}\}", |lex| { let s = lex.slice(); &s[2..s.len() - 2] })]
    String(&'a str),

    // Everything else. Single `{` and `"` are split out so a placeholder
    // starting on them can still win the longest match.
    #[regex(r#"[^{"]+"#)]
    #[token("{")]
    #[token("\"")]
    Text,
}

/// Kind of value a placeholder stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// `{{name}}`, replaced by string content
    String,
    /// `"{i{name}}"`, replaced by a bare JSON number
    Integer,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderKind::String => write!(f, "string"),
            PlaceholderKind::Integer => write!(f, "integer"),
        }
    }
}

/// A single placeholder occurrence in the scanned text
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder<'a> {
    pub kind: PlaceholderKind,
    /// Bare name, delimiters stripped
    pub name: &'a str,
    /// Span of the whole delimiter sequence (quotes included for integers)
    pub span: Span,
}

impl Placeholder<'_> {
    /// Render the delimiter sequence this placeholder was scanned from
    pub fn token(&self) -> String {
        match self.kind {
            PlaceholderKind::String => format!("{{{{{}}}}}", self.name),
            PlaceholderKind::Integer => format!("\"{{i{{{}}}}}\"", self.name),
        }
    }
}

/// Lazy iterator over placeholder occurrences, in document order
///
/// A clone continues from the same position. Call [`scan`] again to start over.
#[derive(Clone)]
pub struct Placeholders<'a> {
    lexer: logos::Lexer<'a, Token<'a>>,
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let token = self.lexer.next()?;
            let span = self.lexer.span();
            match token {
                Ok(Token::Integer(name)) => {
                    return Some(Placeholder {
                        kind: PlaceholderKind::Integer,
                        name,
                        span,
                    })
                }
                Ok(Token::String(name)) => {
                    return Some(Placeholder {
                        kind: PlaceholderKind::String,
                        name,
                        span,
                    })
                }
                Ok(Token::Text) | Err(()) => continue,
            }
        }
    }
}

/// Scan serialized text for placeholders
pub fn scan(text: &str) -> Placeholders<'_> {
    Placeholders {
        lexer: Token::lexer(text),
    }
}

/// Check whether the text still holds any placeholder
pub fn has_placeholders(text: &str) -> bool {
    scan(text).next().is_some()
}
