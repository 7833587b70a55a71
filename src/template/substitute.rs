//! Textual placeholder substitution
//!
//! Substitution runs on the serialized template before it is parsed, since the
//! placeholders only make sense as text inside string literals.

use serde_json::Value;

use crate::error::MergeError;

use super::collector::{collect, ResolvedValues, ValueResolver};
use super::scanner::{scan, PlaceholderKind};

/// Replace every resolved placeholder in `text`
///
/// String placeholders receive their value JSON-escaped, without quotes, as
/// they already sit inside a string literal. Integer placeholders are replaced
/// together with their quotes by the bare number. Placeholders without a value
/// are copied through untouched.
pub fn substitute(text: &str, values: &ResolvedValues) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for placeholder in scan(text) {
        let replacement = match placeholder.kind {
            PlaceholderKind::String => values.text(placeholder.name).map(escape_json_fragment),
            PlaceholderKind::Integer => values.number(placeholder.name).map(format_number),
        };
        if let Some(replacement) = replacement {
            out.push_str(&text[cursor..placeholder.span.start]);
            out.push_str(&replacement);
            cursor = placeholder.span.end;
        }
    }

    out.push_str(&text[cursor..]);
    out
}

/// Resolve and substitute in one step
pub fn fill(text: &str, resolver: &mut dyn ValueResolver) -> Result<String, MergeError> {
    let values = collect(text, resolver)?;
    Ok(substitute(text, &values))
}

/// Escape a string for use inside an existing JSON string literal
fn escape_json_fragment(value: &str) -> String {
    let quoted = Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Shortest decimal rendering of a number; integral values get no fraction
pub fn format_number(value: f64) -> String {
    format!("{value}")
}
