//! Value collection for placeholders
//!
//! Every distinct (kind, name) pair found in a template is resolved exactly
//! once, in first-occurrence order, through a caller-supplied [`ValueResolver`].

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::error::MergeError;

use super::scanner::{scan, PlaceholderKind};

/// Number of decimal places integer placeholders are rounded to
pub const NUMBER_PRECISION: i32 = 3;

/// Why a resolver could not produce a value
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    /// The user or caller aborted the operation
    #[error("cancelled")]
    Cancelled,

    /// The value could not be obtained
    #[error("{0}")]
    Failed(String),
}

/// Source of placeholder values
///
/// Implementations may block (interactive prompt, network lookup). Returning
/// an error aborts the whole fill with no partial output.
pub trait ValueResolver {
    /// Resolve a `{{name}}` placeholder
    fn resolve_text(&mut self, name: &str) -> Result<String, ResolveError>;

    /// Resolve a `"{i{name}}"` placeholder
    fn resolve_number(&mut self, name: &str) -> Result<f64, ResolveError>;
}

/// Resolved values, keyed by kind and name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValues {
    text: HashMap<String, String>,
    numbers: HashMap<String, f64>,
}

impl ResolvedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a string placeholder
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(name.into(), value.into());
        self
    }

    /// Set the value of an integer placeholder
    pub fn with_number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.numbers.insert(name.into(), value);
        self
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(|s| s.as_str())
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.numbers.get(name).copied()
    }

    /// Total number of resolved (kind, name) pairs
    pub fn len(&self) -> usize {
        self.text.len() + self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Round a number to [`NUMBER_PRECISION`] decimal places
pub fn round_number(value: f64) -> f64 {
    let factor = 10f64.powi(NUMBER_PRECISION);
    let scaled = value * factor;
    // Magnitudes this large carry no fraction to round away
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Resolve every distinct placeholder in `text`
pub fn collect(
    text: &str,
    resolver: &mut dyn ValueResolver,
) -> Result<ResolvedValues, MergeError> {
    let mut seen: HashSet<(PlaceholderKind, &str)> = HashSet::new();
    let mut values = ResolvedValues::new();

    for placeholder in scan(text) {
        if !seen.insert((placeholder.kind, placeholder.name)) {
            continue;
        }
        let name = placeholder.name;
        let aborted = |source: ResolveError| MergeError::ResolutionAborted {
            kind: placeholder.kind,
            name: name.to_string(),
            source,
        };

        match placeholder.kind {
            PlaceholderKind::String => {
                let value = resolver.resolve_text(name).map_err(aborted)?;
                debug!(name, "resolved string placeholder");
                values.text.insert(name.to_string(), value);
            }
            PlaceholderKind::Integer => {
                let raw = resolver.resolve_number(name).map_err(aborted)?;
                let value = round_number(raw);
                if !value.is_finite() {
                    return Err(MergeError::InvalidValue {
                        name: name.to_string(),
                        reason: format!("{raw} is not a finite number within range"),
                    });
                }
                debug!(name, value, "resolved integer placeholder");
                values.numbers.insert(name.to_string(), value);
            }
        }
    }

    Ok(values)
}

/// Resolver backed by preset values, with an optional fallback for the rest
pub struct MapResolver {
    text: HashMap<String, String>,
    numbers: HashMap<String, f64>,
    fallback: Option<Box<dyn ValueResolver>>,
}

impl Default for MapResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MapResolver {
    pub fn new() -> Self {
        Self {
            text: HashMap::new(),
            numbers: HashMap::new(),
            fallback: None,
        }
    }

    /// Preset a string value
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(name.into(), value.into());
        self
    }

    /// Preset a numeric value
    pub fn with_number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.numbers.insert(name.into(), value);
        self
    }

    /// Preset a value from raw text, as given on the command line
    ///
    /// The raw text is always usable for string placeholders; it is also
    /// registered for integer placeholders when it parses as a number.
    pub fn with_raw(mut self, name: impl Into<String>, raw: &str) -> Self {
        let name = name.into();
        if let Ok(number) = raw.trim().parse::<f64>() {
            self.numbers.insert(name.clone(), number);
        }
        self.text.insert(name, raw.to_string());
        self
    }

    /// Ask another resolver for names that have no preset value
    pub fn with_fallback(mut self, fallback: Box<dyn ValueResolver>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl ValueResolver for MapResolver {
    fn resolve_text(&mut self, name: &str) -> Result<String, ResolveError> {
        if let Some(value) = self.text.get(name) {
            return Ok(value.clone());
        }
        match self.fallback.as_mut() {
            Some(fallback) => fallback.resolve_text(name),
            None => Err(ResolveError::Failed(format!("no value given for '{name}'"))),
        }
    }

    fn resolve_number(&mut self, name: &str) -> Result<f64, ResolveError> {
        if let Some(value) = self.numbers.get(name) {
            return Ok(*value);
        }
        match self.fallback.as_mut() {
            Some(fallback) => fallback.resolve_number(name),
            None => Err(ResolveError::Failed(format!(
                "no numeric value given for '{name}'"
            ))),
        }
    }
}
