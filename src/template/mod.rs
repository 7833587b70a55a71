//! Placeholder handling for template documents
//!
//! Templates are JSON text holding two kinds of placeholder:
//!
//! ```text
//! {
//!     "title": "{{TITLE}}",
//!     "fillOpacity": "{i{FILL_AMOUNT}}"
//! }
//! ```
//!
//! The scanner finds them, the collector asks a [`ValueResolver`] for one value
//! per distinct name, and the substitution step writes the values into the text.

mod collector;
mod scanner;
mod substitute;

pub use collector::{
    collect, round_number, MapResolver, ResolveError, ResolvedValues, ValueResolver,
    NUMBER_PRECISION,
};
pub use scanner::{has_placeholders, scan, Placeholder, PlaceholderKind, Placeholders};
pub use substitute::{fill, format_number, substitute};
