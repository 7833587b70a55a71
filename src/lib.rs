//! GrafPAD - Grafana panel and dashboard editing tool
//!
//! This library fills placeholder templates and merges them into Grafana
//! dashboards and Node-RED flows, and provides the thin clients and local
//! template store the `grafpad` binary is built from.
//!
//! # Example
//!
//! ```rust
//! use grafpad::{MapResolver, Merger};
//! use serde_json::json;
//!
//! let dashboard = json!({
//!     "panels": [{"id": 1, "gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}}]
//! });
//! let template = r#"{"title": "{{TITLE}}", "gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}}"#;
//! let mut values = MapResolver::new().with_text("TITLE", "Boiler");
//!
//! let merged = Merger::new().merge_panel(&dashboard, template, &mut values).unwrap();
//! assert_eq!(merged.document["panels"][1]["gridPos"]["x"], 6);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod layout;
pub mod merge;
pub mod prompt;
pub mod store;
pub mod template;

pub use config::{Config, ConfigError};
pub use error::MergeError;
pub use identity::{IdGenerator, RemapReport, SequentialIds, UuidGenerator};
pub use layout::LayoutConfig;
pub use merge::{FlowMerge, Merger, PanelMerge};
pub use prompt::PromptResolver;
pub use store::{Store, StoreError};
pub use template::{
    fill, scan, substitute, MapResolver, PlaceholderKind, ResolveError, ResolvedValues,
    ValueResolver,
};
