//! Connection and store configuration
//!
//! Settings come from a TOML file (`grafpad.toml` by default) with environment
//! variables layered on top. A missing file means defaults; a broken one is an
//! error.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::layout::LayoutConfig;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "grafpad.toml";

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Grafana connection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrafanaConfig {
    /// Base URL, e.g. `http://localhost:3000`
    pub url: String,
    /// API key sent as a bearer token
    pub api_key: String,
    /// Folder new and updated dashboards are saved into
    pub folder_id: i64,
}

impl Default for GrafanaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            api_key: String::new(),
            folder_id: 0,
        }
    }
}

/// Node-RED admin API settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeRedConfig {
    pub url: String,
    /// Admin API access token, if adminAuth is enabled
    pub token: Option<String>,
}

impl Default for NodeRedConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:1880".to_string(),
            token: None,
        }
    }
}

/// Prometheus settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    pub url: String,
    /// Path of the `prometheus.yml` scrape targets are added to
    pub config_path: PathBuf,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9090".to_string(),
            config_path: PathBuf::from("prometheus.yml"),
        }
    }
}

/// Local template store location
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory holding `templates/` and `temp/`
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("store"),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grafana: GrafanaConfig,
    pub node_red: NodeRedConfig,
    pub prometheus: PrometheusConfig,
    pub store: StoreConfig,
    pub layout: LayoutConfig,
    pub http: HttpConfig,
}

/// Template written by `grafpad init`
pub const DEFAULT_CONFIG_TOML: &str = r#"# GrafPAD configuration
# GRAFPAD_* environment variables override these values.

[grafana]
url = "http://localhost:3000"
api_key = ""
folder_id = 0

[node_red]
url = "http://localhost:1880"

[prometheus]
url = "http://localhost:9090"
config_path = "prometheus.yml"

[store]
root = "store"

[layout]
grid_columns = 24
node_offset = 100.0

[http]
timeout_secs = 30
"#;

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load the file if it exists, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment variables
    ///
    /// `API_KEY` is accepted for `.env` files written by older releases;
    /// `GRAFPAD_GRAFANA_API_KEY` wins when both are set.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = var(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.grafana.url, "GRAFPAD_GRAFANA_URL");
        set(&mut self.grafana.api_key, "API_KEY");
        set(&mut self.grafana.api_key, "GRAFPAD_GRAFANA_API_KEY");
        set(&mut self.node_red.url, "GRAFPAD_NODE_RED_URL");
        set(&mut self.prometheus.url, "GRAFPAD_PROMETHEUS_URL");

        if let Some(token) = var("GRAFPAD_NODE_RED_TOKEN").filter(|v| !v.is_empty()) {
            self.node_red.token = Some(token);
        }
    }

    /// Render the effective configuration with secrets masked
    pub fn describe(&self) -> String {
        format!(
            "grafana.url = {}\ngrafana.api_key = {}\ngrafana.folder_id = {}\n\
             node_red.url = {}\nnode_red.token = {}\n\
             prometheus.url = {}\nprometheus.config_path = {}\n\
             store.root = {}\n\
             layout.grid_columns = {}\nlayout.node_offset = {}\n\
             http.timeout_secs = {}",
            self.grafana.url,
            mask(&self.grafana.api_key),
            self.grafana.folder_id,
            self.node_red.url,
            self.node_red.token.as_deref().map(mask).unwrap_or_else(|| "<unset>".to_string()),
            self.prometheus.url,
            self.prometheus.config_path.display(),
            self.store.root.display(),
            self.layout.grid_columns,
            self.layout.node_offset,
            self.http.timeout_secs,
        )
    }
}

/// Mask a secret, keeping the first four characters
fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}
