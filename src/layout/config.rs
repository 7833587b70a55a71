//! Configuration for position allocation

use serde::Deserialize;

/// Configuration options for placing merged elements
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of columns in the dashboard grid
    pub grid_columns: i64,

    /// Diagonal spacing between inserted flow nodes, in canvas units
    pub node_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_columns: 24,
            node_offset: 100.0,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of grid columns
    pub fn with_grid_columns(mut self, columns: i64) -> Self {
        self.grid_columns = columns;
        self
    }

    /// Set the node offset
    pub fn with_node_offset(mut self, offset: f64) -> Self {
        self.node_offset = offset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.grid_columns, 24);
        assert_eq!(config.node_offset, 100.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_grid_columns(12)
            .with_node_offset(40.0);

        assert_eq!(config.grid_columns, 12);
        assert_eq!(config.node_offset, 40.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LayoutConfig = toml::from_str("node_offset = 60.0").unwrap();
        assert_eq!(config.grid_columns, 24);
        assert_eq!(config.node_offset, 60.0);
    }
}
