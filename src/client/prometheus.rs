//! Prometheus scrape target management
//!
//! Targets are added by editing `prometheus.yml` and asking the server to
//! reload, which needs Prometheus running with `--web.enable-lifecycle`.
//! Comments in the YAML file are not preserved.

use std::path::Path;

use reqwest::Client;
use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::config::PrometheusConfig;

use super::{check_status, http_client, join_url, ClientError, ClientResult};

/// Add `target` to the static targets of scrape job `job`
///
/// The job is created when missing. Returns the new YAML text and whether
/// anything changed; adding a target that is already listed is a no-op.
pub fn add_scrape_target(yaml: &str, job: &str, target: &str) -> ClientResult<(String, bool)> {
    let mut root: Value = if yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(yaml)?
    };
    if root.is_null() {
        root = Value::Mapping(Mapping::new());
    }
    let root_map = root
        .as_mapping_mut()
        .ok_or_else(|| unexpected("prometheus config is not a mapping"))?;

    let scrape_configs = child_sequence(root_map, "scrape_configs")?;
    let existing = scrape_configs
        .iter_mut()
        .find(|cfg| cfg.get("job_name").and_then(Value::as_str) == Some(job));

    let changed = match existing {
        Some(job_config) => {
            let job_map = job_config
                .as_mapping_mut()
                .ok_or_else(|| unexpected("scrape config entry is not a mapping"))?;
            let static_configs = child_sequence(job_map, "static_configs")?;
            if static_configs.is_empty() {
                static_configs.push(Value::Mapping(Mapping::new()));
            }
            let first = static_configs[0]
                .as_mapping_mut()
                .ok_or_else(|| unexpected("static_configs entry is not a mapping"))?;
            let targets = child_sequence(first, "targets")?;
            if targets.iter().any(|t| t.as_str() == Some(target)) {
                false
            } else {
                targets.push(Value::from(target));
                true
            }
        }
        None => {
            scrape_configs.push(new_job(job, target));
            true
        }
    };

    Ok((serde_yaml::to_string(&root)?, changed))
}

/// Apply [`add_scrape_target`] to a config file in place
pub fn add_scrape_target_to_file(path: &Path, job: &str, target: &str) -> ClientResult<bool> {
    let yaml = std::fs::read_to_string(path)?;
    let (updated, changed) = add_scrape_target(&yaml, job, target)?;
    if changed {
        std::fs::write(path, updated)?;
        info!(job, target, path = %path.display(), "added scrape target");
    }
    Ok(changed)
}

fn new_job(job: &str, target: &str) -> Value {
    let mut static_config = Mapping::new();
    static_config.insert(Value::from("targets"), Value::Sequence(vec![Value::from(target)]));

    let mut job_config = Mapping::new();
    job_config.insert(Value::from("job_name"), Value::from(job));
    job_config.insert(
        Value::from("static_configs"),
        Value::Sequence(vec![Value::Mapping(static_config)]),
    );
    Value::Mapping(job_config)
}

/// Get or create the sequence stored under `key`
fn child_sequence<'a>(map: &'a mut Mapping, key: &str) -> ClientResult<&'a mut Vec<Value>> {
    let entry = map
        .entry(Value::from(key))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if entry.is_null() {
        *entry = Value::Sequence(Vec::new());
    }
    entry
        .as_sequence_mut()
        .ok_or_else(|| unexpected(&format!("'{key}' is not a list")))
}

fn unexpected(message: &str) -> ClientError {
    ClientError::Unexpected(message.to_string())
}

/// Client for the Prometheus lifecycle API
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(config: &PrometheusConfig, timeout_secs: u64) -> ClientResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: config.url.clone(),
        })
    }

    /// Ask Prometheus to reload its configuration
    pub async fn reload(&self) -> ClientResult<()> {
        let url = join_url(&self.base_url, "-/reload");
        check_status(self.client.post(&url).send().await?).await?;
        info!(%url, "prometheus reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
global:
  scrape_interval: 15s
scrape_configs:
  - job_name: prometheus
    static_configs:
      - targets: ["localhost:9090"]
"#;

    fn targets(yaml: &str, job: &str) -> Vec<String> {
        let root: Value = serde_yaml::from_str(yaml).unwrap();
        root["scrape_configs"]
            .as_sequence()
            .unwrap()
            .iter()
            .find(|c| c["job_name"].as_str() == Some(job))
            .map(|c| {
                c["static_configs"][0]["targets"]
                    .as_sequence()
                    .unwrap()
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_add_to_existing_job() {
        let (yaml, changed) = add_scrape_target(CONFIG, "prometheus", "10.0.0.5:9090").unwrap();
        assert!(changed);
        assert_eq!(targets(&yaml, "prometheus"), vec!["localhost:9090", "10.0.0.5:9090"]);
        assert!(yaml.contains("scrape_interval"));
    }

    #[test]
    fn test_existing_target_is_noop() {
        let (_, changed) = add_scrape_target(CONFIG, "prometheus", "localhost:9090").unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_creates_missing_job() {
        let (yaml, changed) = add_scrape_target(CONFIG, "node", "pi.local:9100").unwrap();
        assert!(changed);
        assert_eq!(targets(&yaml, "node"), vec!["pi.local:9100"]);
        assert_eq!(targets(&yaml, "prometheus"), vec!["localhost:9090"]);
    }

    #[test]
    fn test_empty_file() {
        let (yaml, changed) = add_scrape_target("", "node", "pi.local:9100").unwrap();
        assert!(changed);
        assert_eq!(targets(&yaml, "node"), vec!["pi.local:9100"]);
    }

    #[test]
    fn test_job_without_static_configs() {
        let yaml = "scrape_configs:\n  - job_name: node\n";
        let (yaml, _) = add_scrape_target(yaml, "node", "a:1").unwrap();
        assert_eq!(targets(&yaml, "node"), vec!["a:1"]);
    }

    #[test]
    fn test_rejects_non_mapping_root() {
        assert!(add_scrape_target("- just\n- a list\n", "node", "a:1").is_err());
    }
}
