//! Grafana dashboard API client

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::GrafanaConfig;

use super::{check_status, http_client, join_url, ClientError, ClientResult};

/// Grafana HTTP API client
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    client: Client,
    base_url: String,
    api_key: String,
    folder_id: i64,
}

impl GrafanaClient {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &GrafanaConfig, timeout_secs: u64) -> ClientResult<Self> {
        if config.api_key.is_empty() {
            return Err(ClientError::MissingCredentials { service: "Grafana" });
        }
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            folder_id: config.folder_id,
        })
    }

    /// URL of a dashboard by UID
    pub fn dashboard_url(&self, uid: &str) -> String {
        join_url(&self.base_url, &format!("api/dashboards/uid/{uid}"))
    }

    /// Fetch a dashboard by UID
    ///
    /// Returns the full response, `{"dashboard": {...}, "meta": {...}}`.
    pub async fn get_dashboard(&self, uid: &str) -> ClientResult<Value> {
        let url = self.dashboard_url(uid);
        debug!(%url, "fetching dashboard");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Create or overwrite a dashboard
    pub async fn save_dashboard(&self, dashboard: &Value) -> ClientResult<Value> {
        let url = join_url(&self.base_url, "api/dashboards/db");
        let body = save_payload(dashboard, self.folder_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let result: Value = check_status(response).await?.json().await?;
        let (uid, version) = saved_version(&result);
        info!(uid, version, "saved dashboard");
        Ok(result)
    }
}

/// Body of a dashboard save request
pub fn save_payload(dashboard: &Value, folder_id: i64) -> Value {
    json!({
        "dashboard": dashboard,
        "folderId": folder_id,
        "overwrite": true,
    })
}

/// Uid and version from a dashboard save response
pub fn saved_version(result: &Value) -> (&str, i64) {
    let uid = result.get("uid").and_then(Value::as_str).unwrap_or("");
    let version = result.get("version").and_then(Value::as_i64).unwrap_or(0);
    (uid, version)
}

/// Pull the dashboard object out of a `GET /api/dashboards/uid/:uid` response
pub fn dashboard_from_response(response: &Value) -> ClientResult<&Value> {
    response
        .get("dashboard")
        .filter(|d| d.is_object())
        .ok_or_else(|| ClientError::Unexpected("response has no dashboard object".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> GrafanaConfig {
        GrafanaConfig {
            url: "http://tatooine.local:3000/".to_string(),
            api_key: api_key.to_string(),
            folder_id: 7,
        }
    }

    #[test]
    fn test_requires_api_key() {
        let err = GrafanaClient::new(&config(""), 5).unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials { .. }));
    }

    #[test]
    fn test_dashboard_url() {
        let client = GrafanaClient::new(&config("key"), 5).unwrap();
        assert_eq!(
            client.dashboard_url("ctM1hTWRz"),
            "http://tatooine.local:3000/api/dashboards/uid/ctM1hTWRz"
        );
    }

    #[test]
    fn test_save_payload() {
        let dashboard = json!({"uid": "abc", "panels": []});
        assert_eq!(
            save_payload(&dashboard, 3),
            json!({"dashboard": {"uid": "abc", "panels": []}, "folderId": 3, "overwrite": true})
        );
    }

    #[test]
    fn test_saved_version() {
        let result = json!({"id": 12, "uid": "ctM1hTWRz", "status": "success", "version": 4});
        assert_eq!(saved_version(&result), ("ctM1hTWRz", 4));
        assert_eq!(saved_version(&json!({})), ("", 0));
    }

    #[test]
    fn test_dashboard_from_response() {
        let response = json!({"dashboard": {"uid": "abc"}, "meta": {}});
        assert_eq!(dashboard_from_response(&response).unwrap()["uid"], "abc");
        assert!(dashboard_from_response(&json!({"message": "not found"})).is_err());
    }
}
