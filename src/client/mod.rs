//! HTTP clients for the systems templates are provisioned into

pub mod grafana;
pub mod node_red;
pub mod prometheus;

use std::time::Duration;

use reqwest::{Client, Response};
use thiserror::Error;

pub use grafana::GrafanaClient;
pub use node_red::NodeRedClient;
pub use prometheus::{add_scrape_target, PrometheusClient};

/// Errors from remote APIs and the files they are configured through
#[derive(Debug, Error)]
pub enum ClientError {
    /// No credentials configured for a service that needs them
    #[error("{service} API key not set; run `grafpad init` or set it in grafpad.toml")]
    MissingCredentials { service: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// A response or file did not have the expected shape
    #[error("unexpected response: {0}")]
    Unexpected(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Build a reqwest client with the configured timeout
pub(crate) fn http_client(timeout_secs: u64) -> ClientResult<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Turn a non-success response into [`ClientError::Status`]
pub(crate) async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
