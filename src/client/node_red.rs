//! Node-RED admin API client

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::NodeRedConfig;

use super::{check_status, http_client, join_url, ClientResult};

/// Client for the `/flow/:id` endpoints of the Node-RED admin API
#[derive(Debug, Clone)]
pub struct NodeRedClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl NodeRedClient {
    pub fn new(config: &NodeRedConfig, timeout_secs: u64) -> ClientResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: config.url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn flow_url(&self, flow_id: &str) -> String {
        join_url(&self.base_url, &format!("flow/{flow_id}"))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetch a flow: `{"id", "label", "nodes": [...], "configs": [...]}`
    pub async fn get_flow(&self, flow_id: &str) -> ClientResult<Value> {
        let url = self.flow_url(flow_id);
        debug!(%url, "fetching flow");
        let request = self.authorize(self.client.get(&url));
        let response = request.send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Replace a flow with `flow`, redeploying it
    pub async fn update_flow(&self, flow_id: &str, flow: &Value) -> ClientResult<()> {
        let url = self.flow_url(flow_id);
        let request = self.authorize(self.client.put(&url)).json(flow);
        check_status(request.send().await?).await?;
        info!(flow = flow_id, "updated flow");
        Ok(())
    }
}
