//! HTTP client for the capability server

use crate::index::{DiscoveryResponse, ToolIndex};
use crate::{CapabilityError, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// Client for the capability server's discovery and invoke endpoints
#[derive(Debug, Clone)]
pub struct CapabilityClient {
    client: reqwest::Client,
    base_url: String,
}

/// Raw reply from the invoke endpoint
#[derive(Debug, Clone)]
pub struct InvokeReply {
    pub success: bool,
    pub body: String,
}

impl CapabilityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the tool catalog from GET /tools
    pub async fn discover(&self) -> Result<ToolIndex> {
        let url = format!("{}/tools", self.base_url);
        debug!("◆ discovering tools from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CapabilityError::Api(format!(
                "discovery returned {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let catalog: DiscoveryResponse = serde_json::from_str(&text)?;
        let index = ToolIndex::from_discovery(catalog);
        debug!("◆ discovered {} callable tools", index.len());
        Ok(index)
    }

    /// Discovery that never fails the caller: any error yields an empty index
    pub async fn discover_or_empty(&self) -> ToolIndex {
        match self.discover().await {
            Ok(index) => index,
            Err(e) => {
                warn!("◆ tool discovery failed, continuing without tools: {}", e);
                ToolIndex::new()
            }
        }
    }

    /// POST a payload to /invoke, returning status and body without judging it
    pub async fn invoke(&self, payload: &Value) -> Result<InvokeReply> {
        let url = format!("{}/invoke", self.base_url);
        debug!("◆ invoking capability: {}", payload);

        let response = self.client.post(&url).json(payload).send().await?;
        let success = response.status().is_success();
        let body = response.text().await?;
        Ok(InvokeReply { success, body })
    }
}
