use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {service} failed: {message}")]
    Transport { service: String, message: String },
    #[error("{service} answered with HTTP {status}")]
    Status { service: String, status: u16 },
    #[error("{service} returned an unreadable payload: {message}")]
    Decode { service: String, message: String },
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TopologyResponse {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default, alias = "edges")]
    pub channels: Vec<Value>,
}

#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn query(&self, node_ids: &[String]) -> Result<TopologyResponse, SourceError>;
}

#[async_trait]
pub trait AliasLookup: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the service answered but knows no alias.
    async fn lookup_alias(&self, node_id: &str) -> Result<Option<String>, SourceError>;
}
