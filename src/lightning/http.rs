use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::normalize::node_alias;
use super::source::{AliasLookup, SourceError, TopologyResponse, TopologySource};

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to create HTTP client")
}

#[derive(Serialize)]
struct TopologyRequest<'a> {
    node_ids: &'a [String],
}

pub struct HttpTopologySource {
    http: Client,
    url: String,
}

impl HttpTopologySource {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TopologySource for HttpTopologySource {
    async fn query(&self, node_ids: &[String]) -> Result<TopologyResponse, SourceError> {
        let service = "topology";
        let response = self
            .http
            .post(&self.url)
            .json(&TopologyRequest { node_ids })
            .send()
            .await
            .map_err(|error| SourceError::Transport {
                service: service.to_owned(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                service: service.to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .json::<TopologyResponse>()
            .await
            .map_err(|error| SourceError::Decode {
                service: service.to_owned(),
                message: error.to_string(),
            })
    }
}

/// An empty `alias_pointer` falls back to the common alias fields at the root.
pub struct HttpAliasService {
    name: String,
    http: Client,
    url_template: String,
    alias_pointer: String,
}

impl HttpAliasService {
    pub fn new(
        name: impl Into<String>,
        http: Client,
        url_template: impl Into<String>,
        alias_pointer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            http,
            url_template: url_template.into(),
            alias_pointer: alias_pointer.into(),
        }
    }

    fn url_for(&self, node_id: &str) -> String {
        self.url_template.replace("{id}", node_id)
    }

    fn extract_alias(&self, body: &Value) -> Option<String> {
        let alias = if self.alias_pointer.is_empty() {
            node_alias(body)
        } else {
            body.pointer(&self.alias_pointer)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        alias
            .map(|alias| alias.trim().to_owned())
            .filter(|alias| !alias.is_empty())
    }
}

#[async_trait]
impl AliasLookup for HttpAliasService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup_alias(&self, node_id: &str) -> Result<Option<String>, SourceError> {
        let response = self
            .http
            .get(self.url_for(node_id))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| SourceError::Transport {
                service: self.name.clone(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                service: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|error| SourceError::Decode {
                service: self.name.clone(),
                message: error.to_string(),
            })?;

        Ok(self.extract_alias(&body))
    }
}
