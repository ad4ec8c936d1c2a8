//! HTTP upstream for a PostgREST-style hosted backend.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{GovernorError, Result};
use crate::upstream::{ResourceRequest, Upstream};

/// Fetches `GET {base}/rest/v1/{resource}?{filters}&limit=&offset=`.
///
/// When an API key is configured it is sent both as `apikey` and as a bearer
/// token. Timeouts and retries are applied by the caller.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpUpstream {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.upstream_url.clone(), config.upstream_api_key.clone())
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, resource)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &ResourceRequest) -> Result<Value> {
        let url = self.endpoint(&request.resource);
        debug!("GET {} ({})", url, request.fingerprint());

        let mut builder = self
            .client
            .get(&url)
            .query(&request.query_pairs())
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GovernorError::Upstream(format!("{}: {}", request.resource, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GovernorError::Upstream(format!(
                "{} returned {}: {}",
                request.resource, status, body
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            GovernorError::Upstream(format!("{}: invalid JSON body: {}", request.resource, e))
        })
    }
}
