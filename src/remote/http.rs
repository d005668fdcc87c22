//! HTTP registry client
//!
//! Wire protocol, per scope base URL:
//! - `GET  {base}/tools/{name}` returns [`ToolMetadata`]; 404 means not found
//! - `POST {base}/tools/{name}/invoke` with `{"arguments": ...}` returns
//!   `{"result": ...}` or `{"error": "..."}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Value, json};

use super::{RemoteClient, RemoteScope, ToolMetadata, TransportError};
use crate::config::RegistryConfig;

/// Registry client speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: Client,
    team_url: Option<Url>,
    community_url: Option<Url>,
}

impl HttpRegistryClient {
    /// Build a client from registry settings. Scopes without a URL fail on use.
    pub fn new(config: &RegistryConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.effective_timeout_ms()))
            .build()?;

        Ok(Self {
            client,
            team_url: config.team_url.as_deref().map(parse_base_url).transpose()?,
            community_url: config.community_url.as_deref().map(parse_base_url).transpose()?,
        })
    }

    fn base_url(&self, scope: RemoteScope) -> Result<&Url, TransportError> {
        let url = match scope {
            RemoteScope::Team => self.team_url.as_ref(),
            RemoteScope::Community => self.community_url.as_ref(),
        };
        url.ok_or(TransportError::Unconfigured { scope })
    }

    fn tool_url(&self, scope: RemoteScope, name: &str, action: Option<&str>) -> Result<Url, TransportError> {
        let base = self.base_url(scope)?;
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| TransportError::InvalidUrl {
                url: base.to_string(),
                reason: "cannot be used as a base URL".to_string(),
            })?;
            segments.pop_if_empty().push("tools").push(name);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RemoteClient for HttpRegistryClient {
    async fn fetch_tool(&self, scope: RemoteScope, name: &str) -> Result<Option<ToolMetadata>, TransportError> {
        let url = self.tool_url(scope, name, None)?;
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ToolMetadata>()
            .await
            .map(Some)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }

    async fn invoke_tool(&self, scope: RemoteScope, name: &str, arguments: Value) -> Result<Value, TransportError> {
        let url = self.tool_url(scope, name, Some("invoke"))?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&json!({ "arguments": arguments }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        parse_invoke_response(body)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_invoke_response(mut body: Value) -> Result<Value, TransportError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(TransportError::Remote { message });
    }
    match body.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(TransportError::InvalidResponse(
            "expected 'result' or 'error' in invoke response".to_string(),
        )),
    }
}
