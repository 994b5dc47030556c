use std::sync::Arc;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::error::PlayauthError;
use crate::oauth::refresh::TokenManager;

/// Status and (JSON, when possible) body of an API response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `message` field the API puts in its error bodies.
    pub fn message(&self) -> Option<&str> {
        let body = self.body.as_ref()?;
        body.get("message")
            .or_else(|| body.get("error").and_then(|e| e.get("message")))
            .and_then(|v| v.as_str())
    }
}

/// Calls the streaming API with a bearer token resolved per call.
///
/// A 401 from the API is handed back like any other status.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenManager>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: Url, tokens: Arc<TokenManager>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub async fn call_api(
        &self,
        path: &str,
        method: Method,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, PlayauthError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| PlayauthError::InvalidInput(format!("invalid API path '{path}': {e}")))?;

        // Resolved before anything is sent; may refresh.
        let token = self.tokens.bearer().await?;

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PlayauthError::UpstreamApi(format!("{method} {url}: {e}")))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| PlayauthError::UpstreamApi(format!("{method} {url}: {e}")))?;
        tracing::debug!(%method, %url, status, "API call finished");

        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
        };
        Ok(ApiResponse { status, body })
    }
}
