use async_trait::async_trait;
use reqwest::Url;

use crate::error::PlayauthError;
use crate::oauth::refresh::TokenExchanger;
use crate::oauth::token::{ExchangeError, ExchangeRequest, TokenRecord};

/// Exchanges tokens through the harness server's `/requestToken` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteExchanger {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteExchanger {
    pub fn new(server: &Url) -> Result<Self, PlayauthError> {
        let endpoint = server
            .join("requestToken")
            .map_err(|e| PlayauthError::InvalidInput(format!("invalid server URL: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenExchanger for RemoteExchanger {
    async fn request_token(&self, request: &ExchangeRequest) -> Result<TokenRecord, ExchangeError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("{}: {e}", self.endpoint)))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let body: serde_json::Value =
                serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            if let ExchangeRequest::AuthorizationCode { state, .. } = request {
                if body.get("error").and_then(|v| v.as_str()) == Some("unknown_state") {
                    return Err(ExchangeError::UnknownState(state.clone()));
                }
            }
            return Err(ExchangeError::Provider { status, body });
        }

        resp.json::<TokenRecord>()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Failed to parse token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_relative_to_server() {
        let server = Url::parse("http://localhost:8888/").unwrap();
        let exchanger = RemoteExchanger::new(&server).unwrap();
        assert_eq!(
            exchanger.endpoint().as_str(),
            "http://localhost:8888/requestToken"
        );
    }
}
