use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::SettingsStore;

use super::verification::VerificationStore;

/// The current credential set as held by the client.
///
/// Every field is optional so that the cleared record and operator-edited
/// records are representable.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TokenRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Freshness of a [`TokenRecord`] at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    Expired,
    Valid,
}

impl TokenRecord {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// A record with no expiry is treated as valid.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.access_token().is_none() {
            return TokenState::NoToken;
        }
        match self.expires_at {
            Some(expires) if expires <= now => TokenState::Expired,
            _ => TokenState::Valid,
        }
    }

    /// Keep `previous` as the refresh token when this record came without one.
    pub fn retain_refresh_token(mut self, previous: Option<&str>) -> Self {
        if self.refresh_token().is_none() {
            if let Some(previous) = previous.filter(|t| !t.is_empty()) {
                self.refresh_token = Some(previous.to_string());
            }
        }
        self
    }
}

/// Raw token response from the provider.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Fails when `expires_in` does not fit in a timestamp.
    pub fn into_record(self, received_at: DateTime<Utc>) -> Result<TokenRecord, ExchangeError> {
        let expires_at = match self.expires_in {
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .and_then(|lifetime| received_at.checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        ExchangeError::Transport(format!("invalid expires_in: {secs}"))
                    })?,
            ),
            None => None,
        };
        Ok(TokenRecord {
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token,
            expires_at,
            token_type: self.token_type,
            scope: self.scope,
        })
    }
}

/// Body accepted by `/requestToken`, tagged by `grant_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum ExchangeRequest {
    AuthorizationCode {
        code: String,
        state: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redirect_uri: Option<String>,
    },
    RefreshToken {
        refresh_token: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Unknown or expired state '{0}'")]
    UnknownState(String),

    #[error("Provider returned status {status}: {body}")]
    Provider { status: u16, body: serde_json::Value },

    #[error("Token exchange failed: {0}")]
    Transport(String),
}

impl ExchangeError {
    /// HTTP status to relay to the caller of `/requestToken`.
    pub fn status(&self) -> u16 {
        match self {
            ExchangeError::UnknownState(_) => 400,
            ExchangeError::Provider { status, .. } => *status,
            ExchangeError::Transport(_) => 502,
        }
    }

    /// JSON body to relay. Provider bodies pass through untouched.
    pub fn body(&self) -> serde_json::Value {
        match self {
            ExchangeError::Provider { body, .. } => body.clone(),
            ExchangeError::UnknownState(_) => serde_json::json!({
                "error": "unknown_state",
                "error_description": self.to_string(),
            }),
            ExchangeError::Transport(_) => serde_json::json!({
                "error": "transport_error",
                "error_description": self.to_string(),
            }),
        }
    }
}

/// Server-side half of the exchange. The only holder of the client secret.
pub struct TokenGateway {
    http: reqwest::Client,
    token_url: Url,
    settings: Arc<SettingsStore>,
    verifications: Arc<VerificationStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGateway")
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

impl TokenGateway {
    pub fn new(
        token_url: Url,
        settings: Arc<SettingsStore>,
        verifications: Arc<VerificationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url,
            settings,
            verifications,
            clock,
        }
    }

    pub async fn exchange(&self, request: &ExchangeRequest) -> Result<TokenRecord, ExchangeError> {
        let credentials = self.settings.credentials();

        let params: Vec<(&str, String)> = match request {
            ExchangeRequest::AuthorizationCode {
                code,
                state,
                redirect_uri,
            } => {
                let entry = self
                    .verifications
                    .consume(state)
                    .ok_or_else(|| ExchangeError::UnknownState(state.clone()))?;
                let redirect_uri = redirect_uri
                    .clone()
                    .unwrap_or_else(|| credentials.redirect_uri.clone());
                vec![
                    ("grant_type", "authorization_code".to_string()),
                    ("code", code.clone()),
                    ("redirect_uri", redirect_uri),
                    ("code_verifier", entry.code_verifier),
                ]
            }
            ExchangeRequest::RefreshToken { refresh_token } => vec![
                ("grant_type", "refresh_token".to_string()),
                ("refresh_token", refresh_token.clone()),
            ],
        };
        let grant_type = params[0].1.clone();

        let resp = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Token request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            tracing::warn!(
                %grant_type,
                status,
                error = body.get("error").and_then(|v| v.as_str()).unwrap_or("unknown"),
                "provider rejected token exchange"
            );
            return Err(ExchangeError::Provider { status, body });
        }

        let token_resp: TokenResponse = resp.json().await.map_err(|e| {
            ExchangeError::Transport(format!("Failed to parse token response: {e}"))
        })?;

        let token = token_resp.into_record(self.clock.now()).map_err(|e| {
            tracing::warn!(%grant_type, "unusable token response: {e}");
            e
        })?;
        tracing::info!(%grant_type, "token exchange succeeded");
        Ok(token)
    }
}
