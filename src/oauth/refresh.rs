use std::sync::Arc;

use async_trait::async_trait;

use crate::clock::Clock;
use crate::error::PlayauthError;

use super::cache::TokenCache;
use super::token::{ExchangeError, ExchangeRequest, TokenGateway, TokenRecord, TokenState};

pub const REVOKED_MESSAGE: &str = "Token has been revoked. Use newToken to create a new token.";
pub const NO_TOKEN_MESSAGE: &str = "No token. Use newToken to create a new token.";

/// Anything that can turn an [`ExchangeRequest`] into a fresh token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn request_token(&self, request: &ExchangeRequest) -> Result<TokenRecord, ExchangeError>;
}

#[async_trait]
impl TokenExchanger for TokenGateway {
    async fn request_token(&self, request: &ExchangeRequest) -> Result<TokenRecord, ExchangeError> {
        self.exchange(request).await
    }
}

/// What to do with an outgoing authenticated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenResolution {
    /// Send the call with this bearer token.
    Bearer(String),
    /// Nothing stored; the user has to visit `url`.
    AuthorizationRequired { url: String },
    /// The provider revoked the refresh token and the record was cleared.
    Revoked,
    /// Expired with no usable refresh token.
    NoToken,
}

impl TokenResolution {
    pub fn into_bearer(self, authorize_url: &str) -> Result<String, PlayauthError> {
        let reason = match self {
            TokenResolution::Bearer(token) => return Ok(token),
            TokenResolution::AuthorizationRequired { .. } => "No token.",
            TokenResolution::Revoked => "Token has been revoked.",
            TokenResolution::NoToken => "No token.",
        };
        Err(PlayauthError::AuthorizationRequired {
            reason: reason.to_string(),
            url: authorize_url.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(TokenRecord),
    Revoked,
    NoToken,
}

impl RefreshOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed(_) => "Token refreshed.",
            RefreshOutcome::Revoked => REVOKED_MESSAGE,
            RefreshOutcome::NoToken => NO_TOKEN_MESSAGE,
        }
    }
}

/// Client-side freshness decision in front of every authenticated call.
///
/// Nothing is shared between concurrent callers: two calls that both find the
/// token expired will both refresh it.
pub struct TokenManager {
    cache: TokenCache,
    exchanger: Arc<dyn TokenExchanger>,
    clock: Arc<dyn Clock>,
    authorize_url: String,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("cache", &self.cache)
            .field("authorize_url", &self.authorize_url)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(
        cache: TokenCache,
        exchanger: Arc<dyn TokenExchanger>,
        clock: Arc<dyn Clock>,
        authorize_url: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            exchanger,
            clock,
            authorize_url: authorize_url.into(),
        }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    pub fn state(&self) -> TokenState {
        self.cache.load().state_at(self.clock.now())
    }

    /// Decide how the next call gets its token, refreshing first if needed.
    pub async fn resolve(&self) -> Result<TokenResolution, PlayauthError> {
        let token = self.cache.load();
        match token.state_at(self.clock.now()) {
            TokenState::NoToken => Ok(TokenResolution::AuthorizationRequired {
                url: self.authorize_url.clone(),
            }),
            TokenState::Valid => Ok(token
                .access_token()
                .map(|t| TokenResolution::Bearer(t.to_string()))
                .unwrap_or(TokenResolution::NoToken)),
            TokenState::Expired => {
                tracing::debug!("cached token expired, refreshing");
                Ok(match self.refresh().await? {
                    RefreshOutcome::Refreshed(token) => token
                        .access_token()
                        .map(|t| TokenResolution::Bearer(t.to_string()))
                        .unwrap_or(TokenResolution::NoToken),
                    RefreshOutcome::Revoked => TokenResolution::Revoked,
                    RefreshOutcome::NoToken => TokenResolution::NoToken,
                })
            }
        }
    }

    /// Bearer token for the next call, or an error telling the user to
    /// authorize again.
    pub async fn bearer(&self) -> Result<String, PlayauthError> {
        self.resolve().await?.into_bearer(&self.authorize_url)
    }

    /// Exchange the stored refresh token, whatever the current expiry.
    ///
    /// `invalid_grant` clears the record; `invalid_request` leaves it alone.
    /// Any other failure is returned as-is.
    pub async fn refresh(&self) -> Result<RefreshOutcome, PlayauthError> {
        let current = self.cache.load();
        let Some(refresh_token) = current.refresh_token() else {
            return Ok(RefreshOutcome::NoToken);
        };

        let request = ExchangeRequest::RefreshToken {
            refresh_token: refresh_token.to_string(),
        };
        match self.exchanger.request_token(&request).await {
            Ok(token) => {
                let token = token.retain_refresh_token(Some(refresh_token));
                self.cache.store(&token)?;
                tracing::info!("token refreshed");
                Ok(RefreshOutcome::Refreshed(token))
            }
            Err(ExchangeError::Provider { status: 400, body })
                if provider_error(&body) == Some("invalid_grant") =>
            {
                self.cache.clear()?;
                tracing::warn!("refresh token revoked, cleared stored token");
                Ok(RefreshOutcome::Revoked)
            }
            Err(ExchangeError::Provider { status: 400, body })
                if provider_error(&body) == Some("invalid_request") =>
            {
                Ok(RefreshOutcome::NoToken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Redeem an authorization code and store the resulting token.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, PlayauthError> {
        let request = ExchangeRequest::AuthorizationCode {
            code: code.to_string(),
            state: state.to_string(),
            redirect_uri: Some(redirect_uri.to_string()),
        };
        let token = self.exchanger.request_token(&request).await?;
        self.cache.store(&token)?;
        tracing::info!("new token stored");
        Ok(token)
    }
}

fn provider_error(body: &serde_json::Value) -> Option<&str> {
    body.get("error").and_then(|v| v.as_str())
}
