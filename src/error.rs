use std::path::PathBuf;

use crate::oauth::token::ExchangeError;

#[derive(Debug, thiserror::Error)]
pub enum PlayauthError {
    #[error("Unknown or expired state '{0}'. Start a new authorization.")]
    UnknownState(String),

    #[error("Provider rejected the token exchange with status {status}: {body}")]
    ProviderExchange { status: u16, body: serde_json::Value },

    #[error("API request failed: {0}")]
    UpstreamApi(String),

    #[error("{reason} Authorize at {url}")]
    AuthorizationRequired { reason: String, url: String },

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ExchangeError> for PlayauthError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::UnknownState(state) => PlayauthError::UnknownState(state),
            ExchangeError::Provider { status, body } => {
                PlayauthError::ProviderExchange { status, body }
            }
            ExchangeError::Transport(detail) => PlayauthError::Http(detail),
        }
    }
}

impl PlayauthError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            PlayauthError::UnknownState(_) => "unknown_state",
            PlayauthError::ProviderExchange { .. } => "provider_error",
            PlayauthError::UpstreamApi(_) => "upstream_error",
            PlayauthError::AuthorizationRequired { .. } => "auth_required",
            PlayauthError::ConfigError { .. } => "config_error",
            PlayauthError::Http(_) => "http_error",
            PlayauthError::InvalidInput(_) => "invalid_input",
            PlayauthError::IoError(_) => "io_error",
        }
    }

    /// The provider's own `error` field, when this is a provider rejection.
    pub fn provider_error(&self) -> Option<&str> {
        match self {
            PlayauthError::ProviderExchange { body, .. } => {
                body.get("error").and_then(|v| v.as_str())
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let PlayauthError::ProviderExchange { status, body } = self {
            obj.insert("status".into(), serde_json::Value::from(*status));
            obj.insert("body".into(), body.clone());
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}
