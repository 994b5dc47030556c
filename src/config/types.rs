use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::PlayauthError;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_PROVIDER_URL: &str = "https://accounts.spotify.com/";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1/";

/// Server-side settings as stored on disk.
///
/// Keys other than the three credential fields are kept verbatim so that
/// whatever the UI stores survives a round trip through the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    pub fn default_redirect_uri(port: u16) -> String {
        format!("http://localhost:{port}/")
    }

    /// Fill an empty redirect URI with the local default. Returns whether
    /// anything changed.
    pub fn backfill_redirect_uri(&mut self, port: u16) -> bool {
        if self.redirect_uri.is_empty() {
            self.redirect_uri = Self::default_redirect_uri(port);
            true
        } else {
            false
        }
    }

    /// Shallow-merge a JSON object into these settings: top-level keys in
    /// `patch` replace the stored ones, everything else is kept.
    pub fn merged(&self, patch: serde_json::Value) -> Result<Settings, PlayauthError> {
        let serde_json::Value::Object(patch) = patch else {
            return Err(PlayauthError::InvalidInput(
                "settings body must be a JSON object".to_string(),
            ));
        };
        let mut base = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        base.extend(patch);
        serde_json::from_value(serde_json::Value::Object(base))
            .map_err(|e| PlayauthError::InvalidInput(format!("invalid settings: {e}")))
    }

    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Provider endpoints derived from one accounts host.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize_url: Url,
    pub token_url: Url,
}

impl ProviderEndpoints {
    pub fn from_base(base: &str) -> Result<Self, PlayauthError> {
        let mut base = Url::parse(base)
            .map_err(|e| PlayauthError::InvalidInput(format!("invalid provider URL '{base}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |segment: &str| {
            base.join(segment)
                .map_err(|e| PlayauthError::InvalidInput(format!("invalid provider URL: {e}")))
        };
        Ok(Self {
            authorize_url: join("authorize")?,
            token_url: join("api/token")?,
        })
    }
}
