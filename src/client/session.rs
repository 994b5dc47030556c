use std::sync::Arc;

use reqwest::{Method, Url};

use crate::error::PlayauthError;
use crate::oauth::refresh::{RefreshOutcome, TokenManager};

use super::api::{ApiClient, ApiResponse};
use super::events::EventLog;
use super::media::MediaUri;
use super::storage::LocalStorage;

pub const AUTO_CONNECT_KEY: &str = "auto_connect";
const INVALID_REDIRECT_URI: &str = "Invalid redirect URI";

/// How a returning authorization redirect was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectResult {
    Success,
    InvalidRedirectUri,
    Failed,
}

/// The user-facing actions of the harness. Every outcome ends up in the
/// session's [`EventLog`]; none of the actions return errors.
#[derive(Debug)]
pub struct PlayerSession {
    api: ApiClient,
    tokens: Arc<TokenManager>,
    storage: LocalStorage,
    events: EventLog,
}

impl PlayerSession {
    pub fn new(tokens: Arc<TokenManager>, api_base: Url, storage: LocalStorage) -> Self {
        Self {
            api: ApiClient::new(api_base, tokens.clone()),
            tokens,
            storage,
            events: EventLog::new(),
        }
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn auto_connect(&self) -> bool {
        self.storage.get_item(AUTO_CONNECT_KEY).unwrap_or(false)
    }

    pub fn set_auto_connect(&self, enabled: bool) -> Result<(), PlayauthError> {
        self.storage.set_item(AUTO_CONNECT_KEY, &enabled)
    }

    /// Read the auto-connect flag once and log how the session starts.
    pub fn start(&self) -> bool {
        self.events.log("Session initialised");
        let auto_connect = self.auto_connect();
        if auto_connect {
            self.events.log("Auto connecting...");
        }
        auto_connect
    }

    /// The URL the user has to open to authorize.
    pub fn new_token(&self) -> String {
        let url = self.tokens.authorize_url().to_string();
        self.events.log(format!("Authorize at {url}"));
        url
    }

    /// Handle the URL the provider redirected the browser to.
    pub async fn complete_authorization(&self, redirected: &Url) -> RedirectResult {
        let mut code = None;
        let mut state = None;
        let mut denied = None;
        for (key, value) in redirected.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => denied = Some(value.into_owned()),
                _ => {}
            }
        }

        let redirect_uri = format!(
            "{}{}",
            redirected.origin().ascii_serialization(),
            redirected.path()
        );

        let Some(code) = code else {
            let reason = denied.unwrap_or_else(|| "no code in redirect".to_string());
            self.events
                .error(format!("ERROR: Authorization failed: {reason}"));
            return RedirectResult::Failed;
        };
        let state = state.unwrap_or_default();

        match self
            .tokens
            .complete_authorization(&code, &state, &redirect_uri)
            .await
        {
            Ok(_) => {
                self.events.log("New token created.");
                RedirectResult::Success
            }
            Err(PlayauthError::ProviderExchange { status: 400, body })
                if body.get("error_description").and_then(|v| v.as_str())
                    == Some(INVALID_REDIRECT_URI) =>
            {
                self.events.error(format!(
                    "ERROR: Redirect URI {redirect_uri} has not been registered."
                ));
                RedirectResult::InvalidRedirectUri
            }
            Err(e) => {
                self.events.error(e.to_json());
                RedirectResult::Failed
            }
        }
    }

    /// Force a refresh regardless of the current expiry.
    pub async fn refresh_token(&self) {
        match self.tokens.refresh().await {
            Ok(outcome @ RefreshOutcome::Refreshed(_)) => {
                self.events.log_labeled("refreshToken", outcome.message());
            }
            Ok(outcome) => self.events.log(outcome.message()),
            Err(e) => self.events.error(e.to_json()),
        }
    }

    pub async fn me(&self) {
        if let Some(resp) = self.call("me", "me", Method::GET, None).await {
            self.events
                .log_labeled("me", resp.body.unwrap_or(serde_json::Value::Null));
        }
    }

    pub async fn player_state(&self) {
        let Some(resp) = self.call("playerState", "me/player", Method::GET, None).await else {
            return;
        };
        if resp.status == 204 {
            self.events
                .log_labeled("playerState", "Nothing playing right now");
        } else {
            self.events
                .log_labeled("playerState", resp.body.unwrap_or(serde_json::Value::Null));
        }
    }

    /// Move playback to `device_id`.
    pub async fn transfer(&self, device_id: Option<&str>) {
        let Some(device_id) = device_id.filter(|d| !d.is_empty()) else {
            self.events.log("No Device ID: Try connect first");
            return;
        };
        let body = serde_json::json!({ "device_ids": [device_id] });
        let Some(resp) = self.call("transfer", "me/player", Method::PUT, Some(&body)).await else {
            return;
        };
        if resp.status == 404 && resp.message() == Some("Device not found") {
            self.events.log("Device not found: Try connect first");
        }
        self.log_response("transfer", &resp);
    }

    /// Start playing a share link or `spotify:<kind>:<id>` URI.
    pub async fn play(&self, input: &str) {
        let media = match MediaUri::parse(input) {
            Ok(media) => media,
            Err(e) => {
                self.events.error(e.to_json());
                return;
            }
        };
        let body = media.play_body();
        if let Some(resp) = self
            .call("play", "me/player/play", Method::PUT, Some(&body))
            .await
        {
            self.log_response("play", &resp);
        }
    }

    pub fn set_access_token(&self, value: &str) {
        match self.tokens.cache().set_access_token(value) {
            Ok(_) => self.events.log("Access token updated."),
            Err(e) => self.events.error(e.to_json()),
        }
    }

    pub fn set_refresh_token(&self, value: &str) {
        match self.tokens.cache().set_refresh_token(value) {
            Ok(_) => self.events.log("Refresh token updated."),
            Err(e) => self.events.error(e.to_json()),
        }
    }

    async fn call(
        &self,
        label: &str,
        path: &str,
        method: Method,
        body: Option<&serde_json::Value>,
    ) -> Option<ApiResponse> {
        match self.api.call_api(path, method, body).await {
            Ok(resp) => Some(resp),
            Err(PlayauthError::AuthorizationRequired { reason, url }) => {
                self.events
                    .log_labeled(label, format!("{reason} Use newToken to create a new token: {url}"));
                None
            }
            Err(e) => {
                self.events.error(e.to_json());
                None
            }
        }
    }

    fn log_response(&self, label: &str, resp: &ApiResponse) {
        let value = serde_json::to_value(resp).unwrap_or(serde_json::Value::Null);
        if resp.is_success() {
            self.events.log_labeled(label, value);
        } else {
            let mut obj = serde_json::Map::new();
            obj.insert(label.to_string(), value);
            self.events.error(serde_json::Value::Object(obj));
        }
    }
}
