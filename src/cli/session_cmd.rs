use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Url;

use crate::client::{LocalStorage, PlayerSession, RemoteExchanger};
use crate::clock::SystemClock;
use crate::error::PlayauthError;
use crate::oauth::{TokenCache, TokenManager};

use super::output::{print_error, print_events, print_token, OutputMode};

/// Where the client finds the harness server, the API and its own state.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub server: String,
    pub api_url: String,
    pub state_dir: Option<PathBuf>,
    pub json: bool,
}

impl ClientOptions {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }
}

/// A client-side action to run against a fresh session.
#[derive(Debug, Clone)]
pub enum SessionAction {
    Login { open_browser: bool },
    Callback { url: String },
    Refresh,
    Me,
    PlayerState,
    Transfer { device_id: Option<String> },
    Play { input: String },
    Status,
    ShowToken,
    SetAccessToken { value: String },
    SetRefreshToken { value: String },
    ClearToken,
    AutoConnect { enabled: Option<bool> },
}

fn parse_url(raw: &str, what: &str) -> Result<Url, PlayauthError> {
    let mut url =
        Url::parse(raw).map_err(|e| PlayauthError::InvalidInput(format!("invalid {what} '{raw}': {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub fn build_session(options: &ClientOptions) -> Result<PlayerSession, PlayauthError> {
    let server = parse_url(&options.server, "server URL")?;
    let api_base = parse_url(&options.api_url, "API URL")?;
    let storage = LocalStorage::new(
        options
            .state_dir
            .clone()
            .unwrap_or_else(LocalStorage::default_dir),
    );
    let authorize_url = server
        .join("authorizeUrl")
        .map_err(|e| PlayauthError::InvalidInput(format!("invalid server URL: {e}")))?;

    let tokens = Arc::new(TokenManager::new(
        TokenCache::new(storage.clone()),
        Arc::new(RemoteExchanger::new(&server)?),
        Arc::new(SystemClock),
        authorize_url.to_string(),
    ));
    Ok(PlayerSession::new(tokens, api_base, storage))
}

/// Run one action and print everything it logged. Returns `Ok(false)` when
/// the action logged or raised a failure; raised errors are printed here.
pub async fn run_session_action(
    options: &ClientOptions,
    action: SessionAction,
) -> Result<bool, PlayauthError> {
    match execute(options, action).await {
        Ok(ok) => Ok(ok),
        Err(e) => {
            print_error(&e, options.json);
            Ok(false)
        }
    }
}

async fn execute(options: &ClientOptions, action: SessionAction) -> Result<bool, PlayauthError> {
    let session = build_session(options)?;
    let mode = options.output_mode();
    let is_tty = std::io::stdout().is_terminal();

    match action {
        SessionAction::Login { open_browser } => {
            let url = session.new_token();
            if open_browser && webbrowser::open(&url).is_err() {
                tracing::warn!("Could not open browser automatically. Please visit:\n{url}");
            }
        }
        SessionAction::Callback { url } => {
            let url = Url::parse(&url)
                .map_err(|e| PlayauthError::InvalidInput(format!("invalid redirect URL: {e}")))?;
            session.complete_authorization(&url).await;
        }
        SessionAction::Refresh => session.refresh_token().await,
        SessionAction::Me => session.me().await,
        SessionAction::PlayerState => session.player_state().await,
        SessionAction::Transfer { device_id } => session.transfer(device_id.as_deref()).await,
        SessionAction::Play { input } => session.play(&input).await,
        SessionAction::Status => {
            session.start();
            let tokens = session.tokens();
            print_token(&tokens.cache().load(), tokens.state(), mode, is_tty);
        }
        SessionAction::ShowToken => {
            let tokens = session.tokens();
            print_token(&tokens.cache().load(), tokens.state(), mode, is_tty);
        }
        SessionAction::SetAccessToken { value } => session.set_access_token(&value),
        SessionAction::SetRefreshToken { value } => session.set_refresh_token(&value),
        SessionAction::ClearToken => {
            session.tokens().cache().clear()?;
            session.events().log("Token cleared.");
        }
        SessionAction::AutoConnect { enabled } => {
            if let Some(enabled) = enabled {
                session.set_auto_connect(enabled)?;
            }
            session
                .events()
                .log(format!("Auto connect: {}", session.auto_connect()));
        }
    }

    print_events(&session.events().entries(), mode, is_tty);
    Ok(!session.events().has_errors())
}
