pub mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::clock::{Clock, SystemClock};
use crate::config::{ProviderEndpoints, SettingsStore};
use crate::error::PlayauthError;
use crate::oauth::{TokenGateway, VerificationStore};

pub use routes::router;

/// Everything the handlers share. Only the server side ever sees the client
/// secret.
#[derive(Debug)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub verifications: Arc<VerificationStore>,
    pub gateway: TokenGateway,
    pub endpoints: ProviderEndpoints,
}

impl AppState {
    pub fn new(
        settings: Arc<SettingsStore>,
        endpoints: ProviderEndpoints,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verifications = Arc::new(VerificationStore::new(clock.clone()));
        let gateway = TokenGateway::new(
            endpoints.token_url.clone(),
            settings.clone(),
            verifications.clone(),
            clock,
        );
        Self {
            settings,
            verifications,
            gateway,
            endpoints,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub settings_path: PathBuf,
    pub provider_url: String,
}

/// Load settings, bind, and serve until the process is stopped.
pub async fn run(options: ServeOptions) -> Result<(), PlayauthError> {
    let settings = Arc::new(SettingsStore::load_or_init(
        &options.settings_path,
        options.port,
    )?);
    let endpoints = ProviderEndpoints::from_base(&options.provider_url)?;
    let redirect_uri = settings.get().redirect_uri;
    let state = Arc::new(AppState::new(settings, endpoints, Arc::new(SystemClock)));

    let listener = TcpListener::bind((options.host.as_str(), options.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, settings = %options.settings_path.display(), "harness server listening");
    println!("Open {redirect_uri}");

    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), PlayauthError> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Serve on an ephemeral loopback port in the background; returns its address.
pub async fn spawn(state: Arc<AppState>) -> Result<SocketAddr, PlayauthError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = serve(listener, state).await {
            tracing::error!("harness server error: {err}");
        }
    });
    Ok(addr)
}
