pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod oauth;
pub mod server;

pub use client::{ApiClient, EventLog, PlayerSession};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientCredentials, Settings, SettingsStore};
pub use error::PlayauthError;
pub use oauth::{
    ExchangeError, ExchangeRequest, TokenGateway, TokenManager, TokenRecord, TokenState,
    VerificationStore,
};
pub use server::AppState;
