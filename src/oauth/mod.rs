pub mod authorize;
pub mod cache;
pub mod pkce;
pub mod refresh;
pub mod token;
pub mod verification;

pub use authorize::{build_authorize_url, SCOPES};
pub use cache::TokenCache;
pub use pkce::{derive_challenge, generate_pkce, PkceChallenge};
pub use refresh::{RefreshOutcome, TokenExchanger, TokenManager, TokenResolution};
pub use token::{ExchangeError, ExchangeRequest, TokenGateway, TokenRecord, TokenState};
pub use verification::{VerificationEntry, VerificationStore};
