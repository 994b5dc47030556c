pub mod store;
pub mod types;

pub use store::SettingsStore;
pub use types::{
    ClientCredentials, ProviderEndpoints, Settings, DEFAULT_API_URL, DEFAULT_PORT,
    DEFAULT_PROVIDER_URL,
};
