use crate::client::storage::LocalStorage;
use crate::error::PlayauthError;
use crate::oauth::token::TokenRecord;

pub const TOKEN_KEY: &str = "token";

/// The client's persisted [`TokenRecord`].
#[derive(Debug, Clone)]
pub struct TokenCache {
    storage: LocalStorage,
}

impl TokenCache {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// The stored record, or the empty record when nothing usable is stored.
    pub fn load(&self) -> TokenRecord {
        self.storage.get_item(TOKEN_KEY).unwrap_or_default()
    }

    pub fn store(&self, token: &TokenRecord) -> Result<(), PlayauthError> {
        self.storage.set_item(TOKEN_KEY, token)
    }

    pub fn clear(&self) -> Result<(), PlayauthError> {
        self.store(&TokenRecord::default())
    }

    /// Operator overwrite of the access token. Other fields are kept as-is.
    pub fn set_access_token(&self, value: &str) -> Result<TokenRecord, PlayauthError> {
        let mut token = self.load();
        token.access_token = Some(value.to_string());
        self.store(&token)?;
        Ok(token)
    }

    /// Operator overwrite of the refresh token. Other fields are kept as-is.
    pub fn set_refresh_token(&self, value: &str) -> Result<TokenRecord, PlayauthError> {
        let mut token = self.load();
        token.refresh_token = Some(value.to_string());
        self.store(&token)?;
        Ok(token)
    }
}
