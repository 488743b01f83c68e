use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{
    config,
    error::{Error, Result},
    types::Token,
};

/// Seconds before expiry at which a cached token is no longer handed out.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Supplies the bearer token for catalog requests.
///
/// A token given through `SPOTIFY_ACCESS_TOKEN` wins. Otherwise the token
/// cached in `token.json` in the data directory is used as long as it is
/// not about to expire. Obtaining and refreshing tokens is left to the tool
/// that wrote the cache.
pub struct TokenStore {
    token: Token,
}

impl TokenStore {
    pub fn new(token: Token) -> Self {
        TokenStore { token }
    }

    pub async fn load() -> Result<Self> {
        if let Some(access_token) = config::spotify_access_token() {
            log::debug!("using access token from SPOTIFY_ACCESS_TOKEN");
            return Ok(Self::new(Token {
                access_token,
                refresh_token: String::new(),
                scope: String::new(),
                expires_in: u64::MAX,
                obtained_at: Utc::now().timestamp() as u64,
            }));
        }

        Self::load_from_path(&Self::token_path()).await
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let content = async_fs::read_to_string(path).await.map_err(|e| {
            Error::Credentials(format!(
                "no SPOTIFY_ACCESS_TOKEN set and cannot read {}: {}",
                path.display(),
                e
            ))
        })?;
        let token: Token = serde_json::from_str(&content)
            .map_err(|e| Error::Credentials(format!("invalid token file: {e}")))?;
        Ok(Self { token })
    }

    /// Returns the access token, refusing one that is expired or about to be.
    pub fn access_token(&self) -> Result<&str> {
        if self.is_expired() {
            return Err(Error::Credentials(
                "cached access token has expired, obtain a fresh one".into(),
            ));
        }
        Ok(&self.token.access_token)
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        let expires_at = self
            .token
            .obtained_at
            .saturating_add(self.token.expires_in);
        now.saturating_add(EXPIRY_MARGIN_SECS) >= expires_at
    }

    fn token_path() -> PathBuf {
        config::data_dir().join("token.json")
    }
}
