//! Configuration management for discographer.
//!
//! Values come from, in order of priority:
//! 1. Command-line flags (applied by the binary on top of [`PipelineConfig`])
//! 2. Environment variables
//! 3. A `.env` file in the local data directory
//! 4. The defaults below

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Loads environment variables from `discographer/.env` in the local data directory.
///
/// The directory is created if needed so that users find the place the
/// binary reads from. A missing `.env` file is not an error; a file that
/// exists but cannot be parsed is.
///
/// - Linux: `~/.local/share/discographer/.env`
/// - macOS: `~/Library/Application Support/discographer/.env`
/// - Windows: `%LOCALAPPDATA%/discographer/.env`
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if !path.is_file() {
        log::debug!("no .env file at {}", path.display());
        return Ok(());
    }

    dotenv::from_path(&path)
        .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))
}

/// Platform data directory used for `.env` and the cached token.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("discographer");
    path
}

/// Returns the Spotify Web API base URL, `SPOTIFY_API_URL` or the public endpoint.
pub fn spotify_apiurl() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Returns an access token supplied directly through `SPOTIFY_ACCESS_TOKEN`.
pub fn spotify_access_token() -> Option<String> {
    env::var("SPOTIFY_ACCESS_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}

/// Knobs for a single discography run. Every retry and pool parameter is an
/// explicit input; nothing falls back to hidden library defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of album track fetches allowed in flight at once.
    pub worker_pool_size: usize,
    /// Total attempts per remote call, the first one included.
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Upper bound of the random extra wait, as a fraction of the backoff delay.
    pub jitter_ratio: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 5,
            max_attempts: 5,
            base_backoff_ms: 500,
            max_backoff_ms: 30_000,
            jitter_ratio: 0.1,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `DISCOGRAPHER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the
    /// `DISCOGRAPHER_*` keys.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_value(&lookup, "DISCOGRAPHER_WORKERS")? {
            config.worker_pool_size = v;
        }
        if let Some(v) = parse_value(&lookup, "DISCOGRAPHER_MAX_ATTEMPTS")? {
            config.max_attempts = v;
        }
        if let Some(v) = parse_value(&lookup, "DISCOGRAPHER_BASE_BACKOFF_MS")? {
            config.base_backoff_ms = v;
        }
        if let Some(v) = parse_value(&lookup, "DISCOGRAPHER_MAX_BACKOFF_MS")? {
            config.max_backoff_ms = v;
        }
        if let Some(v) = parse_value(&lookup, "DISCOGRAPHER_JITTER")? {
            config.jitter_ratio = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_pool_size == 0 {
            return Err(Error::Config("worker pool size must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config("max attempts must be at least 1".into()));
        }
        if self.base_backoff_ms > self.max_backoff_ms {
            return Err(Error::Config(format!(
                "base backoff ({} ms) exceeds max backoff ({} ms)",
                self.base_backoff_ms, self.max_backoff_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(Error::Config(format!(
                "jitter ratio {} is outside [0, 1]",
                self.jitter_ratio
            )));
        }
        Ok(())
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

fn parse_value<T, L>(lookup: &L, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(None),
    }
}
