//! # Spotify Integration Module
//!
//! Thin client for the parts of the Spotify Web API that discographer needs.
//! The client performs single requests only and classifies every failure
//! into the retry taxonomy of [`Error`]; retrying and pagination live in
//! [`crate::pipeline`].
//!
//! ## Submodules
//!
//! - [`artists`] - artist search and lookup
//! - [`releases`] - album and track listings, the [`Catalog`](crate::catalog::Catalog) implementation
//! - [`playlist`] - playlist creation and batched track insertion
//!
//! ## Failure classification
//!
//! | Response                        | Error                  |
//! |---------------------------------|------------------------|
//! | 429 Too Many Requests           | `RateLimited` (uses `Retry-After`) |
//! | 5xx                             | `Transient`            |
//! | connect / timeout failures      | `Transient`            |
//! | any other non-success status    | `NonRetryable`         |
//! | body that does not deserialize  | `Decode`               |

pub mod artists;
pub mod playlist;
pub mod releases;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config,
    error::{Error, Result},
};

/// Largest album page the artist albums endpoint serves.
pub const MAX_ALBUM_PAGE_SIZE: u32 = 50;
/// Largest track page a listing request may ask for.
pub const MAX_TRACK_PAGE_SIZE: u32 = 100;
/// Most URIs a single playlist insertion accepts.
pub const PLAYLIST_BATCH_SIZE: usize = 100;

/// Authenticated Spotify Web API client.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token: String,
    album_page_size: u32,
    track_page_size: u32,
}

impl SpotifyClient {
    /// Creates a client against `SPOTIFY_API_URL` (or the public endpoint).
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_url(config::spotify_apiurl(), token)
    }

    pub fn with_api_url(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            album_page_size: MAX_ALBUM_PAGE_SIZE,
            track_page_size: 50,
        }
    }

    /// Overrides the page sizes, clamped to what the endpoints accept.
    pub fn with_page_sizes(mut self, albums: u32, tracks: u32) -> Self {
        self.album_page_size = albums.clamp(1, MAX_ALBUM_PAGE_SIZE);
        self.track_page_size = tracks.clamp(1, MAX_TRACK_PAGE_SIZE);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn album_page_size(&self) -> u32 {
        self.album_page_size
    }

    pub(crate) fn track_page_size(&self) -> u32 {
        self.track_page_size
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");
        let request = self.http.get(url).bearer_auth(&self.token);
        self.send(request).await?.json::<T>().await.map_err(Error::from)
    }

    pub(crate) async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        log::debug!("POST {url}");
        let request = self.http.post(url).bearer_auth(&self.token).json(body);
        self.send(request).await?.json::<T>().await.map_err(Error::from)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
            retry_after(&response)
        } else {
            None
        };
        let body = response.text().await.unwrap_or_default();

        Err(Error::from_status(
            status.as_u16(),
            retry_after,
            error_message(status, &body),
        ))
    }
}

/// Reads `Retry-After` as whole seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Spotify wraps errors as `{"error": {"status": 404, "message": "..."}}`.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}
