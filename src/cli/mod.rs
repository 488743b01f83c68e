//! # CLI Module
//!
//! User-facing commands of the `discographer` binary. Each command builds
//! its collaborators (credentials, Spotify client, retry executor,
//! cancellation token) explicitly and hands them to the library; nothing is
//! kept in globals.
//!
//! - [`build`] - Builds an artist's album discography and publishes it as a playlist
//! - [`search`] - Looks up artist ids by name
//!
//! Failures are reported with the crate's `warning!`/`error!` macros. A run
//! that cannot continue ends the process with status 1.
//!
//! ```bash
//! discographer search "nick cave" --limit 5
//! discographer build --artist-id 4NHQUGzhtTLFvgF5SZesLK --dry-run
//! discographer build --artist-id 4NHQUGzhtTLFvgF5SZesLK --allow-partial
//! ```

mod build;
mod search;

pub use build::{BuildRequest, build};
pub use search::search;

use tokio_util::sync::CancellationToken;

use crate::{config, error, management::TokenStore, spotify::SpotifyClient};

/// Creates a Spotify client from the configured API url and credentials.
async fn spotify_client() -> SpotifyClient {
    let tokens = match TokenStore::load().await {
        Ok(tokens) => tokens,
        Err(e) => error!(
            "Cannot load credentials. Set SPOTIFY_ACCESS_TOKEN or provide a token.json in {}\n Error: {}",
            config::data_dir().display(),
            e
        ),
    };

    match tokens.access_token() {
        Ok(token) => SpotifyClient::with_api_url(config::spotify_apiurl(), token),
        Err(e) => error!("Cannot use cached credentials. Err: {}", e),
    }
}

/// Returns a token that is cancelled when the user presses Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}
