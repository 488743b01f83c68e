use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    pipeline::RetryExecutor,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, CurrentUserResponse,
    },
};

use super::{PLAYLIST_BATCH_SIZE, SpotifyClient};

/// The playlist endpoints [`publish`] drives.
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// Returns the id of the user the token belongs to.
    async fn current_user_id(&self) -> Result<String>;

    /// Creates an empty public playlist owned by `user_id`.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<CreatePlaylistResponse>;

    /// Appends up to [`PLAYLIST_BATCH_SIZE`] tracks to a playlist.
    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<AddTrackToPlaylistResponse>;
}

#[async_trait]
impl PlaylistService for SpotifyClient {
    async fn current_user_id(&self) -> Result<String> {
        let url = format!("{uri}/me", uri = self.api_url());
        let me = self.get_json::<CurrentUserResponse>(&url).await?;
        Ok(me.id)
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<CreatePlaylistResponse> {
        let url = format!(
            "{uri}/users/{user_id}/playlists",
            uri = self.api_url(),
            user_id = user_id
        );
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: true,
            collaborative: false,
        };
        self.post_json(&url, &body).await
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<AddTrackToPlaylistResponse> {
        let url = format!(
            "{uri}/playlists/{playlist_id}/tracks",
            uri = self.api_url(),
            playlist_id = playlist_id
        );
        let body = AddTrackToPlaylistRequest {
            uris: uris.to_vec(),
        };
        self.post_json(&url, &body).await
    }
}

/// Creates a playlist for the current user and fills it with `uris` in order,
/// [`PLAYLIST_BATCH_SIZE`] tracks per request. Every call goes through
/// `retry`. `on_batch` is told how many tracks have been added so far.
pub async fn publish<P, F>(
    service: &P,
    retry: &RetryExecutor,
    cancel: &CancellationToken,
    name: &str,
    description: &str,
    uris: &[String],
    mut on_batch: F,
) -> Result<CreatePlaylistResponse>
where
    P: PlaylistService + ?Sized,
    F: FnMut(usize),
{
    let user_id = retry
        .run(cancel, "current user lookup", || service.current_user_id())
        .await?;

    let playlist = retry
        .run(cancel, "playlist creation", || {
            service.create_playlist(&user_id, name, description)
        })
        .await?;
    log::info!("created playlist '{}' ({})", playlist.name, playlist.id);

    let mut added = 0;
    for batch in uris.chunks(PLAYLIST_BATCH_SIZE) {
        retry
            .run(cancel, "playlist track insertion", || {
                service.add_tracks(&playlist.id, batch)
            })
            .await?;
        added += batch.len();
        on_batch(added);
    }

    Ok(playlist)
}
