use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;
use tokio_util::sync::CancellationToken;

use crate::{
    config::PipelineConfig,
    error,
    error::Error,
    info,
    pipeline::{self, Discography, Outcome, RetryExecutor, RetryPolicy},
    spotify::{self, SpotifyClient},
    success, utils, warning,
};

use super::{cancel_on_ctrl_c, spotify_client};

/// What the user asked `discographer build` to do.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub artist_id: String,
    /// Playlist name; defaults to "<artist> discography".
    pub playlist_name: Option<String>,
    /// Publish whatever was fetched when some albums failed.
    pub allow_partial: bool,
    /// Print the album order instead of creating a playlist.
    pub dry_run: bool,
}

pub async fn build(request: BuildRequest, config: PipelineConfig) {
    let client = Arc::new(spotify_client().await);
    let cancel = cancel_on_ctrl_c();
    let retry = RetryExecutor::new(RetryPolicy::from(&config));

    let artist = match retry
        .run(&cancel, "artist lookup", || client.get_artist(&request.artist_id))
        .await
    {
        Ok(artist) => artist,
        Err(e) => error!("Cannot find artist {}. Err: {}", request.artist_id, e),
    };

    info!("Collecting album discography of {}", artist.name);
    let pb = utils::spinner(format!("Fetching albums and tracks of {}...", artist.name));
    let result = pipeline::build_discography(client.clone(), &artist.id, &config, &cancel).await;
    pb.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(Error::Cancelled) => error!("Cancelled, nothing was published."),
        Err(e) => error!("Cannot build discography of {}. Err: {}", artist.name, e),
    };

    for failure in outcome.failures() {
        warning!(
            "Album '{}' ({}) failed: {}",
            failure.album_name,
            failure.album_id,
            failure.error
        );
    }

    let discography = accept(outcome, request.allow_partial);

    if discography.is_empty() {
        warning!("No album tracks found for {}", artist.name);
        return;
    }

    success!(
        "{} tracks from {} albums in release order",
        discography.tracks.len(),
        discography.albums.len()
    );

    if request.dry_run {
        println!("{}", Table::new(utils::album_table_rows(&discography)));
        return;
    }

    let name = request
        .playlist_name
        .unwrap_or_else(|| utils::default_playlist_name(&artist.name));
    publish(&client, &retry, &cancel, &name, &discography).await;
}

/// Unwraps the outcome, exiting on partial data unless the user allowed it.
fn accept(outcome: Outcome, allow_partial: bool) -> Discography {
    match outcome {
        Outcome::Complete(discography) => discography,
        Outcome::Partial(partial) if allow_partial => {
            warning!(
                "Continuing without {} of {} albums",
                partial.failures.len(),
                partial.total_albums
            );
            partial.discography
        }
        partial => match partial.into_complete() {
            Ok(discography) => discography,
            Err(e) => error!("{}. Re-run with --allow-partial to publish the rest.", e),
        },
    }
}

async fn publish(
    client: &SpotifyClient,
    retry: &RetryExecutor,
    cancel: &CancellationToken,
    name: &str,
    discography: &Discography,
) {
    let uris = discography.track_uris();
    let description = utils::playlist_description(discography);

    info!("Creating playlist '{}'", name);
    let pb = ProgressBar::new(uris.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.blue} {pos}/{len} tracks") {
        pb.set_style(style);
    }

    let result = spotify::playlist::publish(
        client,
        retry,
        cancel,
        name,
        &description,
        &uris,
        |added| pb.set_position(added as u64),
    )
    .await;
    pb.finish_and_clear();

    match result {
        Ok(playlist) => success!(
            "Playlist '{}' created with {} tracks ({})",
            playlist.name,
            uris.len(),
            playlist.id
        ),
        Err(e) => error!("Cannot publish playlist '{}'. Err: {}", name, e),
    }
}
