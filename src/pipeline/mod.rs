//! # Aggregation pipeline
//!
//! Turns an artist id into the artist's album tracks in release order:
//!
//! ```text
//! artist id
//!   -> AlbumCollector   (PageFetcher + RetryExecutor, sequential)
//!   -> TrackAggregator  (bounded worker pool, PageFetcher + RetryExecutor per album)
//!   -> assemble         (release date order, then track position)
//!   -> Outcome
//! ```
//!
//! Nothing here is global. The catalog client, the configuration and the
//! cancellation token are passed in, and no state survives a run.

mod albums;
mod ordering;
mod pager;
mod retry;
mod tracks;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    catalog::Catalog,
    config::PipelineConfig,
    error::{Error, Result},
};

pub use albums::AlbumCollector;
pub use ordering::{AssembledAlbum, Discography, assemble};
pub use pager::PageFetcher;
pub use retry::{LONG_WAIT_WARNING, RetryExecutor, RetryPolicy};
pub use tracks::{AlbumFailure, Aggregation, TrackAggregator};

/// Result of a discography run.
#[derive(Debug)]
pub enum Outcome {
    /// Every album's tracks were retrieved.
    Complete(Discography),
    /// Some albums failed for good; the rest is usable.
    Partial(PartialResult),
}

#[derive(Debug)]
pub struct PartialResult {
    pub discography: Discography,
    pub failures: Vec<AlbumFailure>,
    /// Number of albums the run tried to fetch.
    pub total_albums: usize,
}

impl PartialResult {
    pub fn failed_album_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.album_id.as_str()).collect()
    }
}

impl Outcome {
    pub fn discography(&self) -> &Discography {
        match self {
            Outcome::Complete(discography) => discography,
            Outcome::Partial(partial) => &partial.discography,
        }
    }

    pub fn failures(&self) -> &[AlbumFailure] {
        match self {
            Outcome::Complete(_) => &[],
            Outcome::Partial(partial) => &partial.failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete(_))
    }

    /// Ordered track URIs, whatever the outcome.
    pub fn track_uris(&self) -> Vec<String> {
        self.discography().track_uris()
    }

    /// Refuses partial data: a partial outcome becomes
    /// [`Error::PartialAggregation`] listing the failed albums.
    pub fn into_complete(self) -> Result<Discography> {
        match self {
            Outcome::Complete(discography) => Ok(discography),
            Outcome::Partial(partial) => Err(Error::PartialAggregation {
                failed_album_ids: partial
                    .failures
                    .iter()
                    .map(|f| f.album_id.clone())
                    .collect(),
                total: partial.total_albums,
            }),
        }
    }
}

/// Builds the ordered track list of an artist's album discography.
///
/// Album listing failures, invalid configuration and cancellation are
/// errors. Albums whose tracks cannot be fetched do not fail the run; they
/// turn the outcome into [`Outcome::Partial`] and are always enumerated
/// there. An artist without albums yields an empty [`Outcome::Complete`].
pub async fn build_discography(
    catalog: Arc<dyn Catalog>,
    artist_id: &str,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    config.validate()?;

    let retry = RetryExecutor::new(RetryPolicy::from(config));

    let albums = AlbumCollector::new(catalog.as_ref(), &retry, cancel)
        .collect(artist_id)
        .await?;

    if albums.is_empty() {
        log::info!("artist {artist_id} has no albums");
        return Ok(Outcome::Complete(Discography::default()));
    }

    let aggregation = TrackAggregator::new(
        Arc::clone(&catalog),
        retry,
        cancel.clone(),
        config.worker_pool_size,
    )
    .aggregate(&albums)
    .await?;

    let complete = aggregation.is_complete();
    let Aggregation { tracks, failures } = aggregation;
    let discography = assemble(&albums, tracks);

    log::info!(
        "assembled {} tracks from {} of {} albums for artist {}",
        discography.tracks.len(),
        discography.albums.len(),
        albums.len(),
        artist_id
    );

    if complete {
        Ok(Outcome::Complete(discography))
    } else {
        Ok(Outcome::Partial(PartialResult {
            discography,
            failures,
            total_albums: albums.len(),
        }))
    }
}
