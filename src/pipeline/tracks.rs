use std::{collections::BTreeSet, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    types::{AlbumRecord, Cursor, TrackRecord},
};

use super::{PageFetcher, RetryExecutor};

/// An album whose track listing could not be retrieved.
#[derive(Debug)]
pub struct AlbumFailure {
    pub album_id: String,
    pub album_name: String,
    pub error: Error,
}

/// Per-album results of a [`TrackAggregator`] run.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// One slot per input album, in input order. `None` marks a failed album.
    pub tracks: Vec<Option<Vec<TrackRecord>>>,
    pub failures: Vec<AlbumFailure>,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches the track listings of many albums on a bounded worker pool.
///
/// At most `worker_pool_size` album fetches are in flight at any time. Every
/// page request goes through the [`RetryExecutor`]. An album that still
/// fails after retrying is recorded in [`Aggregation::failures`] and the
/// remaining albums carry on; only cancellation stops the whole run.
pub struct TrackAggregator {
    catalog: Arc<dyn Catalog>,
    retry: RetryExecutor,
    cancel: CancellationToken,
    worker_pool_size: usize,
}

impl TrackAggregator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        retry: RetryExecutor,
        cancel: CancellationToken,
        worker_pool_size: usize,
    ) -> Self {
        Self {
            catalog,
            retry,
            cancel,
            worker_pool_size: worker_pool_size.max(1),
        }
    }

    pub async fn aggregate(&self, albums: &[AlbumRecord]) -> Result<Aggregation> {
        let permits = Arc::new(Semaphore::new(self.worker_pool_size));
        let mut tasks = JoinSet::new();

        for (index, album) in albums.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(Error::Cancelled);
                }
                permit = Arc::clone(&permits).acquire_owned() => permit
                    .map_err(|e| Error::Worker(e.to_string()))?,
            };

            let catalog = Arc::clone(&self.catalog);
            let retry = self.retry.clone();
            let cancel = self.cancel.clone();
            let album_id = album.id.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let result = fetch_album_tracks(catalog.as_ref(), &retry, &cancel, &album_id).await;
                (index, result)
            });
        }

        let mut pending: BTreeSet<usize> = (0..albums.len()).collect();
        let mut slots: Vec<Option<Vec<TrackRecord>>> = vec![None; albums.len()];
        let mut failures: Vec<(usize, Error)> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    // the album is picked up from `pending` below
                    log::error!("track fetch task failed: {e}");
                    continue;
                }
            };
            pending.remove(&index);

            match result {
                Ok(tracks) => slots[index] = Some(tracks),
                Err(Error::Cancelled) => {
                    tasks.abort_all();
                    return Err(Error::Cancelled);
                }
                Err(error) => {
                    let album = &albums[index];
                    log::warn!(
                        "giving up on album '{}' ({}): {}",
                        album.name,
                        album.id,
                        error
                    );
                    failures.push((index, error));
                }
            }
        }

        for index in pending {
            let error = Error::Worker(format!("no result for album {}", albums[index].id));
            failures.push((index, error));
        }

        // arrival order, not completion order
        failures.sort_by_key(|(index, _)| *index);

        Ok(Aggregation {
            tracks: slots,
            failures: failures
                .into_iter()
                .map(|(index, error)| AlbumFailure {
                    album_id: albums[index].id.clone(),
                    album_name: albums[index].name.clone(),
                    error,
                })
                .collect(),
        })
    }
}

/// Walks one album's track listing to the end and orders it by position.
async fn fetch_album_tracks(
    catalog: &dyn Catalog,
    retry: &RetryExecutor,
    cancel: &CancellationToken,
    album_id: &str,
) -> Result<Vec<TrackRecord>> {
    let operation_name = format!("track listing for album {album_id}");
    let operation_name = operation_name.as_str();

    let mut pages = PageFetcher::new(move |cursor: Option<Cursor>| async move {
        retry
            .run(cancel, operation_name, || {
                catalog.list_tracks(album_id, cursor.as_ref())
            })
            .await
    });

    let mut tracks = Vec::new();
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match pages.next_page().await? {
            Some(batch) => tracks.extend(batch),
            None => break,
        }
    }

    tracks.sort_by_key(|track: &TrackRecord| track.position);
    log::debug!(
        "album {} has {} tracks ({} pages)",
        album_id,
        tracks.len(),
        pages.requests_made()
    );

    Ok(tracks)
}
