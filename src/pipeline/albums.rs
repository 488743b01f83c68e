use tokio_util::sync::CancellationToken;

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    types::{AlbumRecord, Cursor, ReleaseType},
};

use super::{PageFetcher, RetryExecutor};

/// Gathers every album-type release of an artist.
///
/// Records come back in arrival order; chronological ordering is left to
/// [`assemble`](super::assemble). Upstream duplicates such as regional or
/// deluxe reissues are kept. Any error that survives retrying aborts the
/// collection, there is no partial album list.
pub struct AlbumCollector<'a> {
    catalog: &'a dyn Catalog,
    retry: &'a RetryExecutor,
    cancel: &'a CancellationToken,
}

impl<'a> AlbumCollector<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        retry: &'a RetryExecutor,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            catalog,
            retry,
            cancel,
        }
    }

    pub async fn collect(&self, artist_id: &str) -> Result<Vec<AlbumRecord>> {
        let catalog = self.catalog;
        let retry = self.retry;
        let cancel = self.cancel;
        let operation_name = format!("album listing for artist {artist_id}");
        let operation_name = operation_name.as_str();

        let mut pages = PageFetcher::new(move |cursor: Option<Cursor>| async move {
            retry
                .run(cancel, operation_name, || {
                    catalog.list_albums(artist_id, cursor.as_ref())
                })
                .await
        });

        let mut albums = Vec::new();
        let mut skipped = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let Some(batch) = pages.next_page().await? else {
                break;
            };

            for album in batch {
                if album.release_type == ReleaseType::Album {
                    albums.push(album);
                } else {
                    log::debug!(
                        "skipping '{}' ({}) for artist {}",
                        album.name,
                        album.release_type,
                        artist_id
                    );
                    skipped += 1;
                }
            }
        }

        log::info!(
            "collected {} albums for artist {} in {} pages ({} other releases skipped)",
            albums.len(),
            artist_id,
            pages.requests_made(),
            skipped
        );

        Ok(albums)
    }
}
