use async_trait::async_trait;

use crate::{
    error::Result,
    types::{AlbumRecord, Cursor, Page, TrackRecord},
};

/// Remote catalog consumed by the aggregation pipeline.
///
/// Implementations translate transport failures into the retry taxonomy of
/// [`Error`](crate::error::Error): `Transient`, `RateLimited` or
/// `NonRetryable`. A `None` cursor asks for the first page.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Lists an artist's releases. Implementations should ask the upstream
    /// for album-type releases only, but the pipeline filters again.
    async fn list_albums(&self, artist_id: &str, cursor: Option<&Cursor>)
    -> Result<Page<AlbumRecord>>;

    /// Lists the tracks of one album in catalog order.
    async fn list_tracks(&self, album_id: &str, cursor: Option<&Cursor>)
    -> Result<Page<TrackRecord>>;
}
