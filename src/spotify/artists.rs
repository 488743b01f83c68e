use crate::{
    error::Result,
    types::{Artist, Cursor, Page, SearchArtistsResponse},
};

use super::SpotifyClient;

/// Page size of artist search requests (the endpoint maximum).
pub const SEARCH_PAGE_SIZE: u32 = 50;

impl SpotifyClient {
    /// Searches artists by name, one page per call.
    ///
    /// A `None` cursor starts a new search; the returned cursor is the
    /// upstream `next` URL.
    pub async fn search_artists(&self, query: &str, cursor: Option<&Cursor>) -> Result<Page<Artist>> {
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => format!(
                "{uri}/search?q={query}&type=artist&limit={limit}",
                uri = self.api_url(),
                query = urlencoding::encode(&format!("artist:{query}")),
                limit = SEARCH_PAGE_SIZE
            ),
        };

        let res = self.get_json::<SearchArtistsResponse>(&url).await?;

        Ok(Page {
            items: res.artists.items,
            next: res.artists.next.map(Cursor),
        })
    }

    /// Looks up a single artist by id.
    pub async fn get_artist(&self, artist_id: &str) -> Result<Artist> {
        let url = format!("{uri}/artists/{id}", uri = self.api_url(), id = artist_id);
        self.get_json::<Artist>(&url).await
    }
}
