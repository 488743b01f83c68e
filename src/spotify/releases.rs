use async_trait::async_trait;

use crate::{
    catalog::Catalog,
    error::Result,
    types::{Album, AlbumRecord, Cursor, Page, Paging, ReleaseDate, ReleaseType, Track, TrackRecord},
};

use super::SpotifyClient;

#[async_trait]
impl Catalog for SpotifyClient {
    /// Lists album-group releases via `GET /artists/{id}/albums`.
    ///
    /// The upstream `next` URL is used as the cursor, so follow-up pages are
    /// requested exactly as Spotify hands them out.
    async fn list_albums(
        &self,
        artist_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<AlbumRecord>> {
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => format!(
                "{uri}/artists/{id}/albums?include_groups={include_groups}&limit={limit}",
                uri = self.api_url(),
                id = artist_id,
                include_groups = ReleaseType::Album,
                limit = self.album_page_size()
            ),
        };

        let paging = self.get_json::<Paging<Album>>(&url).await?;

        Ok(Page {
            items: paging.items.into_iter().map(album_record).collect(),
            next: paging.next.map(Cursor),
        })
    }

    /// Lists an album's tracks via `GET /albums/{id}/tracks`.
    ///
    /// Positions are derived from the page offset so they stay continuous
    /// across pages and discs.
    async fn list_tracks(
        &self,
        album_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<TrackRecord>> {
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => format!(
                "{uri}/albums/{id}/tracks?limit={limit}&offset=0",
                uri = self.api_url(),
                id = album_id,
                limit = self.track_page_size()
            ),
        };

        let paging = self.get_json::<Paging<Track>>(&url).await?;
        let offset = paging.offset;

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .enumerate()
                .map(|(index, track)| TrackRecord {
                    uri: track.uri,
                    name: track.name,
                    position: offset + index as u32 + 1,
                })
                .collect(),
            next: paging.next.map(Cursor),
        })
    }
}

/// Converts a listing entry, preferring the artist-relative `album_group`
/// over the album's own type.
pub fn album_record(album: Album) -> AlbumRecord {
    let release_date = match ReleaseDate::parse(&album.release_date, album.release_date_precision) {
        Ok(date) => date,
        Err(e) => {
            log::warn!("cannot parse release date for album '{}': {}", album.name, e);
            ReleaseDate::unknown()
        }
    };

    AlbumRecord {
        id: album.id,
        name: album.name,
        release_date,
        release_type: album.album_group.unwrap_or(album.album_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatePrecision;

    fn album(group: Option<ReleaseType>, kind: ReleaseType, date: &str) -> Album {
        Album {
            id: "id".into(),
            name: "name".into(),
            release_date: date.into(),
            release_date_precision: Some(DatePrecision::Day),
            album_type: kind,
            album_group: group,
        }
    }

    #[test]
    fn test_album_group_wins_over_album_type() {
        let record = album_record(album(
            Some(ReleaseType::AppearsOn),
            ReleaseType::Album,
            "2001-02-03",
        ));
        assert_eq!(record.release_type, ReleaseType::AppearsOn);

        let record = album_record(album(None, ReleaseType::Single, "2001-02-03"));
        assert_eq!(record.release_type, ReleaseType::Single);
    }

    #[test]
    fn test_bad_release_date_becomes_unknown() {
        let record = album_record(album(None, ReleaseType::Album, "not a date"));
        assert_eq!(record.release_date, ReleaseDate::unknown());
    }

    #[test]
    fn test_deserializes_listing_payload() {
        let json = r#"{
            "items": [
                {"id": "1", "name": "Debut", "release_date": "1994",
                 "release_date_precision": "year", "album_type": "album", "album_group": "album"},
                {"id": "2", "name": "Remix", "release_date": "1995-03-01",
                 "release_date_precision": "day", "album_type": "single", "album_group": "single"},
                {"id": "3", "name": "Odd", "release_date": "1996-01-01",
                 "release_date_precision": "day", "album_type": "audiobook"}
            ],
            "next": "https://api.spotify.com/v1/artists/x/albums?offset=3&limit=3",
            "offset": 0,
            "total": 7
        }"#;

        let paging: Paging<Album> = serde_json::from_str(json).unwrap();
        let records: Vec<AlbumRecord> = paging.items.into_iter().map(album_record).collect();

        assert_eq!(records[0].release_date, ReleaseDate::year(1994));
        assert_eq!(records[1].release_type, ReleaseType::Single);
        assert_eq!(records[2].release_type, ReleaseType::Other);
        assert!(paging.next.is_some());
    }
}
