use crate::types::{AlbumRecord, TrackRecord};

/// An album placed in the final order, with the number of tracks it contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledAlbum {
    pub record: AlbumRecord,
    pub track_count: usize,
}

/// The chronologically ordered result of a discography run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discography {
    /// Albums whose tracks were fetched, oldest first.
    pub albums: Vec<AssembledAlbum>,
    /// Tracks of `albums`, album by album, each album in listing order.
    pub tracks: Vec<TrackRecord>,
}

impl Discography {
    pub fn track_uris(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.uri.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Orders fetched albums by release date and concatenates their tracks.
///
/// `tracks` holds one slot per album of `albums` (same order, which is the
/// arrival order); `None` slots are albums that failed and are skipped.
/// Albums with equal dates keep their arrival order and tracks are placed
/// by ascending position, so identical input always yields identical output.
pub fn assemble(albums: &[AlbumRecord], tracks: Vec<Option<Vec<TrackRecord>>>) -> Discography {
    let mut fetched: Vec<(&AlbumRecord, Vec<TrackRecord>)> = albums
        .iter()
        .zip(tracks)
        .filter_map(|(album, tracks)| tracks.map(|t| (album, t)))
        .collect();

    // stable sort, ties stay in arrival order
    fetched.sort_by(|(a, _), (b, _)| a.release_date.cmp(&b.release_date));

    let mut discography = Discography {
        albums: Vec::with_capacity(fetched.len()),
        tracks: Vec::with_capacity(fetched.iter().map(|(_, t)| t.len()).sum()),
    };

    for (album, mut album_tracks) in fetched {
        album_tracks.sort_by_key(|t| t.position);
        discography.albums.push(AssembledAlbum {
            record: album.clone(),
            track_count: album_tracks.len(),
        });
        discography.tracks.extend(album_tracks);
    }

    discography
}
