use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    pipeline::Discography,
    types::{AlbumTableRow, Artist, ArtistTableRow},
};

/// Spinner used by every long-running command.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

pub fn default_playlist_name(artist_name: &str) -> String {
    format!("{artist_name} discography")
}

pub fn playlist_description(discography: &Discography) -> String {
    match (discography.albums.first(), discography.albums.last()) {
        (Some(first), Some(last)) => format!(
            "{} albums in release order, {} to {}.",
            discography.albums.len(),
            first.record.release_date,
            last.record.release_date
        ),
        _ => "No albums.".to_string(),
    }
}

pub fn album_table_rows(discography: &Discography) -> Vec<AlbumTableRow> {
    discography
        .albums
        .iter()
        .map(|album| AlbumTableRow {
            date: album.record.release_date.to_string(),
            name: album.record.name.clone(),
            tracks: album.track_count,
        })
        .collect()
}

/// Table rows for artist search results, keeping upstream relevance order.
pub fn artist_table_rows(artists: Vec<Artist>) -> Vec<ArtistTableRow> {
    artists
        .into_iter()
        .map(|a| ArtistTableRow {
            id: a.id,
            name: a.name,
            genres: a
                .genres
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect()
}
