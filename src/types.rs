use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    pub id: String,
    pub name: String,
    pub genres: String,
}

/// Release group tag attached to every album record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Album,
    Single,
    Compilation,
    AppearsOn,
    #[serde(other)]
    Other,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ReleaseType::Album => "album",
            ReleaseType::Single => "single",
            ReleaseType::Compilation => "compilation",
            ReleaseType::AppearsOn => "appears_on",
            ReleaseType::Other => "other",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A release date that may only be known to the year or month.
///
/// Ordering compares year, then month, then day, and a missing component
/// sorts before any present one. A year-only date therefore comes before
/// every dated release of the same year, and a month-only date before every
/// day-dated release of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseDate {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
}

impl ReleaseDate {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self {
            year,
            month: Some(month),
            day: None,
        })
    }

    pub fn day(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(|_| Self {
            year,
            month: Some(month),
            day: Some(day),
        })
    }

    /// Placeholder for dates the catalog sent in an unreadable form.
    pub fn unknown() -> Self {
        Self::year(0)
    }

    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), None) => DatePrecision::Month,
            _ => DatePrecision::Year,
        }
    }

    /// Parses a catalog date string, checking it against the declared precision
    /// when one is given.
    pub fn parse(value: &str, precision: Option<DatePrecision>) -> Result<Self, String> {
        let date: ReleaseDate = value.parse()?;
        match precision {
            Some(p) if p != date.precision() => Err(format!(
                "release date '{value}' does not match precision {p:?}"
            )),
            _ => Ok(date),
        }
    }
}

impl FromStr for ReleaseDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid release date '{s}'");
        let parts: Vec<&str> = s.trim().split('-').collect();

        match parts.as_slice() {
            [year] => year.parse::<i32>().map(Self::year).map_err(|_| invalid()),
            [year, month] => {
                let year = year.parse::<i32>().map_err(|_| invalid())?;
                let month = month.parse::<u32>().map_err(|_| invalid())?;
                Self::month(year, month).ok_or_else(invalid)
            }
            [_, _, _] => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| invalid())
                .and_then(|d| Self::day(d.year(), d.month(), d.day()).ok_or_else(invalid)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(m), Some(d)) => write!(f, "{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => write!(f, "{:04}-{:02}", self.year, m),
            _ => write!(f, "{:04}", self.year),
        }
    }
}

impl Ord for ReleaseDate {
    fn cmp(&self, other: &Self) -> Ordering {
        // None < Some(_) gives the least-precise-first tie-break
        (self.year, self.month, self.day).cmp(&(other.year, other.month, other.day))
    }
}

impl PartialOrd for ReleaseDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRecord {
    pub id: String,
    pub name: String,
    pub release_date: ReleaseDate,
    pub release_type: ReleaseType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub uri: String,
    pub name: String,
    /// 1-based position in the album's catalog listing.
    pub position: u32,
}

/// Opaque continuation token handed out by a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing. `next` is `None` on the last page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    pub date: String,
    pub name: String,
    pub tracks: usize,
}

// Spotify Web API payloads

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: u32,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArtistsResponse {
    pub artists: Paging<Artist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub release_date: String,
    pub release_date_precision: Option<DatePrecision>,
    pub album_type: ReleaseType,
    pub album_group: Option<ReleaseType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: Option<bool>,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}
