#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use discographer::{
    catalog::Catalog,
    config::PipelineConfig,
    error::{Error, Result},
    types::{AlbumRecord, Cursor, Page, ReleaseType, TrackRecord},
};

/// A failure the fake hands out instead of a page.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    RateLimited(Option<Duration>),
    NonRetryable,
}

impl Failure {
    fn to_error(self) -> Error {
        match self {
            Failure::Transient => Error::transient(Some(503), "service unavailable"),
            Failure::RateLimited(retry_after) => Error::RateLimited { retry_after },
            Failure::NonRetryable => Error::non_retryable(Some(404), "not found"),
        }
    }
}

/// In-memory catalog with scripted failures and request instrumentation.
pub struct FakeCatalog {
    albums: Vec<AlbumRecord>,
    tracks: HashMap<String, Vec<TrackRecord>>,
    album_page_size: usize,
    track_page_size: usize,
    latency: Duration,

    album_failures: Mutex<VecDeque<Failure>>,
    album_listing_broken: Option<Failure>,
    track_failures: Mutex<HashMap<String, VecDeque<Failure>>>,
    broken_albums: HashMap<String, Failure>,

    album_requests: AtomicU32,
    track_requests: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            albums: Vec::new(),
            tracks: HashMap::new(),
            album_page_size: 50,
            track_page_size: 100,
            latency: Duration::ZERO,
            album_failures: Mutex::new(VecDeque::new()),
            album_listing_broken: None,
            track_failures: Mutex::new(HashMap::new()),
            broken_albums: HashMap::new(),
            album_requests: AtomicU32::new(0),
            track_requests: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Adds an album-type release with `track_count` tracks.
    pub fn with_album(self, id: &str, date: &str, track_count: u32) -> Self {
        self.with_release(id, &format!("Album {id}"), date, ReleaseType::Album, track_count)
    }

    pub fn with_release(
        mut self,
        id: &str,
        name: &str,
        date: &str,
        release_type: ReleaseType,
        track_count: u32,
    ) -> Self {
        self.albums.push(AlbumRecord {
            id: id.to_string(),
            name: name.to_string(),
            release_date: date.parse().unwrap(),
            release_type,
        });
        self.tracks.insert(id.to_string(), tracks_for(id, track_count));
        self
    }

    pub fn with_page_sizes(mut self, albums: usize, tracks: usize) -> Self {
        self.album_page_size = albums;
        self.track_page_size = tracks;
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next album listing calls fail with these, in order.
    pub fn failing_album_listing(self, failures: &[Failure]) -> Self {
        self.album_failures.lock().unwrap().extend(failures);
        self
    }

    /// Every album listing call fails.
    pub fn broken_album_listing(mut self, failure: Failure) -> Self {
        self.album_listing_broken = Some(failure);
        self
    }

    /// The next track listing calls for `album_id` fail with these, in order.
    pub fn failing_tracks(self, album_id: &str, failures: &[Failure]) -> Self {
        self.track_failures
            .lock()
            .unwrap()
            .entry(album_id.to_string())
            .or_default()
            .extend(failures);
        self
    }

    /// Every track listing call for `album_id` fails.
    pub fn broken_tracks(mut self, album_id: &str, failure: Failure) -> Self {
        self.broken_albums.insert(album_id.to_string(), failure);
        self
    }

    pub fn album_requests(&self) -> u32 {
        self.album_requests.load(Ordering::SeqCst)
    }

    pub fn track_requests(&self, album_id: &str) -> u32 {
        self.track_requests
            .lock()
            .unwrap()
            .get(album_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_track_requests(&self) -> u32 {
        self.track_requests.lock().unwrap().values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_call(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn page<T: Clone>(items: &[T], cursor: Option<&Cursor>, page_size: usize) -> Page<T> {
    let offset: usize = cursor.map(|c| c.as_str().parse().unwrap()).unwrap_or(0);
    let end = (offset + page_size).min(items.len());
    let next = (end < items.len()).then(|| Cursor(end.to_string()));
    Page {
        items: items[offset..end].to_vec(),
        next,
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn list_albums(&self, _artist_id: &str, cursor: Option<&Cursor>) -> Result<Page<AlbumRecord>> {
        self.album_requests.fetch_add(1, Ordering::SeqCst);
        self.simulate_call().await;

        if let Some(failure) = self.album_listing_broken {
            return Err(failure.to_error());
        }
        if let Some(failure) = self.album_failures.lock().unwrap().pop_front() {
            return Err(failure.to_error());
        }

        Ok(page(&self.albums, cursor, self.album_page_size))
    }

    async fn list_tracks(&self, album_id: &str, cursor: Option<&Cursor>) -> Result<Page<TrackRecord>> {
        *self
            .track_requests
            .lock()
            .unwrap()
            .entry(album_id.to_string())
            .or_default() += 1;
        self.simulate_call().await;

        if let Some(failure) = self.broken_albums.get(album_id) {
            return Err(failure.to_error());
        }
        let scripted = self
            .track_failures
            .lock()
            .unwrap()
            .get_mut(album_id)
            .and_then(|queue| queue.pop_front());
        if let Some(failure) = scripted {
            return Err(failure.to_error());
        }

        let tracks = self
            .tracks
            .get(album_id)
            .ok_or_else(|| Error::non_retryable(Some(404), format!("unknown album {album_id}")))?;
        Ok(page(tracks, cursor, self.track_page_size))
    }
}

pub fn tracks_for(album_id: &str, count: u32) -> Vec<TrackRecord> {
    (1..=count)
        .map(|position| TrackRecord {
            uri: format!("spotify:track:{album_id}-{position}"),
            name: format!("{album_id} track {position}"),
            position,
        })
        .collect()
}

/// Fast, jitter-free settings so elapsed times are exact under a paused clock.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        worker_pool_size: 5,
        max_attempts: 3,
        base_backoff_ms: 100,
        max_backoff_ms: 1_000,
        jitter_ratio: 0.0,
    }
}
