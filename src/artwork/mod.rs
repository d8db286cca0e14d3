//! Artwork retrieval for recognized race weekends
//!
//! Posters, thumbnails and fanart are looked up on TheSportsDB by year and
//! round, then written next to the video files where media libraries pick them
//! up. Everything here is best effort: failures are logged and reported as
//! [`ArtworkOutcome::NotFound`], never propagated to the scan.
mod cached;
mod download;
mod sportsdb;
mod sportsdb_types;

pub(crate) use cached::CachedEventsProvider;
pub use download::HttpImageDownloader;
pub use sportsdb::SportsDbProvider;

use crate::cache::CacheStorage;
use crate::config::ArtworkConfig;
use crate::resolver::EventLookup;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const USER_AGENT: &str = concat!("formula1_scanner/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching artwork
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// Building the HTTP client failed
    #[error("Failed to set up HTTP client: {0}")]
    ClientError(String),

    /// Request to the events API failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the events API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Failed to download an image
    #[error("Failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Failed to write an image to disk
    #[error("Failed to write artwork file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Kind of artwork to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtType {
    /// Season poster, `poster.jpg` in the video's folder
    Poster,
    /// Per-file thumbnail, `<video name>.jpg`
    Thumbnail,
    /// Background art, `fanart.jpg` in the video's folder
    Fanart,
}

impl ArtType {
    /// Name of the event field holding this kind of image
    pub fn field_name(&self) -> &'static str {
        match self {
            ArtType::Poster => "strPoster",
            ArtType::Thumbnail | ArtType::Fanart => "strThumb",
        }
    }
}

/// A single event of a race weekend, as far as artwork is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportsEvent {
    /// Event name, e.g. "Abu Dhabi Grand Prix Qualifying"
    pub name: String,
    pub poster: Option<String>,
    pub thumb: Option<String>,
}

impl SportsEvent {
    /// Returns the image URL for the given art type, ignoring empty values
    pub fn art(&self, art_type: ArtType) -> Option<&str> {
        let value = match art_type {
            ArtType::Poster => self.poster.as_deref(),
            ArtType::Thumbnail | ArtType::Fanart => self.thumb.as_deref(),
        };
        value.filter(|url| !url.trim().is_empty())
    }
}

/// Source of the events that make up a round
pub trait EventsProvider {
    /// Fetches all events of the given round of a season
    fn events_for_round(&self, year: u32, round: u32) -> Result<Vec<SportsEvent>, ArtworkError>;
}

/// Writes remote images to local files
pub trait ImageDownloader {
    /// Downloads `url` to `target`, returning the number of bytes written
    fn download(&self, url: &str, target: &Path) -> Result<u64, ArtworkError>;
}

/// A single artwork file that should exist
#[derive(Debug, Clone)]
pub struct ArtworkRequest<'a> {
    /// Where the image should be written
    pub target: PathBuf,
    pub art_type: ArtType,
    pub lookup: &'a EventLookup,
    /// Write a placeholder when no real artwork can be found
    pub allow_placeholder: bool,
}

/// What [`ArtworkFetcher::ensure_artwork`] did for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkOutcome {
    /// The target already existed, nothing was fetched
    AlreadyPresent,
    /// Artwork of a matching event was downloaded
    Downloaded { url: String },
    /// No event artwork was available, the placeholder was written
    Placeholder { url: String },
    /// Nothing was written
    NotFound,
}

/// Builds the blocking HTTP client shared by the provider and the downloader
pub fn build_http_client(config: &ArtworkConfig) -> Result<reqwest::blocking::Client, ArtworkError> {
    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate validation is disabled for artwork requests");
    }

    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| ArtworkError::ClientError(e.to_string()))
}

/// Picks the image URL for a request from a round's events
///
/// An event whose name ends with the session label wins if it carries the
/// requested image. Otherwise the first event with that image is used.
pub fn select_artwork<'e>(
    events: &'e [SportsEvent],
    art_type: ArtType,
    session_label: &str,
) -> Option<&'e str> {
    let label = session_label.to_lowercase();

    let session_match = events
        .iter()
        .find(|event| event.name.to_lowercase().ends_with(&label))
        .and_then(|event| event.art(art_type));

    session_match.or_else(|| events.iter().find_map(|event| event.art(art_type)))
}

/// Makes sure artwork files exist, fetching them when they do not
pub struct ArtworkFetcher {
    provider: Box<dyn EventsProvider>,
    downloader: Box<dyn ImageDownloader>,
    poster_placeholder_url: String,
    episode_placeholder_url: String,
}

impl ArtworkFetcher {
    pub fn new(
        provider: Box<dyn EventsProvider>,
        downloader: Box<dyn ImageDownloader>,
        config: &ArtworkConfig,
    ) -> Self {
        Self {
            provider,
            downloader,
            poster_placeholder_url: config.poster_placeholder_url.clone(),
            episode_placeholder_url: config.episode_placeholder_url.clone(),
        }
    }

    /// Creates a fetcher talking to TheSportsDB
    ///
    /// Event listings are cached on disk when the configuration has a cache
    /// TTL. A cache directory that cannot be opened only disables caching.
    pub fn from_config(config: &ArtworkConfig) -> Result<Self, ArtworkError> {
        let client = build_http_client(config)?;
        let sportsdb = SportsDbProvider::new(client.clone(), config);
        let downloader = HttpImageDownloader::new(client);

        let provider: Box<dyn EventsProvider> = match config.cache_ttl {
            Some(ttl) => match CacheStorage::<Vec<SportsEvent>>::open("events", Some(ttl)) {
                Ok(cache) => Box::new(CachedEventsProvider::new(sportsdb, cache)),
                Err(e) => {
                    tracing::warn!("Event cache unavailable, continuing without: {}", e);
                    Box::new(sportsdb)
                }
            },
            None => Box::new(sportsdb),
        };

        Ok(Self::new(provider, Box::new(downloader), config))
    }

    /// Ensures the requested artwork file exists
    ///
    /// Existing files are never touched. Round 0 marks files outside a race
    /// weekend (e.g. testing), for which only the placeholder is considered.
    pub fn ensure_artwork(&self, request: &ArtworkRequest<'_>) -> ArtworkOutcome {
        if request.target.exists() {
            tracing::trace!(path = %request.target.display(), "Artwork already present");
            return ArtworkOutcome::AlreadyPresent;
        }

        let mut allow_placeholder = request.allow_placeholder;
        let lookup = request.lookup;

        if lookup.round == 0 {
            tracing::warn!(
                location = %lookup.location,
                "Found invalid round, file may not be for a race weekend, eg testing"
            );
            allow_placeholder = true;
        } else {
            tracing::debug!(path = %request.target.display(), art_type = request.art_type.field_name(), "Downloading artwork");

            match self.find_artwork_url(request) {
                Ok(Some(url)) => match self.downloader.download(&url, &request.target) {
                    Ok(_) => return ArtworkOutcome::Downloaded { url },
                    Err(e) => tracing::error!("Unable to download artwork: {}", e),
                },
                Ok(None) => {}
                Err(e) => tracing::error!("Unable to look up artwork: {}", e),
            }
        }

        if !allow_placeholder {
            tracing::warn!(
                year = lookup.year,
                round = lookup.round,
                session = %lookup.session_label,
                "Unable to find art for event"
            );
            return ArtworkOutcome::NotFound;
        }

        let url = match request.art_type {
            ArtType::Poster => &self.poster_placeholder_url,
            ArtType::Thumbnail | ArtType::Fanart => &self.episode_placeholder_url,
        };
        match self.downloader.download(url, &request.target) {
            Ok(_) => ArtworkOutcome::Placeholder { url: url.clone() },
            Err(e) => {
                tracing::error!("Unable to write placeholder artwork: {}", e);
                ArtworkOutcome::NotFound
            }
        }
    }

    fn find_artwork_url(&self, request: &ArtworkRequest<'_>) -> Result<Option<String>, ArtworkError> {
        let lookup = request.lookup;
        let events = self.provider.events_for_round(lookup.year, lookup.round)?;

        Ok(select_artwork(&events, request.art_type, &lookup.session_label).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::rc::Rc;

    struct FakeProvider {
        events: Vec<SportsEvent>,
        calls: Rc<Cell<usize>>,
        fail: bool,
    }

    impl EventsProvider for FakeProvider {
        fn events_for_round(&self, _year: u32, _round: u32) -> Result<Vec<SportsEvent>, ArtworkError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ArtworkError::RequestError("connection refused".to_string()));
            }
            Ok(self.events.clone())
        }
    }

    /// Writes the URL itself as the file content
    struct FakeDownloader {
        downloads: Rc<RefCell<Vec<String>>>,
    }

    impl ImageDownloader for FakeDownloader {
        fn download(&self, url: &str, target: &Path) -> Result<u64, ArtworkError> {
            self.downloads.borrow_mut().push(url.to_string());
            fs::write(target, url).map_err(|e| ArtworkError::WriteFailed {
                path: target.to_path_buf(),
                source: e,
            })?;
            Ok(url.len() as u64)
        }
    }

    struct Harness {
        fetcher: ArtworkFetcher,
        calls: Rc<Cell<usize>>,
        downloads: Rc<RefCell<Vec<String>>>,
    }

    fn harness(events: Vec<SportsEvent>, fail: bool) -> Harness {
        let calls = Rc::new(Cell::new(0));
        let downloads = Rc::new(RefCell::new(Vec::new()));
        let fetcher = ArtworkFetcher::new(
            Box::new(FakeProvider {
                events,
                calls: calls.clone(),
                fail,
            }),
            Box::new(FakeDownloader {
                downloads: downloads.clone(),
            }),
            &ArtworkConfig::default(),
        );
        Harness {
            fetcher,
            calls,
            downloads,
        }
    }

    fn event(name: &str, poster: Option<&str>, thumb: Option<&str>) -> SportsEvent {
        SportsEvent {
            name: name.to_string(),
            poster: poster.map(str::to_string),
            thumb: thumb.map(str::to_string),
        }
    }

    fn weekend() -> Vec<SportsEvent> {
        vec![
            event("Monaco Grand Prix Practice 1", None, Some("https://img/fp1.jpg")),
            event("Monaco Grand Prix Qualifying", Some("https://img/q-poster.jpg"), Some("https://img/q.jpg")),
            event("Monaco Grand Prix", Some("https://img/race-poster.jpg"), Some("https://img/race.jpg")),
        ]
    }

    fn lookup(round: u32, session_label: &str) -> EventLookup {
        EventLookup {
            year: 2024,
            round,
            session_label: session_label.to_string(),
            location: "Monaco".to_string(),
        }
    }

    #[test]
    fn test_select_artwork_prefers_session() {
        let events = weekend();
        assert_eq!(
            select_artwork(&events, ArtType::Thumbnail, "Qualifying"),
            Some("https://img/q.jpg")
        );
        assert_eq!(
            select_artwork(&events, ArtType::Poster, "grand prix"),
            Some("https://img/race-poster.jpg")
        );
    }

    #[test]
    fn test_select_artwork_falls_back_to_any_event() {
        let events = weekend();
        // session matched but has no poster
        assert_eq!(
            select_artwork(&events, ArtType::Poster, "Practice 1"),
            Some("https://img/q-poster.jpg")
        );
        // no session matched
        assert_eq!(
            select_artwork(&events, ArtType::Thumbnail, "Drivers Press Conference"),
            Some("https://img/fp1.jpg")
        );
        assert_eq!(select_artwork(&[], ArtType::Poster, "Grand Prix"), None);
    }

    #[test]
    fn test_empty_art_values_are_ignored() {
        let events = vec![
            event("Monaco Grand Prix", Some(""), None),
            event("Monaco Grand Prix Qualifying", Some("https://img/q-poster.jpg"), None),
        ];
        assert_eq!(
            select_artwork(&events, ArtType::Poster, "Grand Prix"),
            Some("https://img/q-poster.jpg")
        );
    }

    #[test]
    fn test_downloads_matching_event_art() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(weekend(), false);
        let key = lookup(8, "Qualifying");
        let request = ArtworkRequest {
            target: dir.path().join("poster.jpg"),
            art_type: ArtType::Poster,
            lookup: &key,
            allow_placeholder: false,
        };

        assert_eq!(
            h.fetcher.ensure_artwork(&request),
            ArtworkOutcome::Downloaded {
                url: "https://img/q-poster.jpg".to_string()
            }
        );
        assert_eq!(fs::read_to_string(&request.target).unwrap(), "https://img/q-poster.jpg");
    }

    #[test]
    fn test_existing_target_is_not_fetched_again() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(weekend(), false);
        let key = lookup(8, "Grand Prix");
        let request = ArtworkRequest {
            target: dir.path().join("fanart.jpg"),
            art_type: ArtType::Fanart,
            lookup: &key,
            allow_placeholder: false,
        };

        assert!(matches!(
            h.fetcher.ensure_artwork(&request),
            ArtworkOutcome::Downloaded { .. }
        ));
        assert_eq!(h.fetcher.ensure_artwork(&request), ArtworkOutcome::AlreadyPresent);
        assert_eq!(h.calls.get(), 1);
        assert_eq!(h.downloads.borrow().len(), 1);
    }

    #[test]
    fn test_round_zero_forces_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(weekend(), false);
        let key = lookup(0, "Grand Prix");
        let request = ArtworkRequest {
            target: dir.path().join("poster.jpg"),
            art_type: ArtType::Poster,
            lookup: &key,
            allow_placeholder: false,
        };

        assert_eq!(
            h.fetcher.ensure_artwork(&request),
            ArtworkOutcome::Placeholder {
                url: crate::config::DEFAULT_POSTER_PLACEHOLDER_URL.to_string()
            }
        );
        assert_eq!(h.calls.get(), 0);
    }

    #[test]
    fn test_request_failure_uses_placeholder_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Vec::new(), true);
        let key = lookup(3, "Grand Prix");
        let request = ArtworkRequest {
            target: dir.path().join("02.Race.Session.jpg"),
            art_type: ArtType::Thumbnail,
            lookup: &key,
            allow_placeholder: true,
        };

        assert_eq!(
            h.fetcher.ensure_artwork(&request),
            ArtworkOutcome::Placeholder {
                url: crate::config::DEFAULT_EPISODE_PLACEHOLDER_URL.to_string()
            }
        );
        assert_eq!(h.calls.get(), 1);
    }

    #[test]
    fn test_nothing_found_without_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Vec::new(), false);
        let key = lookup(3, "Grand Prix");
        let request = ArtworkRequest {
            target: dir.path().join("poster.jpg"),
            art_type: ArtType::Poster,
            lookup: &key,
            allow_placeholder: false,
        };

        assert_eq!(h.fetcher.ensure_artwork(&request), ArtworkOutcome::NotFound);
        assert!(!request.target.exists());
        assert!(h.downloads.borrow().is_empty());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(ArtType::Poster.field_name(), "strPoster");
        assert_eq!(ArtType::Thumbnail.field_name(), "strThumb");
        assert_eq!(ArtType::Fanart.field_name(), "strThumb");
    }
}
