//! Scanner configuration
//!
//! The configuration is built once at startup (see `main.rs`) and handed to the
//! [`Scanner`](crate::Scanner), which passes the relevant parts on to the
//! components that need them.

use std::time::Duration;

/// Year used for files that carry no recognizable year in their name
pub const DEFAULT_FALLBACK_YEAR: u32 = 2025;

/// TheSportsDB free-tier API root
pub const DEFAULT_API_BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json/3";

/// TheSportsDB league id of Formula 1
pub const DEFAULT_LEAGUE_ID: u32 = 4370;

/// Placeholder written when no poster can be found for a round
pub const DEFAULT_POSTER_PLACEHOLDER_URL: &str =
    "https://www.thesportsdb.com/images/media/league/poster/4e1svi1605133041.jpg";

/// Placeholder written when no episode thumbnail can be found
pub const DEFAULT_EPISODE_PLACEHOLDER_URL: &str =
    "https://github.com/potchin/PlexF1MediaScanner/raw/master/episode_poster.png";

/// Top-level scanner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Whether artwork should be fetched for recognized files
    pub download_art: bool,

    /// Year assigned to fallback records without a year in their name
    pub fallback_year: u32,

    /// Settings for the artwork lookup
    pub artwork: ArtworkConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            download_art: true,
            fallback_year: DEFAULT_FALLBACK_YEAR,
            artwork: ArtworkConfig::default(),
        }
    }
}

/// Settings for the remote artwork lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkConfig {
    /// Root URL of the events API, without a trailing slash
    pub api_base_url: String,

    /// League identifier passed to the events-by-round endpoint
    pub league_id: u32,

    /// Minimum time between two remote queries
    pub request_interval: Duration,

    /// Timeout for a single HTTP request
    pub timeout: Duration,

    /// Disable TLS certificate validation.
    ///
    /// Only meant for setups where the endpoint cannot be reached with
    /// validation enabled. Off unless explicitly requested.
    pub accept_invalid_certs: bool,

    /// Image used for posters when nothing was found
    pub poster_placeholder_url: String,

    /// Image used for thumbnails and fanart when nothing was found
    pub episode_placeholder_url: String,

    /// How long event listings stay cached on disk. `None` disables the cache.
    pub cache_ttl: Option<Duration>,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            league_id: DEFAULT_LEAGUE_ID,
            request_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            poster_placeholder_url: DEFAULT_POSTER_PLACEHOLDER_URL.to_string(),
            episode_placeholder_url: DEFAULT_EPISODE_PLACEHOLDER_URL.to_string(),
            cache_ttl: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}
