/// TheSportsDB API response types for deserialization.
///
/// These structures mirror the JSON response format of the
/// `eventsround.php` endpoint. Only the fields used for artwork are mapped.
use super::SportsEvent;
use serde::Deserialize;

/// The top-level response from the events-by-round endpoint
#[derive(Debug, Deserialize)]
pub(super) struct EventsResponse {
    /// Events of the round, `null` when the round is unknown
    pub events: Option<Vec<SportsDbEvent>>,
}

/// A single event from TheSportsDB
#[derive(Debug, Deserialize)]
pub(super) struct SportsDbEvent {
    /// Event name, e.g. "Bahrain Grand Prix Qualifying"
    #[serde(rename = "strEvent")]
    pub name: Option<String>,
    /// Poster image URL (may be null)
    #[serde(rename = "strPoster", default)]
    pub poster: Option<String>,
    /// Thumbnail image URL (may be null)
    #[serde(rename = "strThumb", default)]
    pub thumb: Option<String>,
}

impl From<SportsDbEvent> for SportsEvent {
    fn from(event: SportsDbEvent) -> Self {
        SportsEvent {
            name: event.name.unwrap_or_default(),
            poster: event.poster,
            thumb: event.thumb,
        }
    }
}
