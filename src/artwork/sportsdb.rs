/// TheSportsDB events provider implementation.
use super::sportsdb_types::EventsResponse;
use super::{ArtworkError, EventsProvider, SportsEvent};
use crate::config::ArtworkConfig;
use crate::throttle::RateGate;

/// Events provider for the TheSportsDB API.
///
/// Fetches the events of a race weekend from the `eventsround.php` endpoint.
/// Every request passes through a [`RateGate`] to stay within the API's
/// request limit.
pub struct SportsDbProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    league_id: u32,
    gate: RateGate,
}

impl SportsDbProvider {
    /// Creates a new provider using the given HTTP client.
    pub fn new(client: reqwest::blocking::Client, config: &ArtworkConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            league_id: config.league_id,
            gate: RateGate::new(config.request_interval),
        }
    }

    fn round_url(&self) -> String {
        format!("{}/eventsround.php", self.base_url)
    }
}

impl EventsProvider for SportsDbProvider {
    fn events_for_round(&self, year: u32, round: u32) -> Result<Vec<SportsEvent>, ArtworkError> {
        let url = self.round_url();

        self.gate.wait();
        tracing::info!(%url, league = self.league_id, year, round, "Pulling event data");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("id", self.league_id.to_string()),
                ("r", round.to_string()),
                ("s", year.to_string()),
            ])
            .send()
            .map_err(|e| ArtworkError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ArtworkError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: EventsResponse = response
            .json()
            .map_err(|e| ArtworkError::ParseError(e.to_string()))?;

        let events: Vec<SportsEvent> = body
            .events
            .unwrap_or_default()
            .into_iter()
            .map(SportsEvent::from)
            .collect();

        tracing::debug!(year, round, count = events.len(), "Received events");
        Ok(events)
    }
}
