//! Cached events provider implementation
//!
//! This module provides a caching wrapper for events providers that stores
//! the events of a round on disk, so the poster, thumbnail and fanart of a
//! weekend (and later scans of the same library) share a single API request.

use super::{ArtworkError, EventsProvider, SportsEvent};
use crate::cache::CacheStorage;

/// A caching wrapper for events providers
pub(crate) struct CachedEventsProvider<P>
where
    P: EventsProvider,
{
    /// The underlying events provider
    provider: P,
    /// Cache storage for round listings
    cache: CacheStorage<Vec<SportsEvent>>,
}

impl<P> CachedEventsProvider<P>
where
    P: EventsProvider,
{
    /// Creates a new cached provider wrapping the given provider
    pub fn new(provider: P, cache: CacheStorage<Vec<SportsEvent>>) -> Self {
        tracing::debug!(dir = %cache.cache_dir().display(), "Using event cache");
        Self { provider, cache }
    }

    fn cache_key(year: u32, round: u32) -> String {
        format!("{}_round_{:02}", year, round)
    }
}

impl<P> EventsProvider for CachedEventsProvider<P>
where
    P: EventsProvider,
{
    fn events_for_round(&self, year: u32, round: u32) -> Result<Vec<SportsEvent>, ArtworkError> {
        let cache_key = Self::cache_key(year, round);

        match self.cache.load(&cache_key) {
            Ok(Some(events)) => {
                tracing::debug!(year, round, "Event cache hit");
                return Ok(events);
            }
            Ok(None) => {}
            Err(e) => {
                // A broken entry is simply refetched
                tracing::warn!("Ignoring unreadable cache entry: {}", e);
            }
        }

        let events = self.provider.events_for_round(year, round)?;

        if let Err(e) = self.cache.store(&cache_key, &events) {
            tracing::warn!("Unable to cache events: {}", e);
        }

        Ok(events)
    }
}
