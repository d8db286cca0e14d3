//! Minimum-interval gate for remote calls
//!
//! TheSportsDB's free tier rejects clients that query too quickly. The gate
//! sits in front of the remote call and blocks until the configured interval
//! has passed since the previous call.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Blocks callers so that two passes are at least `min_interval` apart
#[derive(Debug)]
pub struct RateGate {
    last_pass: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_pass: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits if necessary and records the pass
    ///
    /// Returns how long the caller was held back.
    pub fn wait(&self) -> Duration {
        let mut last = self
            .last_pass
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut waited = Duration::ZERO;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", waited);
                thread::sleep(waited);
            }
        }

        *last = Some(Instant::now());
        waited
    }
}
