//! Display state of the weather panel.
//!
//! Every fetch is issued under a fresh generation number. Only the
//! completion carrying the latest generation may change the state, so a slow
//! response for an old query can never overwrite the answer for a newer one.

use crate::error::FetchError;
use crate::location::LocationQuery;
use crate::models::WeatherSnapshot;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Error(FetchError),
    Success(WeatherSnapshot),
}

/// Request token handed to whoever performs the network call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: LocationQuery,
}

#[derive(Debug, Default)]
pub struct WeatherFetcher {
    state: FetchState,
    generation: u64,
    query: Option<LocationQuery>,
}

impl WeatherFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match &self.state {
            FetchState::Success(snap) => Some(snap),
            _ => None,
        }
    }

    /// Starts a fetch for `query`. Any earlier request becomes stale.
    pub fn begin(&mut self, query: LocationQuery) -> FetchTicket {
        self.generation += 1;
        self.state = FetchState::Loading;
        self.query = Some(query.clone());
        debug!("Fetch #{} started for '{}'", self.generation, query.value);
        FetchTicket {
            generation: self.generation,
            query,
        }
    }

    /// Re-runs the fetch for the current query, if there is one.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        let query = self.query.clone()?;
        info!("Refreshing weather for '{}'", query.value);
        Some(self.begin(query))
    }

    /// Applies a completed fetch. Returns `false` when the result belongs to
    /// a superseded request and was dropped.
    ///
    /// A failure replaces whatever was on screen, so an old snapshot is
    /// never shown next to the error.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "Dropping result of fetch #{} (latest is #{})",
                generation, self.generation
            );
            return false;
        }

        self.state = match result {
            Ok(snapshot) => {
                info!("Weather loaded for {}", snapshot.resolved_address);
                FetchState::Success(snapshot)
            }
            Err(e) => FetchState::Error(e),
        };
        true
    }
}
