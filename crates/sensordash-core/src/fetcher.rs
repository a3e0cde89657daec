//! Reading cache with ordered fetch completion.
//!
//! Fetches may overlap: a manual refresh can start while a timed poll is
//! still in flight. Every fetch takes a [`FetchTicket`] from
//! [`ReadingCache::begin`]; [`ReadingCache::complete`] applies a result only
//! if its ticket is newer than the last applied one, so a slow old response
//! never overwrites a newer sequence. A failed fetch leaves the cached
//! readings untouched.

use std::sync::Arc;

use tracing::{debug, warn};

use sensordash_types::Reading;

use crate::error::Result;
use crate::store::RemoteStore;

/// Monotonic identifier handed out for each fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    /// Raw sequence number.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The readings replaced the cached sequence.
    Applied {
        /// Number of readings now cached.
        count: usize,
    },
    /// A newer fetch had already been applied; the result was dropped.
    Stale,
    /// The fetch failed; the previous readings were kept.
    Failed {
        /// Error description.
        error: String,
    },
}

/// The latest applied reading sequence and fetch bookkeeping.
#[derive(Debug, Default)]
pub struct ReadingCache {
    readings: Arc<Vec<Reading>>,
    next_ticket: u64,
    last_applied: Option<FetchTicket>,
    in_flight: usize,
    completed_once: bool,
    last_error: Option<String>,
}

impl ReadingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch and get its ticket.
    pub fn begin(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        self.in_flight += 1;
        FetchTicket(self.next_ticket)
    }

    /// Record the result of the fetch holding `ticket`.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Vec<Reading>>) -> FetchOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.completed_once = true;

        match result {
            Ok(readings) => {
                if self.last_applied.is_some_and(|last| ticket <= last) {
                    debug!(ticket = ticket.id(), "Discarding stale fetch result");
                    return FetchOutcome::Stale;
                }
                let count = readings.len();
                self.readings = Arc::new(readings);
                self.last_applied = Some(ticket);
                self.last_error = None;
                FetchOutcome::Applied { count }
            }
            Err(e) => {
                warn!(ticket = ticket.id(), error = %e, "Failed to fetch readings");
                let error = e.to_string();
                self.last_error = Some(error.clone());
                FetchOutcome::Failed { error }
            }
        }
    }

    /// The current sequence. Cheap to clone and hand to the UI.
    pub fn readings(&self) -> Arc<Vec<Reading>> {
        Arc::clone(&self.readings)
    }

    /// True until the first fetch completes, successfully or not.
    pub fn is_loading(&self) -> bool {
        !self.completed_once
    }

    /// Whether any fetch is still outstanding.
    pub fn is_fetching(&self) -> bool {
        self.in_flight > 0
    }

    /// Number of fetches started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Error from the most recent failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Ticket of the sequence currently cached.
    pub fn last_applied(&self) -> Option<FetchTicket> {
        self.last_applied
    }
}

/// Fetch readings from `store` and feed the result into `cache` in one step.
///
/// Used by one-shot callers that do not overlap fetches.
pub async fn fetch_into(cache: &mut ReadingCache, store: &dyn RemoteStore) -> FetchOutcome {
    let ticket = cache.begin();
    let result = store.fetch_readings().await;
    cache.complete(ticket, result)
}
