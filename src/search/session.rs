//! Per-client search sessions.
//!
//! Every search a client starts gets a new generation. Results are kept only
//! if their generation is still the newest when they arrive, so a slow earlier
//! search can never overwrite the answer to a later one.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::{CarSearchResult, SearchParams};

/// Sequence number of a search within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Results accepted for a session
#[derive(Debug, Clone)]
pub struct AppliedSearch {
    pub generation: Generation,
    pub params: Option<SearchParams>,
    pub results: Arc<Vec<CarSearchResult>>,
}

#[derive(Debug, Default)]
struct SessionState {
    requested: Option<SearchParams>,
    applied: Option<AppliedSearch>,
}

#[derive(Debug, Default)]
pub struct SearchSession {
    current: AtomicU64,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a search, superseding any search still in flight
    pub fn begin(&self, params: SearchParams) -> Generation {
        let mut state = self.lock();
        let generation = Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1);
        state.requested = Some(params);
        generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current.load(Ordering::SeqCst) == generation.0
    }

    /// Keep `results` if `generation` is still the newest search.
    ///
    /// Returns false when the results are stale and were discarded.
    pub fn apply(&self, generation: Generation, results: Arc<Vec<CarSearchResult>>) -> bool {
        let mut state = self.lock();
        if !self.is_current(generation) {
            debug!(
                "Discarding stale search results (generation {}, current {})",
                generation.0,
                self.current.load(Ordering::SeqCst)
            );
            return false;
        }

        let params = state.requested.clone();
        state.applied = Some(AppliedSearch {
            generation,
            params,
            results,
        });
        true
    }

    /// Last accepted results
    pub fn latest(&self) -> Option<AppliedSearch> {
        self.lock().applied.clone()
    }
}
