//! Shared API quota tracking.
//!
//! One tracker is constructed per batch run and shared by all workers. It
//! counts request units issued to the external services and short-circuits
//! further calls once a hard quota is known to be exhausted, so a dead quota
//! fails fast instead of producing a retry storm.

use std::sync::Mutex;
use tracing::warn;

/// YouTube Data API unit cost of one search request.
pub const SEARCH_COST: u64 = 100;
/// Unit cost of one video detail or comment-thread request.
pub const LOOKUP_COST: u64 = 1;

#[derive(Debug, Default)]
struct QuotaState {
    used: u64,
    exhausted: bool,
}

/// Mutex-guarded request quota tracker shared across workers.
#[derive(Debug)]
pub struct QuotaTracker {
    state: Mutex<QuotaState>,
    /// Daily unit budget. `None` means only hard exhaustion signals apply.
    limit: Option<u64>,
}

impl QuotaTracker {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            state: Mutex::new(QuotaState::default()),
            limit,
        }
    }

    /// Reserve `units` for an outgoing request. Returns false when the quota
    /// is already exhausted or the reservation would cross the limit; the
    /// caller must then skip the request.
    pub fn try_acquire(&self, units: u64) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.exhausted {
            return false;
        }
        if let Some(limit) = self.limit {
            if state.used + units > limit {
                warn!(used = state.used, limit, "request quota budget exhausted");
                state.exhausted = true;
                return false;
            }
        }
        state.used += units;
        true
    }

    /// Record that the API itself reported quota exhaustion. All further
    /// `try_acquire` calls fail until the tracker is rebuilt.
    pub fn mark_exhausted(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.exhausted {
            warn!(used = state.used, "API signalled quota exhaustion");
            state.exhausted = true;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.lock().unwrap().exhausted
    }

    /// Units consumed so far, for the end-of-run summary.
    pub fn used(&self) -> u64 {
        self.state.lock().unwrap().used
    }
}
