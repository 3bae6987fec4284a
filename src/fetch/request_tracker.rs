//! Request tracking for monitoring outbound API calls.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Point-in-time copy of the tracker's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    /// Requests admitted past both throttles and handed to the transport
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Requests currently waiting on the transport
    pub in_flight: u64,
    /// Highest value `in_flight` has reached
    pub peak_in_flight: u64,
}

#[derive(Debug, Default)]
struct Counters {
    issued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

/// Tracks outstanding requests.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    counters: Arc<Counters>,
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a request as handed to the transport.
    ///
    /// The request counts as in flight until the returned guard is dropped.
    #[must_use]
    pub fn begin(&self) -> InFlight {
        let counters = &self.counters;
        let _ = counters.issued.fetch_add(1, Ordering::Relaxed);
        let current = counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        let _ = counters.peak_in_flight.fetch_max(current, Ordering::AcqRel);

        InFlight {
            counters: Arc::clone(&self.counters),
            finished: false,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RequestStats {
        let counters = &self.counters;
        RequestStats {
            issued: counters.issued.load(Ordering::Relaxed),
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            in_flight: counters.in_flight.load(Ordering::Acquire),
            peak_in_flight: counters.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

/// A request in transport. Dropping it without calling [`InFlight::finish`]
/// (e.g. on cancellation) counts the request as failed.
#[derive(Debug)]
pub struct InFlight {
    counters: Arc<Counters>,
    finished: bool,
}

impl InFlight {
    pub fn finish(mut self, success: bool) {
        self.finished = true;
        let counter = if success {
            &self.counters.succeeded
        } else {
            &self.counters.failed
        };
        let _ = counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.counters.failed.fetch_add(1, Ordering::Relaxed);
        }
        let _ = self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
