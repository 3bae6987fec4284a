use super::error::FetchError;
use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Quota reset times are advertised in whole seconds, so deadlines closer than
/// this are treated as the same pause.
const RESET_RESOLUTION: Duration = Duration::from_secs(1);

/// Hard ceiling on the number of requests in flight.
///
/// Wrap in an `Arc` via [`ConcurrencyGate::new`], then call [`ConcurrencyGate::acquire`]
/// before each request. The returned permit frees its slot when dropped, so a slot
/// is released on every exit path of the guarded work, including errors and
/// cancellation.
///
/// The gate can also be paused until a deadline with [`ConcurrencyGate::pause_for`],
/// e.g. when the server reports that its quota is exhausted. The deadline is checked
/// both before and after waiting for a slot, so callers already queued on a full gate
/// are held back as well. When pauses overlap, the later deadline wins.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    paused_until: Mutex<Option<Instant>>,
}

impl ConcurrencyGate {
    /// Create a gate that admits at most `max_concurrent` holders at a time.
    pub fn new(max_concurrent: usize) -> Result<Arc<Self>, FetchError> {
        if max_concurrent == 0 {
            return Err(FetchError::invalid_config("max concurrent requests must be at least 1"));
        }

        Ok(Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            paused_until: Mutex::new(None),
        }))
    }

    /// Wait until unpaused, then occupy a slot.
    ///
    /// The returned permit must be held for the duration of the request.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        loop {
            if let Some(deadline) = self.pause_deadline() {
                tokio::time::sleep_until(deadline).await;
                continue;
            }

            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            // a pause may have started while this caller was queued for the slot
            match self.pause_deadline() {
                None => return permit,
                Some(deadline) => {
                    drop(permit);
                    tokio::time::sleep_until(deadline).await;
                }
            }
        }
    }

    /// Number of free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Returns whether the gate is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause_deadline().is_some()
    }

    /// Stop admitting new holders for `duration`.
    ///
    /// Current holders are not affected. Returns `false` when an active pause already
    /// lasts at least as long, in which case nothing changes.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut paused_until = self.paused_until.lock().unwrap_or_else(PoisonError::into_inner);

        match *paused_until {
            Some(current) if current > Instant::now() && deadline <= current + RESET_RESOLUTION => false,
            _ => {
                *paused_until = Some(deadline);
                true
            }
        }
    }

    /// The active pause deadline, clearing it once it has passed.
    fn pause_deadline(&self) -> Option<Instant> {
        let mut paused_until = self.paused_until.lock().unwrap_or_else(PoisonError::into_inner);
        if paused_until.is_some_and(|deadline| Instant::now() >= deadline) {
            *paused_until = None;
        }
        *paused_until
    }
}
