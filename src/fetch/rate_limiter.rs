use super::error::FetchError;
use core::time::Duration;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Length of the trailing window over which admissions are counted.
const WINDOW: Duration = Duration::from_secs(1);

/// Sliding-window limiter on request starts.
///
/// At most `max_per_second` calls to [`RateLimiter::acquire`] return within any
/// trailing one-second window. An admission at t=0.9s still counts against
/// admissions up to t=1.9s; there are no fixed buckets.
///
/// The admission log is only locked to prune, inspect and append. A caller that
/// has to wait sleeps without holding the lock and re-checks on wake-up, so a
/// sleeping caller never blocks others and the cap cannot be exceeded.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_second: usize,
    admissions: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_second: u32) -> Result<Self, FetchError> {
        if max_per_second == 0 {
            return Err(FetchError::invalid_config("requests per second must be at least 1"));
        }

        let max_per_second = max_per_second as usize;
        Ok(Self {
            max_per_second,
            admissions: Mutex::new(VecDeque::with_capacity(max_per_second)),
        })
    }

    /// Wait until one more request may start, then record its admission.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut admissions = self.admissions.lock().unwrap_or_else(PoisonError::into_inner);
                let now = Instant::now();
                prune(&mut admissions, now);

                if admissions.len() < self.max_per_second {
                    admissions.push_back(now);
                    return;
                }

                // full window: the oldest entry is the next to expire
                admissions
                    .front()
                    .map_or(Duration::ZERO, |oldest| WINDOW.saturating_sub(now - *oldest))
            };

            if wait.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Number of admissions inside the current window.
    #[cfg(test)]
    fn in_window(&self) -> usize {
        let mut admissions = self.admissions.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut admissions, Instant::now());
        admissions.len()
    }
}

fn prune(admissions: &mut VecDeque<Instant>, now: Instant) {
    while admissions.front().is_some_and(|t| now - *t >= WINDOW) {
        let _ = admissions.pop_front();
    }
}
