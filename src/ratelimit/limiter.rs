//! Sliding-window limiter bounding how many requests may start per window.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, trace};

use crate::error::{FetchError, FetchResult, RatefetchError, Result};

/// Grants at most `limit` slots within any trailing `window`.
///
/// Each granted slot is a token that returns to the pool exactly `window`
/// after it was *acquired*, not after the request it guarded completed. A
/// slow server therefore does not extend the window: a limiter under sustained
/// slow responses starts fewer requests than its nominal quota would allow,
/// but can never start more. This is the quantity a remote quota counts.
///
/// Pending returns are recorded as acquisition instants in a single log owned
/// by the limiter; no background task exists per request. Dropping an
/// [`acquire`](Self::acquire) future while it waits leaves the pool untouched.
///
/// The limiter is thread-safe and can be shared across multiple tasks.
#[derive(Debug)]
pub struct WindowLimiter {
    /// Maximum acquisitions within one window
    limit: usize,
    /// How long a token stays out after acquisition
    window: Duration,
    /// Upper bound on how long `acquire` may wait, if any
    acquire_timeout: Option<Duration>,
    /// Waiters queue here; tokio's mutex is fair, so slots go first-come-first-served
    turnstile: tokio::sync::Mutex<()>,
    /// Acquisition instants still inside the trailing window, oldest first
    acquired: Mutex<VecDeque<Instant>>,
}

impl WindowLimiter {
    /// Create a limiter allowing `limit` acquisitions per `window`.
    ///
    /// Both values must be non-zero.
    pub fn new(limit: usize, window: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(RatefetchError::Config("rate limit must be at least 1".to_string()));
        }
        if window.is_zero() {
            return Err(RatefetchError::Config("rate limit window must be non-zero".to_string()));
        }
        if Instant::now().checked_add(window).is_none() {
            return Err(RatefetchError::Config(format!(
                "rate limit window {:?} is too large",
                window
            )));
        }

        Ok(Self {
            limit,
            window,
            acquire_timeout: None,
            turnstile: tokio::sync::Mutex::new(()),
            acquired: Mutex::new(VecDeque::with_capacity(limit)),
        })
    }

    /// Fail acquisitions that cannot get a slot within `wait`.
    pub fn with_acquire_timeout(mut self, wait: Duration) -> Self {
        self.acquire_timeout = Some(wait);
        self
    }

    /// Get the maximum number of acquisitions per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Get the window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get the number of tokens acquired within the trailing window.
    pub fn in_flight(&self) -> usize {
        let mut acquired = self.acquired.lock();
        self.expire(&mut acquired, Instant::now());
        acquired.len()
    }

    /// Get the number of slots that could be acquired right now.
    pub fn remaining(&self) -> usize {
        self.limit - self.in_flight()
    }

    /// Get the duration until the next slot frees up (zero if one is free).
    pub fn duration_until_available(&self) -> Duration {
        let now = Instant::now();
        let mut acquired = self.acquired.lock();
        self.expire(&mut acquired, now);

        if acquired.len() < self.limit {
            return Duration::ZERO;
        }
        match acquired.front() {
            Some(oldest) => match oldest.checked_add(self.window) {
                Some(release_at) => release_at.saturating_duration_since(now),
                None => Duration::MAX,
            },
            None => Duration::ZERO,
        }
    }

    /// Wait for a slot and take it, returning the acquisition instant.
    ///
    /// The token is returned to the pool automatically `window` after that
    /// instant, whatever happens to the request it guards.
    pub async fn acquire(&self) -> FetchResult<Instant> {
        match self.acquire_timeout {
            Some(wait) => timeout(wait, self.acquire_slot())
                .await
                .map_err(|_| FetchError::AcquireTimeout(wait)),
            None => Ok(self.acquire_slot().await),
        }
    }

    async fn acquire_slot(&self) -> Instant {
        let _turn = self.turnstile.lock().await;

        loop {
            let now = Instant::now();
            let next_release = {
                let mut acquired = self.acquired.lock();
                self.expire(&mut acquired, now);

                if acquired.len() < self.limit {
                    acquired.push_back(now);
                    trace!(
                        in_flight = acquired.len(),
                        limit = self.limit,
                        "Acquired rate limit slot"
                    );
                    return now;
                }

                acquired.front().copied()
            };

            // A full pool always has an oldest entry.
            let Some(oldest) = next_release else { continue };
            match oldest.checked_add(self.window) {
                Some(release_at) => {
                    debug!(
                        limit = self.limit,
                        window = ?self.window,
                        wait = ?release_at.saturating_duration_since(now),
                        "Rate limit reached, waiting for a slot"
                    );
                    sleep_until(release_at).await;
                }
                // The slot's release lies beyond the clock's range: it never frees.
                None => std::future::pending::<()>().await,
            }
        }
    }

    /// Return every token whose window has fully elapsed.
    fn expire(&self, acquired: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = acquired.front() {
            if now.duration_since(oldest) >= self.window {
                acquired.pop_front();
            } else {
                break;
            }
        }
    }
}
