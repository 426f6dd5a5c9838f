//! Call throttling for rate-limited backends.
//!
//! An explicit, constructible object rather than process-global state:
//! the component composing the pipeline injects one instance, and
//! independent pipelines can hold independent throttles. Cloning shares
//! the underlying queue, so two pipelines given clones of one throttle
//! still serialize through a single spacing chain.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between consecutive calls.
///
/// Each caller reserves the next free slot in the chain and sleeps until
/// that slot arrives, so calls are spaced `min_interval` apart regardless
/// of how many logical callers invoke concurrently.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    /// Create a throttle with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// The configured spacing.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until this caller's slot arrives.
    ///
    /// The first caller proceeds immediately; each subsequent caller is
    /// scheduled `min_interval` after the previously reserved slot.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
