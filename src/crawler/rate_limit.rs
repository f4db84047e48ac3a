//! Per-host request pacing
//!
//! [`HostRateLimiter::acquire`] hands out a [`HostPermit`] no sooner than the
//! configured interval after the previous permit for the same host. Each host
//! has its own async mutex, so callers for one host queue in FIFO order while
//! callers for other hosts never wait on them. The permit holds the host's
//! lock until it is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;

use crate::utils::error::ExtractionError;
use crate::utils::extract_host;

type HostSlot = Arc<AsyncMutex<Option<Instant>>>;

/// Shared per-host interval gate
#[derive(Debug)]
pub struct HostRateLimiter {
    min_interval: Duration,
    slots: Mutex<HashMap<String, HostSlot>>,
}

/// Scoped grant for one request to one host
///
/// Dropping the permit lets the next caller for the host proceed once the
/// interval since `granted_at` has elapsed.
#[derive(Debug)]
pub struct HostPermit {
    host: String,
    granted_at: Instant,
    _slot: OwnedMutexGuard<Option<Instant>>,
}

impl HostPermit {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn granted_at(&self) -> Instant {
        self.granted_at
    }
}

impl HostRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of hosts seen so far
    pub fn tracked_hosts(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot_for(&self, host: &str) -> HostSlot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(host.to_ascii_lowercase())
                .or_insert_with(|| Arc::new(AsyncMutex::new(None))),
        )
    }

    /// Wait until `host` may be contacted again and take its permit
    pub async fn acquire(&self, host: &str) -> HostPermit {
        let slot = self.slot_for(host);
        let mut guard = slot.lock_owned().await;

        if let Some(last) = *guard {
            let ready_at = last + self.min_interval;
            if Instant::now() < ready_at {
                debug!(
                    host = host,
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Waiting for host interval"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let granted_at = Instant::now();
        *guard = Some(granted_at);

        HostPermit {
            host: host.to_ascii_lowercase(),
            granted_at,
            _slot: guard,
        }
    }

    /// Acquire the permit for the host of `url`
    pub async fn acquire_for_url(&self, url: &str) -> Result<HostPermit, ExtractionError> {
        let host = extract_host(url)
            .map_err(|e| ExtractionError::ClassificationFailed(format!("{url}: {e}")))?;
        Ok(self.acquire(&host).await)
    }
}
