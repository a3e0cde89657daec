//! In-memory remote store for testing.
//!
//! [`MockStore`] implements [`RemoteStore`] without any network access. It
//! records every write so tests can assert on what the dashboard mirrored,
//! and supports failure injection and artificial latency.
//!
//! # Example
//!
//! ```
//! use sensordash_core::{MockStore, RemoteStore};
//! use sensordash_types::Reading;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MockStore::with_readings(vec![Reading::default()]);
//!     assert_eq!(store.fetch_readings().await.unwrap().len(), 1);
//!
//!     store.set_sleep_mode(true).await.unwrap();
//!     assert_eq!(store.sleep_mode_writes().await, vec![true]);
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use sensordash_types::{AlertEvent, Reading};

use crate::error::{Error, Result};
use crate::store::RemoteStore;

/// A mock remote store.
pub struct MockStore {
    readings: RwLock<Vec<Reading>>,
    sleep_writes: RwLock<Vec<bool>>,
    alerts: RwLock<Vec<AlertEvent>>,
    fetch_count: AtomicU32,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    /// Simulated latency for every operation in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    /// Number of upcoming operations that fail before the store recovers.
    remaining_failures: AtomicU32,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("fetch_count", &self.fetch_count.load(Ordering::Relaxed))
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::with_readings(Vec::new())
    }

    /// Create a mock store holding the given readings.
    pub fn with_readings(readings: Vec<Reading>) -> Self {
        Self {
            readings: RwLock::new(readings),
            sleep_writes: RwLock::new(Vec::new()),
            alerts: RwLock::new(Vec::new()),
            fetch_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            latency_ms: AtomicU64::new(0),
            remaining_failures: AtomicU32::new(0),
        }
    }

    /// Replace the stored readings.
    pub async fn set_readings(&self, readings: Vec<Reading>) {
        *self.readings.write().await = readings;
    }

    /// Append a reading.
    pub async fn push_reading(&self, reading: Reading) {
        self.readings.write().await.push(reading);
    }

    /// Every value written to the sleep mode node, oldest first.
    pub async fn sleep_mode_writes(&self) -> Vec<bool> {
        self.sleep_writes.read().await.clone()
    }

    /// Every alert appended to the alert log, oldest first.
    pub async fn alerts(&self) -> Vec<AlertEvent> {
        self.alerts.read().await.clone()
    }

    /// Number of fetches served (including failed ones).
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Make every operation fail until cleared.
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Fail the next `count` operations, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Delay every operation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    async fn simulate(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Api {
                status: 503,
                message: "Transient mock failure".to_string(),
            });
        }

        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::Api {
                status: 500,
                message: self.fail_message.read().await.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn fetch_readings(&self) -> Result<Vec<Reading>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.simulate().await?;
        Ok(self.readings.read().await.clone())
    }

    async fn set_sleep_mode(&self, enabled: bool) -> Result<()> {
        self.simulate().await?;
        self.sleep_writes.write().await.push(enabled);
        Ok(())
    }

    async fn push_alert(&self, event: &AlertEvent) -> Result<()> {
        self.simulate().await?;
        self.alerts.write().await.push(event.clone());
        Ok(())
    }
}
