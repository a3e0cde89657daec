//! Sleep mode preference.
//!
//! The local value is what the dashboard shows. Every change is mirrored to
//! the store without waiting for, or reading back, the result. Writes go
//! through one [`SleepWriter`] task and reach the store in the order they
//! were made, so the remote value always ends on the last local value.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::store::RemoteStore;

/// Local sleep mode state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepMode {
    enabled: bool,
}

impl SleepMode {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the local value and return the new one.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Flip the local value and queue the new one on `writer`.
    ///
    /// Returns the new value immediately. A failed write is logged and
    /// otherwise ignored.
    pub fn toggle_and_mirror(&mut self, writer: &SleepWriter) -> bool {
        let enabled = self.toggle();
        writer.write(enabled);
        enabled
    }
}

/// Background task writing sleep mode values to the store one at a time.
#[derive(Debug)]
pub struct SleepWriter {
    tx: mpsc::UnboundedSender<bool>,
    handle: JoinHandle<()>,
}

impl SleepWriter {
    /// Start the writer on the current runtime.
    ///
    /// The task drains its queue and exits once the writer is dropped.
    pub fn spawn(store: Arc<dyn RemoteStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<bool>();
        let handle = tokio::spawn(async move {
            while let Some(enabled) = rx.recv().await {
                match store.set_sleep_mode(enabled).await {
                    Ok(()) => debug!(enabled, "Sleep mode mirrored"),
                    Err(e) => warn!(enabled, error = %e, "Failed to write sleep mode"),
                }
            }
        });
        Self { tx, handle }
    }

    /// Queue a write without waiting for it.
    pub fn write(&self, enabled: bool) {
        if self.tx.send(enabled).is_err() {
            warn!(enabled, "Sleep mode writer has stopped");
        }
    }

    /// Close the queue and wait until every queued write has been attempted.
    pub async fn finish(self) {
        let Self { tx, handle } = self;
        drop(tx);
        if let Err(e) = handle.await {
            warn!(error = %e, "Sleep mode writer failed");
        }
    }
}
