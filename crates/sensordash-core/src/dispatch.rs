//! Alert fan-out.
//!
//! An [`AlertDispatcher`] holds a list of [`AlertChannel`]s and delivers an
//! [`AlertEvent`] to all of them concurrently. Channels are independent: a
//! failure in one is logged and recorded in the [`DispatchReport`] but never
//! stops the others, and nothing is retried or rolled back.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sensordash_types::AlertEvent;

use crate::error::Result;
use crate::messages::{DashboardEvent, Notice};
use crate::store::RemoteStore;

/// Result of a single channel delivery that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The alert went out.
    Delivered,
    /// The channel chose not to deliver (disabled, unconfigured, no permission).
    Skipped(String),
}

/// A destination for alerts.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Short channel name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Deliver one alert.
    async fn deliver(&self, event: &AlertEvent) -> Result<Delivery>;
}

/// Per-channel outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<&'static str>,
    pub skipped: Vec<(&'static str, String)>,
    pub failed: Vec<(&'static str, String)>,
}

impl DispatchReport {
    /// Whether every attempted channel succeeded.
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of channels that were tried or skipped.
    pub fn len(&self) -> usize {
        self.delivered.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fans an alert out to every registered channel.
#[derive(Default, Clone)]
pub struct AlertDispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("channels", &self.channel_names())
            .finish()
    }
}

impl AlertDispatcher {
    /// Create a dispatcher with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel.
    pub fn with_channel(mut self, channel: impl AlertChannel + 'static) -> Self {
        self.channels.push(Arc::new(channel));
        self
    }

    /// Add an already shared channel.
    pub fn push(&mut self, channel: Arc<dyn AlertChannel>) {
        self.channels.push(channel);
    }

    /// Names of the registered channels, in registration order.
    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Deliver `event` to every channel concurrently.
    pub async fn dispatch(&self, event: &AlertEvent) -> DispatchReport {
        info!(kind = %event.kind, channels = self.channels.len(), "Dispatching alert");

        let results = join_all(self.channels.iter().map(|channel| async move {
            (channel.name(), channel.deliver(event).await)
        }))
        .await;

        let mut report = DispatchReport::default();
        for (name, result) in results {
            match result {
                Ok(Delivery::Delivered) => {
                    debug!(channel = name, "Alert delivered");
                    report.delivered.push(name);
                }
                Ok(Delivery::Skipped(reason)) => {
                    debug!(channel = name, reason = %reason, "Alert channel skipped");
                    report.skipped.push((name, reason));
                }
                Err(e) => {
                    warn!(channel = name, error = %e, "Alert channel failed");
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        report
    }
}

/// Shows the alert message as an error notice in the dashboard.
#[derive(Debug, Clone)]
pub struct NoticeChannel {
    tx: mpsc::Sender<DashboardEvent>,
}

impl NoticeChannel {
    pub fn new(tx: mpsc::Sender<DashboardEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AlertChannel for NoticeChannel {
    fn name(&self) -> &'static str {
        "notice"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<Delivery> {
        match self
            .tx
            .send(DashboardEvent::Notice(Notice::error(event.message.clone())))
            .await
        {
            Ok(()) => Ok(Delivery::Delivered),
            Err(_) => Ok(Delivery::Skipped("dashboard closed".to_string())),
        }
    }
}

/// Appends the alert to the remote alert log.
#[derive(Clone)]
pub struct AlertLogChannel {
    store: Arc<dyn RemoteStore>,
}

impl AlertLogChannel {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AlertChannel for AlertLogChannel {
    fn name(&self) -> &'static str {
        "alert-log"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<Delivery> {
        self.store.push_alert(event).await?;
        Ok(Delivery::Delivered)
    }
}
