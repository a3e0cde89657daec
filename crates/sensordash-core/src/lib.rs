//! Polling, alerting and view models for a home environment sensor dashboard.
//!
//! The sensor node writes its readings to a hosted real-time database. This
//! crate reads them back, decides when conditions have been uncomfortable
//! for long enough to warn someone, and prepares what a front end needs to
//! draw a chart and a table.
//!
//! # Features
//!
//! - **Remote store**: Firebase Realtime Database REST client behind the
//!   [`RemoteStore`] trait
//! - **Ordered polling**: overlapping fetches never let an older response
//!   replace a newer one ([`ReadingCache`])
//! - **Threshold alerts**: windowed evaluation with fixed precedence
//!   ([`Thresholds`])
//! - **Alert channels**: dashboard notice, desktop notification, terminal
//!   bell, EmailJS email and the remote alert log, fanned out concurrently
//!   ([`AlertDispatcher`])
//! - **Sleep mode** mirrored to the store
//! - **Voice commands** through an external speech-to-text program
//! - **Table and chart** view models with CSV export
//! - **Worker**: a single task owning all of the above ([`DashboardWorker`])
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensordash_core::{Command, DashboardEvent, DashboardWorker, FirebaseStore};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FirebaseStore::new("https://my-node.firebaseio.com", None)?);
//!     let (cmd_tx, cmd_rx) = mpsc::channel(16);
//!     let (event_tx, mut event_rx) = mpsc::channel(64);
//!     DashboardWorker::new(cmd_rx, event_tx, store).spawn();
//!
//!     while let Some(event) = event_rx.recv().await {
//!         if let DashboardEvent::ReadingsUpdated { readings } = event {
//!             println!("{} readings", readings.len());
//!             cmd_tx.send(Command::Shutdown).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod email;
pub mod error;
pub mod fetcher;
pub mod messages;
pub mod mock;
pub mod notify;
pub mod sleep;
pub mod store;
pub mod table;
pub mod thresholds;
pub mod view;
pub mod voice;
pub mod worker;

pub use dispatch::{AlertChannel, AlertDispatcher, AlertLogChannel, Delivery, DispatchReport, NoticeChannel};
pub use email::{EmailChannel, EmailConfig, EmailJsClient};
pub use error::{Error, Result};
pub use fetcher::{FetchOutcome, FetchTicket, ReadingCache, fetch_into};
pub use messages::{Command, DashboardEvent, Notice, NoticeLevel};
pub use mock::MockStore;
pub use notify::{AudioCue, DesktopNotifier, Permission};
pub use sleep::{SleepMode, SleepWriter};
pub use store::{FirebaseStore, RemoteStore};
pub use table::{
    Column, PAGE_SIZES, SortDirection, SortState, TableView, csv_escape, nearest_page_size,
    readings_to_csv,
};
pub use thresholds::{ThresholdConfig, Thresholds};
pub use view::{ChartData, Summary};
pub use voice::{CommandRecognizer, ListenFlag, SpeechRecognizer, VoiceCommand, VoiceConfig};
pub use worker::DashboardWorker;

// Re-export the data model so front ends need only one dependency.
pub use sensordash_types::{AlertEvent, AlertKind, LightStatus, Reading, SensorTimestamp};
