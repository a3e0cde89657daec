//! Message types for UI/worker communication.
//!
//! ```text
//! +------------------+     Command      +-------------------+
//! |    UI / CLI      | --------------> |  DashboardWorker  |
//! |   (ratatui)      |                 |  (tokio runtime)  |
//! |                  | <-------------- |                   |
//! +------------------+  DashboardEvent +-------------------+
//! ```
//!
//! - [`Command`]: user actions sent to the worker
//! - [`DashboardEvent`]: state changes sent back to the UI

use std::sync::Arc;

use time::OffsetDateTime;

use sensordash_types::{AlertEvent, Reading};

use crate::dispatch::DispatchReport;

/// Commands sent from the UI to the background worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch the reading collection now.
    Refresh,
    /// Flip the sleep mode preference and mirror it to the store.
    ToggleSleepMode,
    /// Start a one-shot speech recognition session.
    StartVoice,
    /// Interpret a transcript as if it had been spoken.
    VoiceTranscript(String),
    /// Stop the worker.
    Shutdown,
}

/// Severity of a dashboard notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub at: OffsetDateTime,
}

impl Notice {
    /// Create a notice stamped with the current time.
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            at: OffsetDateTime::now_utc(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }
}

/// Events sent from the background worker to the UI.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A fetch has been started.
    FetchStarted {
        /// Sequence number of the fetch.
        ticket: u64,
    },

    /// A newer reading sequence replaced the cached one.
    ReadingsUpdated {
        /// The full sequence in store order.
        readings: Arc<Vec<Reading>>,
    },

    /// A fetch failed. The previous readings are still current.
    FetchFailed {
        /// Error description.
        error: String,
    },

    /// A fetch completed, whether applied, discarded as stale or failed.
    FetchFinished {
        /// Sequence number of the fetch.
        ticket: u64,
        /// Fetches still outstanding.
        in_flight: usize,
    },

    /// The threshold evaluator fired.
    AlertRaised {
        /// The alert being dispatched.
        event: AlertEvent,
    },

    /// Every alert channel has finished for an alert.
    AlertDispatched {
        /// Which channels delivered, skipped or failed.
        report: DispatchReport,
    },

    /// A message for the user.
    Notice(Notice),

    /// The local sleep mode preference changed.
    SleepModeChanged {
        /// New value.
        enabled: bool,
    },

    /// A speech recognition session started or ended.
    ListeningChanged {
        /// Whether the recognizer is active.
        listening: bool,
    },
}
