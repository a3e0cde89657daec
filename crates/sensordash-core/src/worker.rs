//! Background worker owning the dashboard state.
//!
//! The [`DashboardWorker`] runs in its own Tokio task and is the only place
//! dashboard state is mutated. It communicates with the UI via channels:
//!
//! - Receives [`Command`]s from the UI
//! - Sends [`DashboardEvent`]s back with results and state changes
//!
//! # Architecture
//!
//! The run loop uses `tokio::select!` over:
//! - incoming commands
//! - the poll timer (first tick fires immediately)
//! - completed fetches, which report back with their ticket
//! - completed recognition sessions
//!
//! Fetches and recognition run as spawned tasks so a slow store or a long
//! utterance never blocks commands. Thresholds are evaluated once for every
//! fetch result that is applied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sensordash_types::Reading;

use crate::dispatch::AlertDispatcher;
use crate::error::Result;
use crate::fetcher::{FetchOutcome, FetchTicket, ReadingCache};
use crate::messages::{Command, DashboardEvent, Notice};
use crate::sleep::{SleepMode, SleepWriter};
use crate::store::RemoteStore;
use crate::thresholds::Thresholds;
use crate::voice::{ListenFlag, ListenGuard, SpeechRecognizer, VoiceCommand, recognition_error_text};

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

type FetchResult = (FetchTicket, Result<Vec<Reading>>);

/// Background worker for the dashboard.
pub struct DashboardWorker {
    command_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<DashboardEvent>,
    store: Arc<dyn RemoteStore>,
    thresholds: Thresholds,
    dispatcher: Arc<AlertDispatcher>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    poll_interval: Duration,
    cache: ReadingCache,
    sleep: SleepMode,
    sleep_writer: Option<SleepWriter>,
    listen: ListenFlag,
    /// Held from the start of a recognition session until its result is handled.
    listen_guard: Option<ListenGuard>,
    fetch_tx: mpsc::UnboundedSender<FetchResult>,
    fetch_rx: mpsc::UnboundedReceiver<FetchResult>,
    voice_tx: mpsc::UnboundedSender<Result<String>>,
    voice_rx: mpsc::UnboundedReceiver<Result<String>>,
    cancel_token: CancellationToken,
}

impl DashboardWorker {
    /// Create a worker with default thresholds, no alert channels and no
    /// recognizer.
    pub fn new(
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<DashboardEvent>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (voice_tx, voice_rx) = mpsc::unbounded_channel();
        Self {
            command_rx,
            event_tx,
            store,
            thresholds: Thresholds::default(),
            dispatcher: Arc::new(AlertDispatcher::new()),
            recognizer: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cache: ReadingCache::new(),
            sleep: SleepMode::default(),
            sleep_writer: None,
            listen: ListenFlag::new(),
            listen_guard: None,
            fetch_tx,
            fetch_rx,
            voice_tx,
            voice_rx,
            cancel_token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: AlertDispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Time between polls. Zero is raised to one second.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_secs(1));
        self
    }

    /// Initial local sleep mode value.
    #[must_use]
    pub fn with_sleep_mode(mut self, enabled: bool) -> Self {
        self.sleep = SleepMode::new(enabled);
        self
    }

    /// Token that stops the worker and its spawned tasks when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Spawn the worker on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until [`Command::Shutdown`], the command channel closes or the
    /// cancel token fires.
    pub async fn run(mut self) {
        info!(interval = ?self.poll_interval, "DashboardWorker started");

        self.emit(DashboardEvent::SleepModeChanged {
            enabled: self.sleep.is_enabled(),
        })
        .await;

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("DashboardWorker cancelled");
                    break;
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown) => {
                            info!("DashboardWorker received shutdown command");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed, shutting down worker");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.start_fetch().await;
                }
                Some((ticket, result)) = self.fetch_rx.recv() => {
                    self.finish_fetch(ticket, result).await;
                }
                Some(result) = self.voice_rx.recv() => {
                    self.finish_voice(result).await;
                }
            }
        }

        self.cancel_token.cancel();
        info!("DashboardWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        debug!(?cmd, "Handling command");

        match cmd {
            Command::Refresh => self.start_fetch().await,
            Command::ToggleSleepMode => self.toggle_sleep().await,
            Command::StartVoice => self.start_voice().await,
            Command::VoiceTranscript(transcript) => self.apply_transcript(&transcript).await,
            Command::Shutdown => {}
        }
    }

    async fn emit(&self, event: DashboardEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }

    async fn start_fetch(&mut self) {
        let ticket = self.cache.begin();
        debug!(ticket = ticket.id(), "Starting fetch");
        self.emit(DashboardEvent::FetchStarted {
            ticket: ticket.id(),
        })
        .await;

        let store = Arc::clone(&self.store);
        let tx = self.fetch_tx.clone();
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = store.fetch_readings() => result,
            };
            let _ = tx.send((ticket, result));
        });
    }

    async fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Reading>>) {
        match self.cache.complete(ticket, result) {
            FetchOutcome::Applied { count } => {
                debug!(ticket = ticket.id(), count, "Readings updated");
                let readings = self.cache.readings();
                self.emit(DashboardEvent::ReadingsUpdated {
                    readings: Arc::clone(&readings),
                })
                .await;
                self.evaluate(&readings).await;
            }
            FetchOutcome::Stale => {}
            FetchOutcome::Failed { error } => {
                self.emit(DashboardEvent::FetchFailed { error }).await;
            }
        }
        self.emit(DashboardEvent::FetchFinished {
            ticket: ticket.id(),
            in_flight: self.cache.in_flight(),
        })
        .await;
    }

    async fn evaluate(&self, readings: &[Reading]) {
        let Some(alert) = self.thresholds.evaluate(readings) else {
            return;
        };
        info!(kind = %alert.kind, "Threshold alert");
        self.emit(DashboardEvent::AlertRaised {
            event: alert.clone(),
        })
        .await;

        let dispatcher = Arc::clone(&self.dispatcher);
        let event_tx = self.event_tx.clone();
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            let report = tokio::select! {
                _ = cancel.cancelled() => return,
                report = dispatcher.dispatch(&alert) => report,
            };
            let _ = event_tx.send(DashboardEvent::AlertDispatched { report }).await;
        });
    }

    async fn toggle_sleep(&mut self) {
        let writer = self
            .sleep_writer
            .get_or_insert_with(|| SleepWriter::spawn(Arc::clone(&self.store)));
        let enabled = self.sleep.toggle_and_mirror(writer);
        info!(enabled, "Sleep mode toggled");
        self.emit(DashboardEvent::SleepModeChanged { enabled }).await;
    }

    async fn start_voice(&mut self) {
        let Some(recognizer) = self.recognizer.clone() else {
            self.emit(DashboardEvent::Notice(Notice::warning(
                "Voice input is not configured",
            )))
            .await;
            return;
        };

        let Some(guard) = self.listen.try_acquire() else {
            debug!("Recognition already running");
            self.emit(DashboardEvent::Notice(Notice::info("Already listening")))
                .await;
            return;
        };

        self.listen_guard = Some(guard);
        self.emit(DashboardEvent::ListeningChanged { listening: true })
            .await;

        let tx = self.voice_tx.clone();
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = recognizer.recognize() => result,
            };
            let _ = tx.send(result);
        });
    }

    async fn finish_voice(&mut self, result: Result<String>) {
        self.listen_guard = None;
        self.emit(DashboardEvent::ListeningChanged { listening: false })
            .await;

        match result {
            Ok(transcript) => {
                info!(transcript = %transcript, "Voice command received");
                self.apply_transcript(&transcript).await;
            }
            Err(e) => {
                self.emit(DashboardEvent::Notice(Notice::error(
                    recognition_error_text(&e),
                )))
                .await;
            }
        }
    }

    async fn apply_transcript(&mut self, transcript: &str) {
        match VoiceCommand::interpret(transcript) {
            VoiceCommand::ToggleSleepMode => self.toggle_sleep().await,
            VoiceCommand::Refresh => self.start_fetch().await,
            VoiceCommand::Unrecognized(command) => {
                self.emit(DashboardEvent::Notice(Notice::info(
                    VoiceCommand::unrecognized_text(&command),
                )))
                .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::AlertLogChannel;
    use crate::error::Error;
    use crate::messages::NoticeLevel;
    use crate::mock::MockStore;
    use async_trait::async_trait;
    use sensordash_types::AlertKind;

    const WAIT: Duration = Duration::from_secs(5);

    fn hot_readings() -> Vec<Reading> {
        [31.0, 32.0, 33.0, 34.0, 35.0]
            .into_iter()
            .map(|t| Reading {
                temperature: t,
                humidity: 40.0,
                air_quality: 20.0,
                ..Default::default()
            })
            .collect()
    }

    struct Harness {
        cmd_tx: mpsc::Sender<Command>,
        event_rx: mpsc::Receiver<DashboardEvent>,
        handle: JoinHandle<()>,
    }

    impl Harness {
        fn start(worker: impl FnOnce(DashboardWorker) -> DashboardWorker, store: Arc<MockStore>) -> Self {
            let (cmd_tx, cmd_rx) = mpsc::channel(16);
            let (event_tx, event_rx) = mpsc::channel(64);
            let worker = worker(
                DashboardWorker::new(cmd_rx, event_tx, store)
                    .with_poll_interval(Duration::from_secs(3600)),
            );
            Self {
                cmd_tx,
                event_rx,
                handle: worker.spawn(),
            }
        }

        async fn next_matching<F>(&mut self, mut pred: F) -> DashboardEvent
        where
            F: FnMut(&DashboardEvent) -> bool,
        {
            tokio::time::timeout(WAIT, async {
                loop {
                    let event = self.event_rx.recv().await.expect("worker alive");
                    if pred(&event) {
                        return event;
                    }
                }
            })
            .await
            .expect("event in time")
        }

        async fn shutdown(self) {
            self.cmd_tx.send(Command::Shutdown).await.unwrap();
            self.handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_startup_fetch_and_alert() {
        let store = Arc::new(MockStore::with_readings(hot_readings()));
        let log_store = store.clone();
        let mut h = Harness::start(
            |w| w.with_dispatcher(AlertDispatcher::new().with_channel(AlertLogChannel::new(log_store))),
            store.clone(),
        );

        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::ReadingsUpdated { .. }))
            .await;
        if let DashboardEvent::ReadingsUpdated { readings } = event {
            assert_eq!(readings.len(), 5);
        }

        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::AlertRaised { .. }))
            .await;
        if let DashboardEvent::AlertRaised { event } = event {
            assert_eq!(event.kind, AlertKind::Temperature);
            assert!((event.temperature - 33.0).abs() < 1e-9);
        }

        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::AlertDispatched { .. }))
            .await;
        if let DashboardEvent::AlertDispatched { report } = event {
            assert_eq!(report.delivered, vec!["alert-log"]);
        }
        assert_eq!(store.alerts().await.len(), 1);

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_data() {
        let store = Arc::new(MockStore::with_readings(vec![Reading::default(); 2]));
        let mut h = Harness::start(|w| w, store.clone());

        h.next_matching(|e| matches!(e, DashboardEvent::ReadingsUpdated { .. }))
            .await;

        store.set_should_fail(true, Some("offline")).await;
        h.cmd_tx.send(Command::Refresh).await.unwrap();
        let event = h
            .next_matching(|e| {
                matches!(
                    e,
                    DashboardEvent::FetchFailed { .. } | DashboardEvent::ReadingsUpdated { .. }
                )
            })
            .await;
        match event {
            DashboardEvent::FetchFailed { error } => assert!(error.contains("offline")),
            other => panic!("unexpected event: {other:?}"),
        }

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_toggle_sleep_mode() {
        let store = Arc::new(MockStore::new());
        let mut h = Harness::start(|w| w, store.clone());

        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: false }))
            .await;
        h.cmd_tx.send(Command::ToggleSleepMode).await.unwrap();
        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: true }))
            .await;

        tokio::time::timeout(WAIT, async {
            while store.sleep_mode_writes().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(store.sleep_mode_writes().await, vec![true]);

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_typed_transcripts() {
        let store = Arc::new(MockStore::new());
        let mut h = Harness::start(|w| w, store.clone());
        h.next_matching(|e| matches!(e, DashboardEvent::ReadingsUpdated { .. }))
            .await;

        h.cmd_tx
            .send(Command::VoiceTranscript("Please REFRESH DATA".into()))
            .await
            .unwrap();
        h.next_matching(|e| matches!(e, DashboardEvent::FetchStarted { ticket: 2 }))
            .await;

        h.cmd_tx
            .send(Command::VoiceTranscript("sleep mode".into()))
            .await
            .unwrap();
        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: true }))
            .await;

        h.cmd_tx
            .send(Command::VoiceTranscript("Make Coffee".into()))
            .await
            .unwrap();
        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::Notice(_)))
            .await;
        if let DashboardEvent::Notice(notice) = event {
            assert_eq!(notice.level, NoticeLevel::Info);
            assert_eq!(notice.text, "Unrecognized command: make coffee");
        }

        h.shutdown().await;
    }

    struct SlowRecognizer {
        transcript: std::result::Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl SpeechRecognizer for SlowRecognizer {
        async fn recognize(&self) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.transcript
                .map(String::from)
                .map_err(|e| Error::Speech(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_voice_session_rejects_reentry() {
        let store = Arc::new(MockStore::new());
        let recognizer = Arc::new(SlowRecognizer {
            transcript: Ok("toggle sleep mode"),
        });
        let mut h = Harness::start(|w| w.with_recognizer(recognizer), store.clone());

        h.cmd_tx.send(Command::StartVoice).await.unwrap();
        h.cmd_tx.send(Command::StartVoice).await.unwrap();

        h.next_matching(|e| matches!(e, DashboardEvent::ListeningChanged { listening: true }))
            .await;
        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::Notice(_)))
            .await;
        if let DashboardEvent::Notice(notice) = event {
            assert_eq!(notice.text, "Already listening");
        }

        h.next_matching(|e| matches!(e, DashboardEvent::ListeningChanged { listening: false }))
            .await;
        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: true }))
            .await;

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_listening_held_until_result_is_handled() {
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let recognizer = Arc::new(SlowRecognizer {
            transcript: Ok("hello"),
        });
        let mut worker = DashboardWorker::new(cmd_rx, event_tx, Arc::new(MockStore::new()))
            .with_recognizer(recognizer);

        worker.start_voice().await;
        let result = worker.voice_rx.recv().await.unwrap();

        // The session is over but its result has not been handled yet.
        worker.start_voice().await;
        assert!(worker.listen.is_listening());
        assert!(matches!(
            event_rx.recv().await,
            Some(DashboardEvent::ListeningChanged { listening: true })
        ));
        match event_rx.recv().await {
            Some(DashboardEvent::Notice(notice)) => assert_eq!(notice.text, "Already listening"),
            other => panic!("unexpected event: {other:?}"),
        }

        worker.finish_voice(result).await;
        assert!(!worker.listen.is_listening());
        assert!(matches!(
            event_rx.recv().await,
            Some(DashboardEvent::ListeningChanged { listening: false })
        ));

        worker.start_voice().await;
        let event = loop {
            match event_rx.recv().await {
                Some(DashboardEvent::Notice(_)) => continue,
                other => break other,
            }
        };
        assert!(matches!(
            event,
            Some(DashboardEvent::ListeningChanged { listening: true })
        ));
    }

    #[tokio::test]
    async fn test_fetch_finished_counts_overlapping_fetches() {
        let store = Arc::new(MockStore::with_readings(vec![Reading::default()]));
        store.set_latency(Duration::from_millis(50));
        let mut h = Harness::start(|w| w, store.clone());

        h.next_matching(|e| matches!(e, DashboardEvent::FetchStarted { ticket: 1 }))
            .await;
        h.cmd_tx.send(Command::Refresh).await.unwrap();
        h.next_matching(|e| matches!(e, DashboardEvent::FetchStarted { ticket: 2 }))
            .await;

        let first = h
            .next_matching(|e| matches!(e, DashboardEvent::FetchFinished { .. }))
            .await;
        assert!(matches!(first, DashboardEvent::FetchFinished { in_flight: 1, .. }));
        let second = h
            .next_matching(|e| matches!(e, DashboardEvent::FetchFinished { .. }))
            .await;
        assert!(matches!(second, DashboardEvent::FetchFinished { in_flight: 0, .. }));

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_rapid_toggles_leave_store_on_last_value() {
        let store = Arc::new(MockStore::new());
        let mut h = Harness::start(|w| w, store.clone());

        for _ in 0..3 {
            h.cmd_tx.send(Command::ToggleSleepMode).await.unwrap();
        }
        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: true }))
            .await;
        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: false }))
            .await;
        h.next_matching(|e| matches!(e, DashboardEvent::SleepModeChanged { enabled: true }))
            .await;

        tokio::time::timeout(WAIT, async {
            while store.sleep_mode_writes().await.len() < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(store.sleep_mode_writes().await, vec![true, false, true]);

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_voice_error_notice() {
        let store = Arc::new(MockStore::new());
        let recognizer = Arc::new(SlowRecognizer {
            transcript: Err("no-speech"),
        });
        let mut h = Harness::start(|w| w.with_recognizer(recognizer), store);

        h.cmd_tx.send(Command::StartVoice).await.unwrap();
        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::Notice(_)))
            .await;
        if let DashboardEvent::Notice(notice) = event {
            assert_eq!(notice.level, NoticeLevel::Error);
            assert_eq!(notice.text, "Error recognizing speech: no-speech");
        }

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_voice_without_recognizer() {
        let store = Arc::new(MockStore::new());
        let mut h = Harness::start(|w| w, store);

        h.cmd_tx.send(Command::StartVoice).await.unwrap();
        let event = h
            .next_matching(|e| matches!(e, DashboardEvent::Notice(_)))
            .await;
        if let DashboardEvent::Notice(notice) = event {
            assert_eq!(notice.level, NoticeLevel::Warning);
        }

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancel_token_stops_worker() {
        let store = Arc::new(MockStore::new());
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, _event_rx) = mpsc::channel(64);
        let worker = DashboardWorker::new(cmd_rx, event_tx, store);
        let token = worker.cancel_token();
        let handle = worker.spawn();

        token.cancel();
        tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
        drop(cmd_tx);
    }
}
