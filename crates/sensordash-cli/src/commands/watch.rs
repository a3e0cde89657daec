//! Watch command implementation.
//!
//! Runs the dashboard worker without a UI: readings are polled on the
//! configured interval, thresholds are evaluated after every fetch and
//! alerts go out through the enabled channels. Summaries and alerts are
//! printed to stdout, notices to stderr. Alerts are already printed, so the
//! dashboard notice channel is left out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sensordash_core::{
    AlertDispatcher, Command, DashboardEvent, DashboardWorker, RemoteStore, Summary, Thresholds,
};

use crate::config::Config;
use crate::format::{FormatOptions, format_alert_json, format_alert_line, format_notice, format_summary};
use crate::util::{build_dispatcher, connect_store};

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub interval: Option<u64>,
    pub json: bool,
    pub no_dispatch: bool,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
    pub config: &'a Config,
}

/// A line of watch output.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Out(String),
    Err(String),
}

pub async fn cmd_watch(args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        interval,
        json,
        no_dispatch,
        quiet,
        opts,
        config,
    } = args;

    let store: Arc<dyn RemoteStore> = connect_store(config)?;
    let poll_interval = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.polling.interval());
    let thresholds = Thresholds::new(config.thresholds.clone());

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(16);
    let (event_tx, mut event_rx) = mpsc::channel::<DashboardEvent>(64);

    let dispatcher = headless_dispatcher(config, Arc::clone(&store), no_dispatch);

    let handle = DashboardWorker::new(cmd_rx, event_tx, store)
        .with_thresholds(thresholds.clone())
        .with_dispatcher(dispatcher)
        .with_poll_interval(poll_interval)
        .spawn();

    if !quiet {
        eprintln!(
            "Watching every {}s (Ctrl+C to stop)...",
            poll_interval.as_secs()
        );
    }
    info!(interval_secs = poll_interval.as_secs(), "Watch started");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if !quiet {
                    eprintln!("\nShutting down...");
                }
                break;
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    warn!("Worker stopped unexpectedly");
                    break;
                };
                match describe(&event, &thresholds, json, quiet, opts) {
                    Some(Line::Out(line)) => println!("{line}"),
                    Some(Line::Err(line)) => eprintln!("{line}"),
                    None => {}
                }
            }
        }
    }

    let _ = cmd_tx.send(Command::Shutdown).await;
    handle.await.context("Worker task failed")?;
    info!("Watch stopped");
    Ok(())
}

/// Every configured channel except the dashboard notice.
fn headless_dispatcher(
    config: &Config,
    store: Arc<dyn RemoteStore>,
    no_dispatch: bool,
) -> AlertDispatcher {
    if no_dispatch {
        AlertDispatcher::new()
    } else {
        build_dispatcher(config, store, None)
    }
}

/// What to print for a worker event, if anything.
fn describe(
    event: &DashboardEvent,
    thresholds: &Thresholds,
    json: bool,
    quiet: bool,
    opts: &FormatOptions,
) -> Option<Line> {
    match event {
        DashboardEvent::ReadingsUpdated { readings } => {
            if json || quiet {
                return None;
            }
            Summary::from_readings(readings).map(|summary| {
                Line::Out(
                    format_summary(&summary, thresholds, opts)
                        .trim_end()
                        .to_string(),
                )
            })
        }
        DashboardEvent::AlertRaised { event } => {
            if json {
                match format_alert_json(event) {
                    Ok(line) => Some(Line::Out(line)),
                    Err(e) => {
                        warn!(error = %e, "Failed to encode alert");
                        None
                    }
                }
            } else {
                Some(Line::Out(format_alert_line(event, opts)))
            }
        }
        DashboardEvent::AlertDispatched { report } => {
            for (name, error) in &report.failed {
                warn!(channel = name, error = %error, "Alert channel failed");
            }
            debug!(delivered = ?report.delivered, "Alert dispatched");
            None
        }
        DashboardEvent::FetchFailed { error } => {
            (!quiet).then(|| Line::Err(format!("Fetch failed: {error}")))
        }
        DashboardEvent::Notice(notice) => (!quiet).then(|| Line::Err(format_notice(notice, opts))),
        DashboardEvent::FetchStarted { ticket } => {
            debug!(ticket, "Fetch started");
            None
        }
        DashboardEvent::FetchFinished { ticket, in_flight } => {
            debug!(ticket, in_flight, "Fetch finished");
            None
        }
        DashboardEvent::SleepModeChanged { .. } | DashboardEvent::ListeningChanged { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensordash_core::{AlertEvent, AlertKind, MockStore, Notice, Reading};
    use time::macros::datetime;

    fn plain() -> FormatOptions {
        FormatOptions::new(true)
    }

    fn alert() -> AlertEvent {
        AlertEvent::new(
            AlertKind::Humidity,
            22.0,
            64.2,
            20.0,
            datetime!(2024-03-05 14:03:09 UTC),
        )
    }

    #[test]
    fn test_readings_print_summary() {
        let readings = Arc::new(vec![Reading {
            timestamp: "5-Mar-2024 14:00:00".into(),
            temperature: 22.0,
            ..Default::default()
        }]);
        let event = DashboardEvent::ReadingsUpdated { readings };
        let t = Thresholds::default();

        match describe(&event, &t, false, false, &plain()) {
            Some(Line::Out(line)) => assert!(line.starts_with("Latest (5-Mar-2024 14:00:00)")),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(describe(&event, &t, true, false, &plain()), None);
        assert_eq!(describe(&event, &t, false, true, &plain()), None);
    }

    #[test]
    fn test_alert_text_and_json() {
        let event = DashboardEvent::AlertRaised { event: alert() };
        let t = Thresholds::default();

        match describe(&event, &t, false, true, &plain()) {
            Some(Line::Out(line)) => {
                assert!(line.starts_with("14:03:09 Humidity: "));
                assert!(line.contains("64.2%"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        match describe(&event, &t, true, true, &plain()) {
            Some(Line::Out(line)) => {
                let value: serde_json::Value = serde_json::from_str(&line).unwrap();
                assert_eq!(value["type"], "Humidity");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_notices_go_to_stderr() {
        let mut notice = Notice::error("Humidity is currently in an uncomfortable stage!");
        notice.at = datetime!(2024-03-05 14:03:09 UTC);
        let t = Thresholds::default();

        assert_eq!(
            describe(&DashboardEvent::Notice(notice.clone()), &t, false, false, &plain()),
            Some(Line::Err(
                "14:03:09 [error] Humidity is currently in an uncomfortable stage!".into()
            ))
        );
        assert_eq!(
            describe(&DashboardEvent::Notice(notice), &t, false, true, &plain()),
            None
        );
        assert_eq!(
            describe(
                &DashboardEvent::FetchFailed {
                    error: "timeout".into()
                },
                &t,
                false,
                false,
                &plain()
            ),
            Some(Line::Err("Fetch failed: timeout".into()))
        );
    }

    #[test]
    fn test_alerts_are_not_echoed_as_notices() {
        let store: Arc<dyn RemoteStore> = Arc::new(MockStore::new());
        let config = Config::default();

        let dispatcher = headless_dispatcher(&config, Arc::clone(&store), false);
        assert!(!dispatcher.channel_names().contains(&"notice"));
        assert!(dispatcher.channel_names().contains(&"alert-log"));

        assert!(headless_dispatcher(&config, store, true)
            .channel_names()
            .is_empty());
    }

    #[test]
    fn test_state_events_are_silent() {
        let t = Thresholds::default();
        assert_eq!(
            describe(
                &DashboardEvent::SleepModeChanged { enabled: true },
                &t,
                false,
                false,
                &plain()
            ),
            None
        );
        assert_eq!(
            describe(&DashboardEvent::FetchStarted { ticket: 1 }, &t, false, false, &plain()),
            None
        );
    }
}
