//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use sensordash_core::table::DEFAULT_CSV_FILE_NAME;
use sensordash_core::{
    AlertDispatcher, AlertLogChannel, AudioCue, CommandRecognizer, DashboardEvent,
    DesktopNotifier, EmailChannel, FirebaseStore, NoticeChannel, Permission, Reading,
    RemoteStore, SpeechRecognizer,
};

use crate::config::Config;
use crate::style;

/// Build the store client from the resolved configuration.
pub fn connect_store(config: &Config) -> Result<Arc<FirebaseStore>> {
    let Some(url) = config.store.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        bail!(
            "No database URL configured. Use --url <URL>, set SENSORDASH_DB_URL, \
             or add `url` under [store] in the config file.\n\
             Run 'sensordash config path' to find the config file."
        );
    };
    let timeout = Duration::from_secs(config.store.timeout_secs.max(1));
    let store = FirebaseStore::with_timeout(url, config.store.auth.clone(), timeout)
        .with_context(|| format!("Invalid database URL: {url}"))?;
    debug!("Using database at {}", store.base_url());
    Ok(Arc::new(store))
}

/// Fetch every reading once, with a spinner on interactive terminals.
pub async fn fetch_readings(store: &dyn RemoteStore, quiet: bool) -> Result<Vec<Reading>> {
    let spinner = style::operation_spinner("Fetching readings...", quiet);
    let result = store.fetch_readings().await;
    spinner.finish_and_clear();
    let readings = result.context("Failed to fetch readings")?;
    debug!("Fetched {} readings", readings.len());
    Ok(readings)
}

/// Build the alert dispatcher with every channel enabled in `[alerts]`.
///
/// The notice channel is only added when a dashboard event sender is given.
pub fn build_dispatcher(
    config: &Config,
    store: Arc<dyn RemoteStore>,
    notice_tx: Option<mpsc::Sender<DashboardEvent>>,
) -> AlertDispatcher {
    let alerts = &config.alerts;
    let mut dispatcher = AlertDispatcher::new();

    if alerts.notice
        && let Some(tx) = notice_tx
    {
        dispatcher.push(Arc::new(NoticeChannel::new(tx)));
    }
    if alerts.desktop {
        dispatcher.push(Arc::new(DesktopNotifier::new(Permission::resolve(true))));
    }
    if alerts.audio {
        dispatcher.push(Arc::new(AudioCue::new()));
    }
    if alerts.email {
        let channel = match EmailChannel::from_config(&config.email) {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "Email channel unavailable");
                EmailChannel::unconfigured()
            }
        };
        dispatcher.push(Arc::new(channel));
    }
    if alerts.alert_log {
        dispatcher.push(Arc::new(AlertLogChannel::new(store)));
    }

    debug!(channels = ?dispatcher.channel_names(), "Alert dispatcher ready");
    dispatcher
}

/// The configured speech recognizer, if any.
pub fn build_recognizer(config: &Config) -> Option<Arc<dyn SpeechRecognizer>> {
    match CommandRecognizer::from_config(&config.voice) {
        Ok(recognizer) => Some(Arc::new(recognizer)),
        Err(e) => {
            debug!(error = %e, "Voice input disabled");
            None
        }
    }
}

/// Where a CSV export goes: the explicit path, or the default file name in
/// the configured export directory.
pub fn export_path(output: Option<&Path>, config: &Config) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => config
            .dashboard
            .export_directory
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_CSV_FILE_NAME),
    }
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensordash_core::MockStore;
    use tempfile::tempdir;

    #[test]
    fn test_connect_store_requires_url() {
        let err = connect_store(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No database URL configured"));

        let mut config = Config::default();
        config.store.url = Some("   ".into());
        assert!(connect_store(&config).is_err());
    }

    #[test]
    fn test_connect_store_with_url() {
        let mut config = Config::default();
        config.store.url = Some("https://node.firebaseio.com/".into());
        let store = connect_store(&config).unwrap();
        assert!(store.base_url().starts_with("https://node.firebaseio.com"));
    }

    #[test]
    fn test_dispatcher_respects_switches() {
        let store: Arc<dyn RemoteStore> = Arc::new(MockStore::new());
        let (tx, _rx) = mpsc::channel(4);

        let all = build_dispatcher(&Config::default(), store.clone(), Some(tx.clone()));
        assert_eq!(
            all.channel_names(),
            vec!["notice", "desktop", "audio", "email", "alert-log"]
        );

        let mut config = Config::default();
        config.alerts.desktop = false;
        config.alerts.audio = false;
        let some = build_dispatcher(&config, store.clone(), None);
        assert_eq!(some.channel_names(), vec!["email", "alert-log"]);
    }

    #[tokio::test]
    async fn test_fetch_readings_reports_failure() {
        let store = MockStore::new();
        store.set_should_fail(true, Some("down")).await;
        let err = fetch_readings(&store, true).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch readings"));

        store.set_should_fail(false, None).await;
        store.push_reading(Reading::default()).await;
        assert_eq!(fetch_readings(&store, true).await.unwrap().len(), 1);
    }

    #[test]
    fn test_recognizer_needs_program() {
        assert!(build_recognizer(&Config::default()).is_none());

        let mut config = Config::default();
        config.voice.program = Some("stt".into());
        assert!(build_recognizer(&config).is_some());
    }

    #[test]
    fn test_export_path() {
        let config = Config::default();
        assert_eq!(export_path(None, &config), Path::new(".").join("sensor_data.csv"));

        let mut config = Config::default();
        config.dashboard.export_directory = Some(PathBuf::from("/tmp/exports"));
        assert_eq!(
            export_path(None, &config),
            PathBuf::from("/tmp/exports/sensor_data.csv")
        );
        assert_eq!(
            export_path(Some(Path::new("out.csv")), &config),
            PathBuf::from("out.csv")
        );
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
