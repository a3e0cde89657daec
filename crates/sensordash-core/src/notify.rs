//! Local alert channels: desktop notifications and the audio cue.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use sensordash_types::AlertEvent;

use crate::dispatch::{AlertChannel, Delivery};
use crate::error::{Error, Result};

/// Title of every desktop notification.
pub const NOTIFICATION_TITLE: &str = "Alert!";

/// Application name reported to the notification server.
pub const APP_NAME: &str = "sensordash";

/// Whether desktop notifications may be shown.
///
/// Resolved once at startup and never asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

impl Permission {
    /// Resolve the permission from the user's setting and the platform.
    ///
    /// On Linux and the BSDs this also checks that a notification server is
    /// reachable over D-Bus.
    pub fn resolve(enabled: bool) -> Self {
        if !enabled {
            return Self::Denied;
        }
        if notifications_available() {
            Self::Granted
        } else {
            Self::Denied
        }
    }

    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

#[cfg(all(feature = "notifications", unix, not(target_os = "macos")))]
fn notifications_available() -> bool {
    match notify_rust::get_server_information() {
        Ok(info) => {
            debug!(server = %info.name, "Notification server found");
            true
        }
        Err(e) => {
            debug!(error = %e, "No notification server");
            false
        }
    }
}

#[cfg(all(feature = "notifications", not(all(unix, not(target_os = "macos")))))]
fn notifications_available() -> bool {
    true
}

#[cfg(not(feature = "notifications"))]
fn notifications_available() -> bool {
    false
}

/// Shows alerts as native desktop notifications.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    permission: Permission,
}

impl DesktopNotifier {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }
}

#[async_trait]
impl AlertChannel for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<Delivery> {
        if !self.permission.is_granted() {
            return Ok(Delivery::Skipped("permission denied".to_string()));
        }
        show_notification(event.message.clone()).await?;
        Ok(Delivery::Delivered)
    }
}

#[cfg(feature = "notifications")]
async fn show_notification(body: String) -> Result<()> {
    let shown = tokio::task::spawn_blocking(move || {
        let mut notification = notify_rust::Notification::new();
        notification
            .summary(NOTIFICATION_TITLE)
            .body(&body)
            .appname(APP_NAME);

        #[cfg(all(unix, not(target_os = "macos")))]
        notification.urgency(notify_rust::Urgency::Critical);

        notification.show().map(|_| ()).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| Error::Notification(e.to_string()))?;

    shown.map_err(Error::Notification)?;
    debug!("Desktop notification shown");
    Ok(())
}

#[cfg(not(feature = "notifications"))]
async fn show_notification(_body: String) -> Result<()> {
    Err(Error::Notification(
        "built without the notifications feature".to_string(),
    ))
}

type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Rings the terminal bell.
#[derive(Clone)]
pub struct AudioCue {
    out: Option<SharedWriter>,
}

impl std::fmt::Debug for AudioCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCue")
            .field("stdout", &self.out.is_none())
            .finish()
    }
}

impl Default for AudioCue {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCue {
    /// Ring the bell on standard output.
    pub fn new() -> Self {
        Self { out: None }
    }

    /// Ring the bell on a custom writer.
    pub fn with_writer(out: SharedWriter) -> Self {
        Self { out: Some(out) }
    }

    /// Write the BEL character and flush.
    pub fn ring(&self) -> Result<()> {
        match &self.out {
            Some(out) => {
                let mut out = out
                    .lock()
                    .map_err(|_| Error::Io(std::io::Error::other("audio writer poisoned")))?;
                out.write_all(b"\x07")?;
                out.flush()?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(b"\x07")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for AudioCue {
    fn name(&self) -> &'static str {
        "audio"
    }

    async fn deliver(&self, _event: &AlertEvent) -> Result<Delivery> {
        self.ring()?;
        Ok(Delivery::Delivered)
    }
}
