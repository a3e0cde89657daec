//! Voice command bridge.
//!
//! A [`SpeechRecognizer`] produces one transcript per session; the transcript
//! is turned into a [`VoiceCommand`] by [`VoiceCommand::interpret`]. The
//! shipped recognizer runs an external speech-to-text program and reads the
//! transcript from its standard output.
//!
//! Only one session may run at a time; [`ListenFlag`] enforces this.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Placeholder in recognizer arguments replaced by the configured language.
pub const LANGUAGE_PLACEHOLDER: &str = "{lang}";

/// Environment variable carrying the language to the recognizer program.
pub const LANGUAGE_ENV: &str = "SENSORDASH_VOICE_LANG";

/// A command understood by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Flip sleep mode.
    ToggleSleepMode,
    /// Fetch the readings now.
    Refresh,
    /// Nothing matched; carries the lower-cased transcript.
    Unrecognized(String),
}

impl VoiceCommand {
    /// Interpret a transcript. Matching is case-insensitive and looks for the
    /// phrase anywhere in the transcript; sleep mode is checked first.
    pub fn interpret(transcript: &str) -> Self {
        let command = transcript.trim().to_lowercase();
        if command.contains("sleep mode") {
            Self::ToggleSleepMode
        } else if command.contains("refresh data") {
            Self::Refresh
        } else {
            Self::Unrecognized(command)
        }
    }

    /// Notice text for an unrecognized transcript.
    pub fn unrecognized_text(transcript: &str) -> String {
        format!("Unrecognized command: {}", transcript)
    }
}

/// Notice text for a failed recognition session.
pub fn recognition_error_text(error: &Error) -> String {
    match error {
        Error::Speech(reason) => format!("Error recognizing speech: {}", reason),
        other => format!("Error recognizing speech: {}", other),
    }
}

/// One-shot speech-to-text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen once and return the best transcript.
    async fn recognize(&self) -> Result<String>;
}

/// Settings for the external recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Program to run. Voice input is unavailable when unset.
    pub program: Option<String>,
    /// Arguments; `{lang}` is replaced with `language`.
    pub args: Vec<String>,
    /// BCP 47 language tag.
    pub language: String,
    /// Maximum session length in seconds.
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            language: "en-US".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Recognizer backed by an external program.
///
/// The program is expected to record one utterance and print the transcript
/// on standard output. The first non-empty line is used.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    language: String,
    timeout: Duration,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>) -> Self {
        let defaults = VoiceConfig::default();
        Self {
            program: program.into(),
            args: Vec::new(),
            language: defaults.language,
            timeout: Duration::from_secs(defaults.timeout_secs),
        }
    }

    /// Build from config. Fails when no program is configured.
    pub fn from_config(config: &VoiceConfig) -> Result<Self> {
        let program = config
            .program
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::not_configured("voice.program is not set"))?;
        Ok(Self::new(program)
            .with_args(config.args.clone())
            .with_language(config.language.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs.max(1))))
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: String) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn expanded_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(LANGUAGE_PLACEHOLDER, &self.language))
            .collect()
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn recognize(&self) -> Result<String> {
        debug!(program = %self.program, language = %self.language, "Starting recognizer");

        let child = Command::new(&self.program)
            .args(self.expanded_args())
            .env(LANGUAGE_ENV, &self.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Speech(format!("cannot start {}: {}", self.program, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::timeout("speech recognition", self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(String::from)
                .unwrap_or_else(|| output.status.to_string());
            return Err(Error::Speech(reason));
        }

        first_transcript_line(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| Error::Speech("no-speech".to_string()))
    }
}

fn first_transcript_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(String::from)
}

/// Gate allowing a single recognition session at a time.
#[derive(Debug, Clone, Default)]
pub struct ListenFlag(Arc<AtomicBool>);

impl ListenFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, or `None` if one is already running.
    pub fn try_acquire(&self) -> Option<ListenGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ListenGuard(Arc::clone(&self.0)))
    }

    pub fn is_listening(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Ends the session when dropped.
#[derive(Debug)]
pub struct ListenGuard(Arc<AtomicBool>);

impl Drop for ListenGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
