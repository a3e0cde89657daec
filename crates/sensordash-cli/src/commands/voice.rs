//! Voice command implementation.
//!
//! Either interprets the phrase given on the command line or listens once
//! through the configured recognizer, then runs the matched command.

use anyhow::{Result, anyhow, bail};
use tracing::info;

use sensordash_core::voice::recognition_error_text;
use sensordash_core::{RemoteStore, SpeechRecognizer, Summary, Thresholds, VoiceCommand};

use crate::cli::SleepAction;
use crate::config::Config;
use crate::format::{FormatOptions, format_summary};
use crate::style;
use crate::util::{build_recognizer, connect_store, fetch_readings};

use super::sleep;

pub async fn cmd_voice(
    phrase: Option<String>,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let transcript = match phrase {
        Some(phrase) => phrase,
        None => {
            let Some(recognizer) = build_recognizer(config) else {
                bail!(
                    "Voice input is not configured. Set `program` under [voice] in the config file, \
                     or pass the phrase as an argument."
                );
            };
            listen(recognizer.as_ref(), quiet).await?
        }
    };

    let command = VoiceCommand::interpret(&transcript);
    info!(?command, "Interpreted voice command");
    if let VoiceCommand::Unrecognized(text) = &command {
        println!("{}", VoiceCommand::unrecognized_text(text));
        return Ok(());
    }

    let store = connect_store(config)?;
    let thresholds = Thresholds::new(config.thresholds.clone());
    print!("{}", execute(&command, store.as_ref(), &thresholds, quiet, opts).await?);
    Ok(())
}

async fn listen(recognizer: &dyn SpeechRecognizer, quiet: bool) -> Result<String> {
    let spinner = style::operation_spinner("Listening...", quiet);
    let result = recognizer.recognize().await;
    spinner.finish_and_clear();
    result.map_err(|e| anyhow!(recognition_error_text(&e)))
}

/// Run a recognized command and return what to print.
async fn execute(
    command: &VoiceCommand,
    store: &dyn RemoteStore,
    thresholds: &Thresholds,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<String> {
    match command {
        VoiceCommand::ToggleSleepMode => {
            let enabled = sleep::apply(SleepAction::Toggle, store, quiet).await?;
            Ok(format!(
                "Sleep mode {}\n",
                style::on_off_badge(enabled, opts.no_color)
            ))
        }
        VoiceCommand::Refresh => {
            let readings = fetch_readings(store, quiet).await?;
            Ok(match Summary::from_readings(&readings) {
                Some(summary) => format_summary(&summary, thresholds, opts),
                None => "No data available\n".to_string(),
            })
        }
        VoiceCommand::Unrecognized(text) => Ok(format!("{}\n", VoiceCommand::unrecognized_text(text))),
    }
}
