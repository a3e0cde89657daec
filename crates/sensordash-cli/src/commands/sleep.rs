//! Sleep command implementation.

use anyhow::{Context, Result};
use tracing::info;

use sensordash_core::{Reading, RemoteStore};

use crate::cli::SleepAction;
use crate::config::Config;
use crate::format::FormatOptions;
use crate::style;
use crate::util::{connect_store, fetch_readings};

pub async fn cmd_sleep(
    action: SleepAction,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let store = connect_store(config)?;
    let enabled = apply(action, store.as_ref(), quiet).await?;
    if !quiet {
        println!("Sleep mode {}", style::on_off_badge(enabled, opts.no_color));
    }
    Ok(())
}

/// Write the sleep mode for `action` and return the value written.
///
/// `Toggle` flips the value carried by the most recent reading, since the
/// node echoes the preference it last saw.
pub(crate) async fn apply(action: SleepAction, store: &dyn RemoteStore, quiet: bool) -> Result<bool> {
    let enabled = match action {
        SleepAction::On => true,
        SleepAction::Off => false,
        SleepAction::Toggle => {
            let readings = fetch_readings(store, quiet).await?;
            !current_sleep_mode(&readings)
        }
    };
    store
        .set_sleep_mode(enabled)
        .await
        .context("Failed to write sleep mode")?;
    info!(enabled, "Sleep mode written");
    Ok(enabled)
}

fn current_sleep_mode(readings: &[Reading]) -> bool {
    readings.last().is_some_and(|r| r.sleep_mode)
}
