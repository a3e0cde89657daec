//! Check command implementation.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use sensordash_core::{RemoteStore, Thresholds};

use crate::config::Config;
use crate::format::{CheckResult, FormatOptions, format_check_json, format_check_text, format_report};
use crate::util::{build_dispatcher, connect_store, fetch_readings};

pub async fn cmd_check(
    dispatch: bool,
    json: bool,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let store = connect_store(config)?;
    let readings = fetch_readings(store.as_ref(), quiet).await?;
    let thresholds = Thresholds::new(config.thresholds.clone());

    let alert = thresholds.evaluate(&readings);
    let result = CheckResult::new(&readings, &thresholds, alert.as_ref());
    if json {
        print!("{}", format_check_json(&result, opts)?);
    } else {
        print!("{}", format_check_text(&result, opts));
    }

    if dispatch && let Some(event) = &alert {
        let store: Arc<dyn RemoteStore> = store;
        let dispatcher = build_dispatcher(config, store, None);
        info!(kind = %event.kind, "Dispatching alert");
        let report = dispatcher.dispatch(event).await;
        if !json {
            print!("{}", format_report(&report, opts));
        }
    }

    Ok(())
}
