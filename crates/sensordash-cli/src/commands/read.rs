//! Read command implementation.

use std::path::PathBuf;

use anyhow::Result;

use sensordash_core::{Reading, Summary, Thresholds};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{
    FormatOptions, format_readings_csv, format_readings_json, format_readings_text, format_summary,
};
use crate::util::{connect_store, fetch_readings, write_output};

/// Arguments for the read command.
pub struct ReadArgs<'a> {
    pub last: Option<usize>,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
    pub config: &'a Config,
}

pub async fn cmd_read(args: ReadArgs<'_>) -> Result<()> {
    let ReadArgs {
        last,
        format,
        output,
        quiet,
        opts,
        config,
    } = args;

    let store = connect_store(config)?;
    let readings = fetch_readings(store.as_ref(), quiet).await?;
    let thresholds = Thresholds::new(config.thresholds.clone());

    let content = render(&readings, last, format, quiet, &thresholds, opts)?;
    write_output(output, &content)
}

fn render(
    readings: &[Reading],
    last: Option<usize>,
    format: OutputFormat,
    quiet: bool,
    thresholds: &Thresholds,
    opts: &FormatOptions,
) -> Result<String> {
    let start = last.map_or(0, |n| readings.len().saturating_sub(n));
    let rows: Vec<&Reading> = readings[start..].iter().collect();

    let content = match format {
        OutputFormat::Text => {
            let mut out = format_readings_text(&rows, thresholds, opts);
            if !quiet && let Some(summary) = Summary::from_readings(readings) {
                out.push_str(&format_summary(&summary, thresholds, opts));
            }
            out
        }
        OutputFormat::Json => format_readings_json(&rows, opts)?,
        OutputFormat::Csv => format_readings_csv(&rows),
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(n: usize) -> Vec<Reading> {
        (0..n)
            .map(|i| Reading {
                timestamp: format!("{}-Mar-2024 10:00:00", i + 1),
                temperature: 20.0 + i as f64,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_last_keeps_most_recent() {
        let opts = FormatOptions::new(true);
        let csv = render(
            &readings(10),
            Some(3),
            OutputFormat::Csv,
            true,
            &Thresholds::default(),
            &opts,
        )
        .unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("8-Mar-2024"));
        assert!(lines[3].starts_with("10-Mar-2024"));
    }

    #[test]
    fn test_last_larger_than_sequence() {
        let opts = FormatOptions::new(true);
        let csv = render(
            &readings(2),
            Some(50),
            OutputFormat::Csv,
            true,
            &Thresholds::default(),
            &opts,
        )
        .unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_text_includes_summary_unless_quiet() {
        let opts = FormatOptions::new(true);
        let t = Thresholds::default();
        let loud = render(&readings(2), None, OutputFormat::Text, false, &t, &opts).unwrap();
        assert!(loud.contains("Latest (2-Mar-2024 10:00:00)"));
        let quiet = render(&readings(2), None, OutputFormat::Text, true, &t, &opts).unwrap();
        assert!(!quiet.contains("Latest"));
    }
}
