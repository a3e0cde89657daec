//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::macros::format_description;

use sensordash_core::thresholds::window_averages;
use sensordash_core::{
    AlertEvent, Column, DispatchReport, Notice, Reading, Summary, Thresholds, readings_to_csv,
};

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json)
    }
}

/// Readings as a table with the dashboard's columns.
pub fn format_readings_text(
    readings: &[&Reading],
    thresholds: &Thresholds,
    opts: &FormatOptions,
) -> String {
    if readings.is_empty() {
        return "No readings.\n".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(Column::ALL.iter().map(|c| c.header().to_string()));
    for r in readings {
        builder.push_record(Column::ALL.iter().map(|&c| {
            let text = c.display(r);
            let alarm = match c {
                Column::Temperature => thresholds.temperature_breached(r.temperature),
                Column::Humidity => thresholds.humidity_breached(r.humidity),
                Column::AirQuality => thresholds.air_quality_breached(r.air_quality),
                _ => false,
            };
            style::flag_value(&text, alarm, opts.no_color)
        }));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    format!("{table}\n")
}

pub fn format_readings_json(readings: &[&Reading], opts: &FormatOptions) -> Result<String> {
    Ok(format!("{}\n", opts.to_json(readings)?))
}

pub fn format_readings_csv(readings: &[&Reading]) -> String {
    readings_to_csv(readings.iter().copied())
}

/// One-paragraph summary of the latest reading.
pub fn format_summary(summary: &Summary<'_>, thresholds: &Thresholds, opts: &FormatOptions) -> String {
    let r = summary.latest;
    format!(
        "Latest ({}): {}°C  {}%  AQ {}  light {}  sleep {}  [{} readings]\n",
        r.timestamp,
        style::flag_value(
            &format!("{:.1}", r.temperature),
            thresholds.temperature_breached(r.temperature),
            opts.no_color
        ),
        style::flag_value(
            &format!("{:.1}", r.humidity),
            thresholds.humidity_breached(r.humidity),
            opts.no_color
        ),
        style::flag_value(
            &format!("{:.0}", r.air_quality),
            thresholds.air_quality_breached(r.air_quality),
            opts.no_color
        ),
        style::on_off_badge(summary.light.is_on(), opts.no_color),
        style::on_off_badge(r.sleep_mode, opts.no_color),
        summary.count,
    )
}

/// Result of a one-shot threshold check.
#[derive(Debug, Serialize)]
pub struct CheckResult<'a> {
    pub readings: usize,
    pub window: usize,
    pub averages: Option<Averages>,
    pub alert: Option<&'a AlertEvent>,
}

#[derive(Debug, Serialize)]
pub struct Averages {
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: f64,
}

impl<'a> CheckResult<'a> {
    pub fn new(readings: &[Reading], thresholds: &Thresholds, alert: Option<&'a AlertEvent>) -> Self {
        let window = thresholds.config().window;
        let averages = (readings.len() >= window).then(|| {
            let (temperature, humidity, air_quality) =
                window_averages(&readings[readings.len() - window..]);
            Averages {
                temperature,
                humidity,
                air_quality,
            }
        });
        Self {
            readings: readings.len(),
            window,
            averages,
            alert,
        }
    }
}

pub fn format_check_text(result: &CheckResult<'_>, opts: &FormatOptions) -> String {
    let Some(avg) = &result.averages else {
        return format!(
            "Not enough readings to evaluate ({} of {}).\n",
            result.readings, result.window
        );
    };

    let mut out = format!(
        "Last {} readings: {:.1}°C  {:.1}%  AQ {:.1}\n",
        result.window, avg.temperature, avg.humidity, avg.air_quality
    );
    match result.alert {
        Some(event) => out.push_str(&format!("{}\n", format_alert_line(event, opts))),
        None => out.push_str("All metrics within thresholds.\n"),
    }
    out
}

pub fn format_check_json(result: &CheckResult<'_>, opts: &FormatOptions) -> Result<String> {
    Ok(format!("{}\n", opts.to_json(result)?))
}

/// Single line describing an alert.
pub fn format_alert_line(event: &AlertEvent, opts: &FormatOptions) -> String {
    let kind = style::flag_value(event.kind.label(), true, opts.no_color);
    format!(
        "{} {}: {} (avg {:.1}°C, {:.1}%, AQ {:.1})",
        format_clock(event.timestamp),
        kind,
        event.message,
        event.temperature,
        event.humidity,
        event.air_quality,
    )
}

pub fn format_alert_json(event: &AlertEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

/// Per-channel outcome of a dispatch.
pub fn format_report(report: &DispatchReport, opts: &FormatOptions) -> String {
    if report.is_empty() {
        return "No alert channels enabled.\n".to_string();
    }
    let mut out = String::new();
    for name in &report.delivered {
        out.push_str(&format!("  {:<10} {}\n", name, style::success_text("sent", opts.no_color)));
    }
    for (name, reason) in &report.skipped {
        out.push_str(&format!("  {:<10} skipped: {}\n", name, reason));
    }
    for (name, error) in &report.failed {
        out.push_str(&format!(
            "  {:<10} {}\n",
            name,
            style::flag_value(&format!("failed: {error}"), true, opts.no_color)
        ));
    }
    out
}

pub fn format_notice(notice: &Notice, opts: &FormatOptions) -> String {
    format!(
        "{} {} {}",
        format_clock(notice.at),
        style::notice_prefix(notice.level, opts.no_color),
        notice.text
    )
}

fn format_clock(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensordash_core::{AlertKind, ThresholdConfig};
    use time::macros::datetime;

    fn reading(ts: &str, temperature: f64, humidity: f64, air_quality: f64) -> Reading {
        Reading {
            timestamp: ts.to_string(),
            temperature,
            humidity,
            air_quality,
            ..Default::default()
        }
    }

    fn plain() -> FormatOptions {
        FormatOptions::new(true)
    }

    #[test]
    fn test_text_table_has_headers_and_rows() {
        let a = reading("1-Mar-2024 10:00:00", 21.5, 40.0, 12.0);
        let b = reading("2-Mar-2024 10:00:00", 31.0, 40.0, 12.0);
        let out = format_readings_text(&[&a, &b], &Thresholds::default(), &plain());
        assert!(out.contains("Timestamp"));
        assert!(out.contains("Light Status"));
        assert!(out.contains("21.5"));
        assert!(out.contains("2-Mar-2024 10:00:00"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_text_table_empty() {
        assert_eq!(
            format_readings_text(&[], &Thresholds::default(), &plain()),
            "No readings.\n"
        );
    }

    #[test]
    fn test_json_compact_and_pretty() {
        let a = reading("1-Mar-2024", 21.0, 40.0, 12.0);
        let compact = format_readings_json(&[&a], &plain().with_compact(true)).unwrap();
        assert_eq!(compact.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&compact).unwrap();
        assert_eq!(value[0]["temperature"], 21.0);

        let pretty = format_readings_json(&[&a], &plain()).unwrap();
        assert!(pretty.lines().count() > 1);
    }

    #[test]
    fn test_csv_line_count() {
        let a = reading("1-Mar-2024", 21.0, 40.0, 12.0);
        let b = reading("2-Mar-2024", 22.0, 41.0, 13.0);
        assert_eq!(format_readings_csv(&[&a, &b]).lines().count(), 3);
    }

    #[test]
    fn test_check_not_enough_readings() {
        let readings = vec![reading("1-Mar-2024", 35.0, 40.0, 10.0); 3];
        let result = CheckResult::new(&readings, &Thresholds::default(), None);
        assert!(result.averages.is_none());
        assert_eq!(
            format_check_text(&result, &plain()),
            "Not enough readings to evaluate (3 of 5).\n"
        );
    }

    #[test]
    fn test_check_with_alert() {
        let readings: Vec<_> = [31.0, 32.0, 33.0, 34.0, 35.0]
            .into_iter()
            .map(|t| reading("1-Mar-2024", t, 40.0, 10.0))
            .collect();
        let thresholds = Thresholds::new(ThresholdConfig::default());
        let event = thresholds
            .evaluate_at(&readings, datetime!(2024-03-01 12:00:00 UTC))
            .unwrap();
        let result = CheckResult::new(&readings, &thresholds, Some(&event));

        let text = format_check_text(&result, &plain());
        assert!(text.starts_with("Last 5 readings: 33.0°C"));
        assert!(text.contains("12:00:00 Temperature: "));
        assert!(text.contains(AlertKind::Temperature.message()));

        let json: serde_json::Value =
            serde_json::from_str(&format_check_json(&result, &plain()).unwrap()).unwrap();
        assert_eq!(json["alert"]["type"], "Temperature");
        assert_eq!(json["averages"]["temperature"], 33.0);
    }

    #[test]
    fn test_check_within_thresholds() {
        let readings = vec![reading("1-Mar-2024", 20.0, 40.0, 10.0); 5];
        let result = CheckResult::new(&readings, &Thresholds::default(), None);
        assert!(format_check_text(&result, &plain()).ends_with("All metrics within thresholds.\n"));
    }

    #[test]
    fn test_report_lines() {
        let report = DispatchReport {
            delivered: vec!["notice"],
            skipped: vec![("email", "not configured".into())],
            failed: vec![("desktop", "no server".into())],
        };
        let out = format_report(&report, &plain());
        assert!(out.contains("notice     sent"));
        assert!(out.contains("email      skipped: not configured"));
        assert!(out.contains("desktop    failed: no server"));
        assert_eq!(
            format_report(&DispatchReport::default(), &plain()),
            "No alert channels enabled.\n"
        );
    }

    #[test]
    fn test_notice_line() {
        let mut notice = Notice::info("Unrecognized command: hello");
        notice.at = datetime!(2024-03-01 08:15:00 UTC);
        assert_eq!(
            format_notice(&notice, &plain()),
            "08:15:00 [info] Unrecognized command: hello"
        );
    }
}
