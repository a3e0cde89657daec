//! Visual styling utilities for the CLI.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use sensordash_core::NoticeLevel;

/// Braille dots animation
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

const SPINNER_TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

/// Spinner on stderr for a network operation. Hidden when quiet or not a terminal.
pub fn operation_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Prefix for a notice line.
pub fn notice_prefix(level: NoticeLevel, no_color: bool) -> String {
    let label = match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    if no_color {
        return format!("[{label}]");
    }
    match level {
        NoticeLevel::Info => format!("[{}]", label.cyan()),
        NoticeLevel::Success => format!("[{}]", label.green()),
        NoticeLevel::Warning => format!("[{}]", label.yellow()),
        NoticeLevel::Error => format!("[{}]", label.red().bold()),
    }
}

/// A value printed red and bold when `alarm` is set.
pub fn flag_value(text: &str, alarm: bool, no_color: bool) -> String {
    if no_color || !alarm {
        text.to_string()
    } else {
        format!("{}", text.red().bold())
    }
}

pub fn success_text(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.green())
    }
}

/// An On/Off badge.
pub fn on_off_badge(on: bool, no_color: bool) -> String {
    let text = if on { "ON" } else { "OFF" };
    if no_color {
        text.to_string()
    } else if on {
        format!("{}", text.green().bold())
    } else {
        format!("{}", text.dimmed())
    }
}
