//! Application state for the TUI.
//!
//! The [`App`] holds rendered copies of what the worker reports plus the
//! purely local view state: table sort, filter and page, the transcript
//! prompt and transient notices.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use sensordash_core::table::DEFAULT_CSV_FILE_NAME;
use sensordash_core::{
    AlertEvent, ChartData, Column, DashboardEvent, LightStatus, Notice, Reading, Summary,
    TableView, Thresholds,
};

use crate::config::Config;

/// Maximum number of notices kept on screen.
const MAX_NOTICES: usize = 5;

/// How long a notice stays visible.
const NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct App {
    /// Latest reading sequence, in store order.
    pub readings: Arc<Vec<Reading>>,
    /// No fetch has completed yet.
    pub loading: bool,
    /// At least one fetch is in flight.
    pub fetching: bool,
    pub last_error: Option<String>,
    pub last_update: Option<Instant>,
    pub sleep_mode: bool,
    pub listening: bool,
    pub last_alert: Option<AlertEvent>,
    pub table: TableView,
    /// Column the sort key acts on.
    pub selected_column: usize,
    pub chart_points: usize,
    pub thresholds: Thresholds,
    /// Text typed at the `:` prompt, when open.
    pub prompt: Option<String>,
    pub show_help: bool,
    notices: Vec<(Notice, Instant)>,
    export_dir: Option<PathBuf>,
    spinner_frame: usize,
    should_quit: bool,
    pub event_rx: mpsc::Receiver<DashboardEvent>,
}

impl App {
    pub fn new(event_rx: mpsc::Receiver<DashboardEvent>, config: &Config) -> Self {
        Self {
            readings: Arc::new(Vec::new()),
            loading: true,
            fetching: false,
            last_error: None,
            last_update: None,
            sleep_mode: false,
            listening: false,
            last_alert: None,
            table: TableView::new(config.dashboard.page_size),
            selected_column: 0,
            chart_points: config.dashboard.chart_points.max(1),
            thresholds: Thresholds::new(config.thresholds.clone()),
            prompt: None,
            show_help: false,
            notices: Vec::new(),
            export_dir: config.dashboard.export_directory.clone(),
            spinner_frame: 0,
            should_quit: false,
            event_rx,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Apply an event from the worker.
    pub fn handle_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::FetchStarted { .. } => {
                self.fetching = true;
            }
            DashboardEvent::ReadingsUpdated { readings } => {
                self.loading = false;
                self.last_error = None;
                self.last_update = Some(Instant::now());
                self.readings = readings;
                let rows = self.row_count();
                self.table.clamp_page(rows);
            }
            DashboardEvent::FetchFailed { error } => {
                self.loading = false;
                self.push_notice(Notice::warning(format!("Fetch failed: {error}")));
                self.last_error = Some(error);
            }
            DashboardEvent::FetchFinished { in_flight, .. } => {
                self.fetching = in_flight > 0;
            }
            DashboardEvent::AlertRaised { event } => {
                self.last_alert = Some(event);
            }
            DashboardEvent::AlertDispatched { report } => {
                for (name, error) in &report.failed {
                    warn!(channel = name, error = %error, "Alert channel failed");
                }
            }
            DashboardEvent::Notice(notice) => self.push_notice(notice),
            DashboardEvent::SleepModeChanged { enabled } => {
                self.sleep_mode = enabled;
            }
            DashboardEvent::ListeningChanged { listening } => {
                self.listening = listening;
            }
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push((notice, Instant::now()));
        while self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }

    pub fn clean_expired_notices(&mut self) {
        self.notices
            .retain(|(_, created)| created.elapsed() < NOTICE_TIMEOUT);
    }

    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.last().map(|(n, _)| n)
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 10;
    }

    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.spinner_frame]
    }

    pub fn summary(&self) -> Option<Summary<'_>> {
        Summary::from_readings(&self.readings)
    }

    pub fn light(&self) -> LightStatus {
        LightStatus::from_readings(&self.readings)
    }

    pub fn chart(&self) -> ChartData {
        ChartData::from_readings(&self.readings, self.chart_points)
    }

    /// Rows passing the month filter.
    pub fn row_count(&self) -> usize {
        self.table.filtered(&self.readings).len()
    }

    pub fn page_rows(&self) -> Vec<&Reading> {
        self.table.page_rows(&self.readings)
    }

    pub fn selected(&self) -> Column {
        Column::ALL[self.selected_column % Column::ALL.len()]
    }

    pub fn select_next_column(&mut self) {
        self.selected_column = (self.selected_column + 1) % Column::ALL.len();
    }

    pub fn select_previous_column(&mut self) {
        self.selected_column = (self.selected_column + Column::ALL.len() - 1) % Column::ALL.len();
    }

    /// Cycle the sort of the selected column.
    pub fn sort_selected(&mut self) {
        let column = self.selected();
        self.table.select_sort(column);
    }

    /// Sort by column `index` directly, making it the selected column.
    pub fn sort_by_index(&mut self, index: usize) {
        if index < Column::ALL.len() {
            self.selected_column = index;
            self.sort_selected();
        }
    }

    /// All → January → ... → December → All.
    pub fn next_month(&mut self) {
        let next = match self.table.month_filter() {
            None => Some(1),
            Some(12) => None,
            Some(m) => Some(m + 1),
        };
        self.table.set_month_filter(next);
    }

    pub fn previous_month(&mut self) {
        let prev = match self.table.month_filter() {
            None => Some(12),
            Some(1) => None,
            Some(m) => Some(m - 1),
        };
        self.table.set_month_filter(prev);
    }

    pub fn next_page(&mut self) {
        let rows = self.row_count();
        self.table.next_page(rows);
    }

    pub fn last_page(&mut self) {
        let rows = self.row_count();
        self.table.last_page(rows);
    }

    /// Write the filtered rows and report the outcome as a notice.
    pub fn export_csv(&mut self) {
        match self.write_export() {
            Ok((path, count)) => {
                info!(path = %path.display(), count, "Exported readings");
                self.push_notice(Notice::success(format!(
                    "Exported {} rows to {}",
                    count,
                    path.display()
                )));
            }
            Err(e) => {
                warn!(error = %e, "Export failed");
                self.push_notice(Notice::error(format!("Export failed: {e:#}")));
            }
        }
    }

    fn write_export(&self) -> Result<(PathBuf, usize)> {
        let dir = self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        let path = dir.join(DEFAULT_CSV_FILE_NAME);
        fs::write(&path, self.table.to_csv(&self.readings))
            .with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok((path, self.row_count()))
    }
}
