//! Table view model: month filter, sorting, pagination and CSV export.
//!
//! [`TableView`] holds only view state. Rows are always derived from the
//! current reading sequence, so a refresh never needs to touch the view
//! beyond clamping the page index.

use std::cmp::Ordering;
use std::fmt::Write as _;

use sensordash_types::Reading;

/// Page sizes offered to the user.
pub const PAGE_SIZES: [usize; 4] = [10, 15, 20, 30];

/// The entry of [`PAGE_SIZES`] closest to `size`, preferring the smaller on a tie.
pub fn nearest_page_size(size: usize) -> usize {
    PAGE_SIZES
        .into_iter()
        .min_by_key(|s| s.abs_diff(size))
        .unwrap_or(PAGE_SIZES[0])
}

/// Default export file name.
pub const DEFAULT_CSV_FILE_NAME: &str = "sensor_data.csv";

/// Table columns in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    AirQuality,
    Temperature,
    Humidity,
    LdrStatus,
    SleepMode,
    PirStatus,
    LightStatus,
}

impl Column {
    /// Every column, in display order.
    pub const ALL: [Column; 8] = [
        Column::Timestamp,
        Column::AirQuality,
        Column::Temperature,
        Column::Humidity,
        Column::LdrStatus,
        Column::SleepMode,
        Column::PirStatus,
        Column::LightStatus,
    ];

    /// Header text.
    pub fn header(self) -> &'static str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::AirQuality => "Air Quality",
            Self::Temperature => "Temperature (°C)",
            Self::Humidity => "Humidity (%)",
            Self::LdrStatus => "LDR Status",
            Self::SleepMode => "Sleep Mode",
            Self::PirStatus => "PIR Status",
            Self::LightStatus => "Light Status",
        }
    }

    /// Cell text as shown in the table.
    pub fn display(self, reading: &Reading) -> String {
        match self {
            Self::Timestamp => reading.timestamp.clone(),
            Self::AirQuality => reading.air_quality.to_string(),
            Self::Temperature => reading.temperature.to_string(),
            Self::Humidity => reading.humidity.to_string(),
            Self::LdrStatus => if reading.ldr_value { "Low" } else { "High" }.to_string(),
            Self::SleepMode => on_off(reading.sleep_mode).to_string(),
            Self::PirStatus => if reading.pir_value {
                "Movement"
            } else {
                "No Movement"
            }
            .to_string(),
            Self::LightStatus => on_off(reading.light_on).to_string(),
        }
    }

    /// Cell value as exported: numbers and `true`/`false`.
    pub fn raw(self, reading: &Reading) -> String {
        match self {
            Self::Timestamp => reading.timestamp.clone(),
            Self::AirQuality => reading.air_quality.to_string(),
            Self::Temperature => reading.temperature.to_string(),
            Self::Humidity => reading.humidity.to_string(),
            Self::LdrStatus => reading.ldr_value.to_string(),
            Self::SleepMode => reading.sleep_mode.to_string(),
            Self::PirStatus => reading.pir_value.to_string(),
            Self::LightStatus => reading.light_on.to_string(),
        }
    }

    /// Ascending order of two readings by this column.
    ///
    /// Timestamps compare chronologically; ones that do not parse sort
    /// before all others and compare by their raw text.
    pub fn compare(self, a: &Reading, b: &Reading) -> Ordering {
        match self {
            Self::Timestamp => timestamp_key(a).cmp(&timestamp_key(b)),
            Self::AirQuality => a.air_quality.total_cmp(&b.air_quality),
            Self::Temperature => a.temperature.total_cmp(&b.temperature),
            Self::Humidity => a.humidity.total_cmp(&b.humidity),
            Self::LdrStatus => a.ldr_value.cmp(&b.ldr_value),
            Self::SleepMode => a.sleep_mode.cmp(&b.sleep_mode),
            Self::PirStatus => a.pir_value.cmp(&b.pir_value),
            Self::LightStatus => a.light_on.cmp(&b.light_on),
        }
    }
}

type TimestampKey<'a> = (Option<(i32, u8, u8, u8, u8, u8)>, &'a str);

fn timestamp_key(reading: &Reading) -> TimestampKey<'_> {
    (
        reading.parsed_timestamp().map(|ts| ts.sort_key()),
        reading.timestamp.as_str(),
    )
}

fn on_off(value: bool) -> &'static str {
    if value { "On" } else { "Off" }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(column: Column) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: Column) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// View state of the readings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    month: Option<u8>,
    sort: Option<SortState>,
    page: usize,
    page_size: usize,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new(PAGE_SIZES[0])
    }
}

impl TableView {
    /// Newest first, all months, first page. `page_size` is snapped to
    /// [`PAGE_SIZES`].
    pub fn new(page_size: usize) -> Self {
        Self {
            month: None,
            sort: Some(SortState::descending(Column::Timestamp)),
            page: 0,
            page_size: nearest_page_size(page_size),
        }
    }

    pub fn month_filter(&self) -> Option<u8> {
        self.month
    }

    /// Show only one month (1..=12), or every month with `None`.
    ///
    /// Returns to the first page. Out-of-range months are treated as `None`.
    pub fn set_month_filter(&mut self, month: Option<u8>) {
        self.month = month.filter(|m| (1..=12).contains(m));
        self.page = 0;
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    /// Handle a click on a column header.
    ///
    /// The same column cycles ascending, descending, unsorted; another
    /// column starts ascending.
    pub fn select_sort(&mut self, column: Column) {
        self.sort = match self.sort {
            Some(s) if s.column == column => match s.direction {
                SortDirection::Ascending => Some(SortState::descending(column)),
                SortDirection::Descending => None,
            },
            _ => Some(SortState::ascending(column)),
        };
    }

    /// Zero-based page index.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the page size, keeping the first visible row on screen.
    pub fn set_page_size(&mut self, size: usize) {
        let size = size.max(1);
        let first_row = self.page * self.page_size;
        self.page_size = size;
        self.page = first_row / size;
    }

    /// Switch to the next entry of [`PAGE_SIZES`], wrapping around.
    pub fn cycle_page_size(&mut self) {
        let next = PAGE_SIZES
            .iter()
            .position(|&s| s == self.page_size)
            .map_or(PAGE_SIZES[0], |i| PAGE_SIZES[(i + 1) % PAGE_SIZES.len()]);
        self.set_page_size(next);
    }

    /// Number of pages for `row_count` rows. Never zero.
    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size).max(1)
    }

    pub fn next_page(&mut self, row_count: usize) {
        if self.page + 1 < self.page_count(row_count) {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    pub fn first_page(&mut self) {
        self.page = 0;
    }

    pub fn last_page(&mut self, row_count: usize) {
        self.page = self.page_count(row_count) - 1;
    }

    /// Keep the page index valid after the data changed.
    pub fn clamp_page(&mut self, row_count: usize) {
        self.page = self.page.min(self.page_count(row_count) - 1);
    }

    /// Readings that pass the month filter, in sequence order.
    pub fn filtered<'a>(&self, readings: &'a [Reading]) -> Vec<&'a Reading> {
        match self.month {
            None => readings.iter().collect(),
            Some(month) => readings
                .iter()
                .filter(|r| r.month() == Some(month))
                .collect(),
        }
    }

    /// Filtered and sorted rows.
    pub fn rows<'a>(&self, readings: &'a [Reading]) -> Vec<&'a Reading> {
        let mut rows = self.filtered(readings);
        if let Some(sort) = self.sort {
            rows.sort_by(|a, b| {
                let ord = sort.column.compare(a, b);
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    /// Rows on the current page.
    pub fn page_rows<'a>(&self, readings: &'a [Reading]) -> Vec<&'a Reading> {
        self.rows(readings)
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// CSV of the filtered rows in sequence order, with a header line.
    pub fn to_csv(&self, readings: &[Reading]) -> String {
        readings_to_csv(self.filtered(readings))
    }
}

/// Render readings as CSV with every table column.
pub fn readings_to_csv<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> String {
    let mut out = String::new();
    let header: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
    let _ = writeln!(out, "{}", header.join(","));

    for reading in readings {
        let cells: Vec<String> = Column::ALL
            .iter()
            .map(|c| csv_escape(&c.raw(reading)))
            .collect();
        let _ = writeln!(out, "{}", cells.join(","));
    }
    out
}

/// Escape a CSV field, quoting it only when needed.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(timestamp: &str, temperature: f64) -> Reading {
        Reading {
            timestamp: timestamp.to_string(),
            temperature,
            ..Default::default()
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading("15-March-2024 10:00:00", 21.0),
            reading("2-Apr-2024 08:00:00", 23.5),
            reading("15-Mar-2024 09:00:00", 20.0),
            reading("garbage", 19.0),
            reading("1-1-2025 00:00:00", 25.0),
        ]
    }

    #[test]
    fn test_column_headers_in_order() {
        let headers: Vec<_> = Column::ALL.iter().map(|c| c.header()).collect();
        assert_eq!(
            headers,
            vec![
                "Timestamp",
                "Air Quality",
                "Temperature (°C)",
                "Humidity (%)",
                "LDR Status",
                "Sleep Mode",
                "PIR Status",
                "Light Status",
            ]
        );
    }

    #[test]
    fn test_display_labels() {
        let r = Reading {
            ldr_value: true,
            pir_value: false,
            sleep_mode: true,
            light_on: false,
            temperature: 22.5,
            ..Default::default()
        };
        assert_eq!(Column::LdrStatus.display(&r), "Low");
        assert_eq!(Column::PirStatus.display(&r), "No Movement");
        assert_eq!(Column::SleepMode.display(&r), "On");
        assert_eq!(Column::LightStatus.display(&r), "Off");
        assert_eq!(Column::Temperature.display(&r), "22.5");
        assert_eq!(Column::LdrStatus.raw(&r), "true");
    }

    #[test]
    fn test_month_filter() {
        let readings = sample();
        let mut view = TableView::default();

        view.set_month_filter(Some(3));
        assert_eq!(view.filtered(&readings).len(), 2);
        assert!(
            view.filtered(&readings)
                .iter()
                .any(|r| r.timestamp == "15-March-2024 10:00:00")
        );

        view.set_month_filter(Some(4));
        let april = view.filtered(&readings);
        assert_eq!(april.len(), 1);
        assert!(april.iter().all(|r| r.timestamp != "15-March-2024 10:00:00"));

        view.set_month_filter(None);
        assert_eq!(view.filtered(&readings).len(), 5);
    }

    #[test]
    fn test_page_size_snaps_to_offered_sizes() {
        assert_eq!(nearest_page_size(7), 10);
        assert_eq!(nearest_page_size(0), 10);
        assert_eq!(nearest_page_size(15), 15);
        assert_eq!(nearest_page_size(17), 15);
        assert_eq!(nearest_page_size(18), 20);
        assert_eq!(nearest_page_size(25), 20);
        assert_eq!(nearest_page_size(500), 30);
        assert_eq!(TableView::new(7).page_size(), 10);
    }

    #[test]
    fn test_out_of_range_month_means_all() {
        let mut view = TableView::default();
        view.set_month_filter(Some(13));
        assert_eq!(view.month_filter(), None);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let readings = sample();
        let view = TableView::default();
        let rows = view.rows(&readings);
        assert_eq!(rows[0].timestamp, "1-1-2025 00:00:00");
        assert_eq!(rows[1].timestamp, "2-Apr-2024 08:00:00");
        assert_eq!(rows[2].timestamp, "15-March-2024 10:00:00");
        assert_eq!(rows[3].timestamp, "15-Mar-2024 09:00:00");
        assert_eq!(rows[4].timestamp, "garbage");
    }

    #[test]
    fn test_sort_cycle() {
        let mut view = TableView::default();
        view.select_sort(Column::Temperature);
        assert_eq!(view.sort(), Some(SortState::ascending(Column::Temperature)));
        view.select_sort(Column::Temperature);
        assert_eq!(view.sort(), Some(SortState::descending(Column::Temperature)));
        view.select_sort(Column::Temperature);
        assert_eq!(view.sort(), None);
        view.select_sort(Column::Temperature);
        assert_eq!(view.sort(), Some(SortState::ascending(Column::Temperature)));

        view.select_sort(Column::Humidity);
        assert_eq!(view.sort(), Some(SortState::ascending(Column::Humidity)));
    }

    #[test]
    fn test_default_timestamp_sort_cycles_to_unsorted() {
        let mut view = TableView::default();
        view.select_sort(Column::Timestamp);
        assert_eq!(view.sort(), None);
    }

    #[test]
    fn test_numeric_sort_and_unsorted_order() {
        let readings = sample();
        let mut view = TableView::default();
        view.select_sort(Column::Temperature);
        let temps: Vec<f64> = view.rows(&readings).iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![19.0, 20.0, 21.0, 23.5, 25.0]);

        view.select_sort(Column::Temperature);
        view.select_sort(Column::Temperature);
        let temps: Vec<f64> = view.rows(&readings).iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![21.0, 23.5, 20.0, 19.0, 25.0]);
    }

    #[test]
    fn test_flag_sort_is_stable() {
        let readings = vec![
            Reading {
                timestamp: "a".into(),
                light_on: true,
                ..Default::default()
            },
            Reading {
                timestamp: "b".into(),
                light_on: false,
                ..Default::default()
            },
            Reading {
                timestamp: "c".into(),
                light_on: true,
                ..Default::default()
            },
        ];
        let mut view = TableView::default();
        view.select_sort(Column::LightStatus);
        let order: Vec<&str> = view
            .rows(&readings)
            .iter()
            .map(|r| r.timestamp.as_str())
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_pagination() {
        let readings: Vec<_> = (0..25).map(|i| reading("x", i as f64)).collect();
        let mut view = TableView::new(10);
        assert_eq!(view.page_count(readings.len()), 3);
        assert_eq!(view.page_count(0), 1);

        view.next_page(readings.len());
        view.next_page(readings.len());
        view.next_page(readings.len());
        assert_eq!(view.page(), 2);
        assert_eq!(view.page_rows(&readings).len(), 5);

        view.prev_page();
        view.prev_page();
        view.prev_page();
        assert_eq!(view.page(), 0);

        view.last_page(readings.len());
        assert_eq!(view.page(), 2);
        view.first_page();
        assert_eq!(view.page(), 0);
    }

    #[test]
    fn test_page_size_change_keeps_first_row() {
        let mut view = TableView::new(10);
        view.next_page(100);
        view.next_page(100);
        view.next_page(100);
        assert_eq!(view.page(), 3);

        view.set_page_size(15);
        assert_eq!(view.page(), 2);
        assert!(view.page() * 15 <= 30 && 30 < (view.page() + 1) * 15);

        view.set_page_size(30);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_cycle_page_size() {
        let mut view = TableView::default();
        let sizes: Vec<usize> = (0..4)
            .map(|_| {
                view.cycle_page_size();
                view.page_size()
            })
            .collect();
        assert_eq!(sizes, vec![15, 20, 30, 10]);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut view = TableView::new(10);
        view.next_page(50);
        view.set_month_filter(Some(3));
        assert_eq!(view.page(), 0);
    }

    #[test]
    fn test_refresh_clamps_page() {
        let mut view = TableView::new(10);
        view.last_page(50);
        assert_eq!(view.page(), 4);
        view.clamp_page(12);
        assert_eq!(view.page(), 1);
        view.clamp_page(0);
        assert_eq!(view.page(), 0);
    }

    #[test]
    fn test_csv_export() {
        let readings = sample();
        let mut view = TableView::default();
        view.set_month_filter(Some(3));

        let csv = view.to_csv(&readings);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Timestamp,Air Quality,Temperature (°C),Humidity (%),LDR Status,Sleep Mode,PIR Status,Light Status"
        );
        assert_eq!(
            lines[1],
            "15-March-2024 10:00:00,0,21,0,false,false,false,false"
        );
        assert!(lines[2].starts_with("15-Mar-2024 09:00:00,"));
    }

    #[test]
    fn test_csv_export_ignores_sort_and_page() {
        let readings = sample();
        let mut view = TableView::new(10);
        view.select_sort(Column::Temperature);
        let csv = view.to_csv(&readings);
        assert_eq!(csv.lines().count(), readings.len() + 1);
        assert!(csv.lines().nth(1).unwrap().starts_with("15-March-2024"));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("simple"), "simple");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_csv_quotes_timestamp_with_comma() {
        let csv = readings_to_csv(&[reading("15 Mar, 2024", 20.0)]);
        assert!(csv.lines().nth(1).unwrap().starts_with("\"15 Mar, 2024\","));
    }
}
