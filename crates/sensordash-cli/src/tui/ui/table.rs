//! Readings table with sort indicators and pagination footer.

use ratatui::prelude::*;
use ratatui::widgets::{Cell, Paragraph, Row, Table};

use sensordash_core::{Column, SortDirection};
use sensordash_types::month_name;

use super::{MUTED, panel};
use crate::tui::app::App;

pub(super) fn draw_table(frame: &mut Frame, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let header = Row::new(Column::ALL.iter().map(|&c| {
        let style = if c == app.selected() {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(header_text(app, c)).style(style)
    }));

    let rows = app.page_rows().into_iter().map(|r| {
        Row::new(Column::ALL.iter().map(|&c| {
            let alarm = match c {
                Column::Temperature => app.thresholds.temperature_breached(r.temperature),
                Column::Humidity => app.thresholds.humidity_breached(r.humidity),
                Column::AirQuality => app.thresholds.air_quality_breached(r.air_quality),
                _ => false,
            };
            let style = if alarm {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Cell::from(c.display(r)).style(style)
        }))
    });

    // Timestamp keeps its width, the rest share what is left.
    let widths = std::iter::once(Constraint::Length(20))
        .chain(std::iter::repeat_n(Constraint::Fill(1), Column::ALL.len() - 1));

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(panel(" Readings "));
    frame.render_widget(table, layout[0]);

    let footer = Paragraph::new(footer_text(app)).style(Style::default().fg(MUTED));
    frame.render_widget(footer, layout[1]);
}

fn header_text(app: &App, column: Column) -> String {
    match app.table.sort() {
        Some(sort) if sort.column == column => {
            let arrow = match sort.direction {
                SortDirection::Ascending => "▲",
                SortDirection::Descending => "▼",
            };
            format!("{} {}", column.header(), arrow)
        }
        _ => column.header().to_string(),
    }
}

fn footer_text(app: &App) -> String {
    let rows = app.row_count();
    let month = app
        .table
        .month_filter()
        .and_then(month_name)
        .unwrap_or("All");
    format!(
        " Page {} of {} · {} rows · Month: {} · {} per page",
        app.table.page() + 1,
        app.table.page_count(rows),
        rows,
        month,
        app.table.page_size(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sensordash_core::{DashboardEvent, Reading};
    use tokio::sync::mpsc;

    use crate::config::Config;

    fn app_with(n: usize) -> App {
        let (_tx, rx) = mpsc::channel(1);
        let mut app = App::new(rx, &Config::default());
        let readings = (0..n)
            .map(|i| Reading {
                timestamp: format!("{}-Mar-2024 10:00:00", (i % 28) + 1),
                ..Default::default()
            })
            .collect();
        app.handle_event(DashboardEvent::ReadingsUpdated {
            readings: Arc::new(readings),
        });
        app
    }

    #[test]
    fn test_default_sort_marker() {
        let app = app_with(1);
        assert_eq!(header_text(&app, Column::Timestamp), "Timestamp ▼");
        assert_eq!(header_text(&app, Column::Humidity), "Humidity (%)");
    }

    #[test]
    fn test_footer() {
        let mut app = app_with(25);
        assert_eq!(
            footer_text(&app),
            " Page 1 of 3 · 25 rows · Month: All · 10 per page"
        );
        app.next_page();
        app.next_month();
        app.next_month();
        app.next_month();
        assert_eq!(
            footer_text(&app),
            " Page 1 of 3 · 25 rows · Month: March · 10 per page"
        );
        app.next_month();
        assert_eq!(
            footer_text(&app),
            " Page 1 of 1 · 0 rows · Month: April · 10 per page"
        );
    }
}
