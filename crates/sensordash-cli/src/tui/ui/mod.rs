//! Layout and rendering for the dashboard.
//!
//! - **Header**: title, light and sleep badges, listening and fetch indicators
//! - **Chart**: the most recent readings as three line series
//! - **Table**: paginated, sortable, month-filtered readings
//! - **Status bar**: the latest notice, the transcript prompt or key hints

mod chart;
mod table;

use ratatui::layout::Alignment;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use sensordash_core::NoticeLevel;
use sensordash_core::view::empty_state;

use super::app::App;

pub(crate) const BORDER_TYPE: BorderType = BorderType::Rounded;

pub(crate) const TEMPERATURE_COLOR: Color = Color::Red;
pub(crate) const HUMIDITY_COLOR: Color = Color::Cyan;
pub(crate) const AIR_QUALITY_COLOR: Color = Color::Green;
pub(crate) const MUTED: Color = Color::DarkGray;

/// Draw the complete interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),      // Header
            Constraint::Percentage(45), // Chart
            Constraint::Min(6),         // Table
            Constraint::Length(1),      // Status bar
        ])
        .split(frame.area());

    draw_header(frame, layout[0], app);

    match empty_state(app.loading, app.readings.len()) {
        Some(text) => {
            let placeholder = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(MUTED))
                .block(panel(" Readings "));
            let body = layout[1].union(layout[2]);
            frame.render_widget(placeholder, body);
        }
        None => {
            chart::draw_chart(frame, layout[1], app);
            table::draw_table(frame, layout[2], app);
        }
    }

    draw_status_bar(frame, layout[3], app);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

pub(crate) fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(Style::default().fg(MUTED))
        .title(title)
}

fn badge(label: &'static str, on: bool) -> Span<'static> {
    let (text, style) = if on {
        (
            format!(" {label}: ON "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (format!(" {label}: OFF "), Style::default().fg(MUTED))
    };
    Span::styled(text, style)
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            " sensordash ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        badge("Light", app.light().is_on()),
        Span::raw(" "),
        badge("Sleep", app.sleep_mode),
    ];

    if app.listening {
        spans.push(Span::styled(
            " ● Listening... ",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if app.fetching {
        spans.push(Span::styled(
            format!(" {} Fetching ", app.spinner_char()),
            Style::default().fg(Color::Yellow),
        ));
    }

    if app.last_error.is_some() {
        spans.push(Span::styled(" ERR ", Style::default().fg(Color::Red)));
    }

    if let Some(alert) = &app.last_alert {
        spans.push(Span::styled(
            format!(" ! {} ", alert.kind),
            Style::default().fg(Color::Red),
        ));
    }

    if let Some(summary) = app.summary() {
        spans.push(Span::styled(
            format!(" {} · {} readings ", summary.latest.timestamp, summary.count),
            Style::default().fg(MUTED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(text) = &app.prompt {
        Line::from(vec![
            Span::styled(
                " Command: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(text.as_str()),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ])
    } else if let Some(notice) = app.current_notice() {
        Line::from(Span::styled(
            format!(" {}", notice.text),
            Style::default().fg(notice_color(notice.level)),
        ))
    } else {
        let hints = [
            ("r", "refresh"),
            ("s", "sleep"),
            ("v", "voice"),
            (":", "command"),
            ("e", "export"),
            ("?", "help"),
            ("q", "quit"),
        ];
        let mut spans = Vec::new();
        for (key, label) in hints {
            spans.push(Span::styled(
                format!(" {key}"),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" {label} "),
                Style::default().fg(MUTED),
            ));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn draw_help_overlay(frame: &mut Frame) {
    const HELP: [(&str, &str); 16] = [
        ("r", "Refresh data"),
        ("s", "Toggle sleep mode"),
        ("v", "Voice command"),
        (":", "Type a voice command"),
        ("←/→", "Select column"),
        ("Enter", "Sort by selected column"),
        ("1-8", "Sort by column"),
        ("m / M", "Next / previous month"),
        ("n / p", "Next / previous page"),
        ("Home/End", "First / last page"),
        ("z", "Cycle page size"),
        ("e", "Export CSV"),
        ("?", "Toggle this help"),
        ("Esc", "Close help"),
        ("q", "Quit"),
        ("", "Voice: \"sleep mode\", \"refresh data\""),
    ];

    let area = centered_rect(50, HELP.len() as u16 + 2, frame.area());
    let lines: Vec<Line> = HELP
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:<10}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*desc),
            ])
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(panel(" Help ")), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use sensordash_core::{DashboardEvent, Reading};
    use tokio::sync::mpsc;

    use crate::config::Config;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        let (_tx, rx) = mpsc::channel(1);
        App::new(rx, &Config::default())
    }

    #[test]
    fn test_loading_placeholder() {
        let screen = render(&app());
        assert!(screen.contains("Loading data..."));
        assert!(screen.contains("Light: OFF"));
    }

    #[test]
    fn test_no_data_placeholder() {
        let mut app = app();
        app.handle_event(DashboardEvent::ReadingsUpdated {
            readings: Arc::new(Vec::new()),
        });
        assert!(render(&app).contains("No data available"));
    }

    #[test]
    fn test_renders_table_and_badges() {
        let mut app = app();
        let readings = vec![
            Reading {
                timestamp: "1-Mar-2024 10:00:00".into(),
                temperature: 21.5,
                light_on: true,
                ..Default::default()
            },
            Reading {
                timestamp: "2-Mar-2024 10:00:00".into(),
                temperature: 22.5,
                light_on: true,
                ..Default::default()
            },
        ];
        app.handle_event(DashboardEvent::ReadingsUpdated {
            readings: Arc::new(readings),
        });
        app.handle_event(DashboardEvent::SleepModeChanged { enabled: true });
        app.handle_event(DashboardEvent::ListeningChanged { listening: true });

        let screen = render(&app);
        assert!(screen.contains("Light: ON"));
        assert!(screen.contains("Sleep: ON"));
        assert!(screen.contains("Listening"));
        assert!(screen.contains("Timestamp"));
        assert!(screen.contains("2-Mar-2024 10:00:00"));
        assert!(screen.contains("Page 1 of 1"));
    }

    #[test]
    fn test_prompt_replaces_hints() {
        let mut app = app();
        app.prompt = Some("refresh".into());
        let screen = render(&app);
        assert!(screen.contains("Command: refresh"));
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 20, 10);
        let r = centered_rect(50, 30, area);
        assert_eq!(r, area);
    }
}
