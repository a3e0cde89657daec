//! Line chart of the most recent readings.

use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType};

use sensordash_core::ChartData;

use super::{AIR_QUALITY_COLOR, HUMIDITY_COLOR, MUTED, TEMPERATURE_COLOR, panel};
use crate::tui::app::App;

pub(super) fn draw_chart(frame: &mut Frame, area: Rect, app: &App) {
    let data = app.chart();
    let temperature = points(&data.temperature);
    let humidity = points(&data.humidity);
    let air_quality = points(&data.air_quality);

    let datasets = vec![
        dataset("Temperature (°C)", &temperature, TEMPERATURE_COLOR),
        dataset("Humidity (%)", &humidity, HUMIDITY_COLOR),
        dataset("Air Quality", &air_quality, AIR_QUALITY_COLOR),
    ];

    let (y_min, y_max) = y_bounds(&data);
    let x_max = data.len().saturating_sub(1).max(1) as f64;

    let chart = Chart::new(datasets)
        .block(panel(" Sensor Readings "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(MUTED))
                .bounds([0.0, x_max])
                .labels(x_labels(&data)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(MUTED))
                .bounds([y_min, y_max])
                .labels([
                    format!("{y_min:.0}"),
                    format!("{:.0}", (y_min + y_max) / 2.0),
                    format!("{y_max:.0}"),
                ]),
        );

    frame.render_widget(chart, area);
}

fn dataset<'a>(name: &'a str, data: &'a [(f64, f64)], color: Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

/// One point per reading, indexed from the left edge.
fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

/// First, middle and last label.
fn x_labels(data: &ChartData) -> Vec<String> {
    match data.labels.as_slice() {
        [] => Vec::new(),
        [only] => vec![only.clone()],
        [first, .., last] => vec![
            first.clone(),
            data.labels[data.len() / 2].clone(),
            last.clone(),
        ],
    }
}

/// Value range with a margin so lines do not sit on the border.
fn y_bounds(data: &ChartData) -> (f64, f64) {
    match data.value_bounds() {
        Some((lo, hi)) => {
            let margin = ((hi - lo) * 0.1).max(1.0);
            ((lo - margin).floor(), (hi + margin).ceil())
        }
        None => (0.0, 1.0),
    }
}
