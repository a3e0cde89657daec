//! Export command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use sensordash_core::{Reading, TableView};
use sensordash_types::month_name;

use crate::config::Config;
use crate::util::{connect_store, export_path, fetch_readings};

pub async fn cmd_export(
    month: Option<u8>,
    output: Option<&Path>,
    quiet: bool,
    config: &Config,
) -> Result<()> {
    let store = connect_store(config)?;
    let readings = fetch_readings(store.as_ref(), quiet).await?;

    let path = export_path(output, config);
    let count = write_csv(&readings, month, config.dashboard.page_size, &path)?;

    info!(path = %path.display(), count, "Exported readings");
    if !quiet {
        let scope = month.and_then(month_name).unwrap_or("all months");
        eprintln!("Exported {} readings ({}) to {}", count, scope, path.display());
    }
    Ok(())
}

/// Write the filtered, unpaginated rows. Returns the number of rows written.
pub(crate) fn write_csv(
    readings: &[Reading],
    month: Option<u8>,
    page_size: usize,
    path: &Path,
) -> Result<usize> {
    let mut view = TableView::new(page_size);
    view.set_month_filter(month);
    let count = view.filtered(readings).len();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, view.to_csv(readings))
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn reading(ts: &str) -> Reading {
        Reading {
            timestamp: ts.to_string(),
            temperature: 21.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_export_month_filter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports").join("sensor_data.csv");
        let readings = vec![
            reading("15-March-2024 10:00:00"),
            reading("1-Apr-2024 10:00:00"),
            reading("20-Mar-2024 10:00:00"),
        ];

        let count = write_csv(&readings, Some(3), 10, &path).unwrap();
        assert_eq!(count, 2);

        let csv = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Timestamp,Air Quality,Temperature (°C)"));
        assert!(lines[1].starts_with("15-March-2024"));
        assert!(lines[2].starts_with("20-Mar-2024"));
    }

    #[test]
    fn test_export_all_months() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("all.csv");
        let readings = vec![reading("15-March-2024"), reading("1-Apr-2024")];
        assert_eq!(write_csv(&readings, None, 10, &path).unwrap(), 2);
    }
}
