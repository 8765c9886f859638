use anyhow::{anyhow, Result};
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;

use crate::store::Series;

pub const HOUR_CHART_FILE: &str = "staff_bans_hour.png";
pub const DAY_CHART_FILE: &str = "staff_bans_day.png";

pub const HOUR_CHART_TITLE: &str = "Staff bans over the last hour";
pub const DAY_CHART_TITLE: &str = "Staff bans over the last day";
pub const TIME_AXIS_LABEL: &str = "Time";
pub const BANS_AXIS_LABEL: &str = "Bans";

const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 500;

/// Renders the series as a blue line with circular sample markers, one point
/// per log line, the stored `HH:MM` strings as rotated x tick labels and an
/// integer y axis with grid lines. An empty series still produces a complete
/// chart, just with no points on it. The file at `out_path` is replaced
/// wholesale on every call.
pub fn render(
    series: &Series,
    title: &str,
    x_label: &str,
    y_label: &str,
    out_path: &Path,
) -> Result<()> {
    let root = BitMapBackend::new(out_path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|err| anyhow!("failed to clear canvas for {}: {err}", out_path.display()))?;

    let x_max = series.len().max(1) as i64;
    let y_min = series.values.iter().copied().min().unwrap_or(0).min(0);
    let y_max = series.values.iter().copied().max().unwrap_or(0) + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(12)
        .x_label_area_size(70)
        .y_label_area_size(60)
        .build_cartesian_2d(0i64..x_max, y_min..y_max)
        .map_err(|err| anyhow!("failed to lay out {}: {err}", out_path.display()))?;

    let tick_label = |index: &i64| -> String {
        series
            .times
            .get(*index as usize)
            .cloned()
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .x_labels(series.len().clamp(1, 30))
        .x_label_formatter(&tick_label)
        .y_label_formatter(&|value| value.to_string())
        .x_label_style(
            ("sans-serif", 14)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()
        .map_err(|err| anyhow!("failed to draw mesh for {}: {err}", out_path.display()))?;

    let points: Vec<(i64, i64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(index, value)| (index as i64, *value))
        .collect();
    chart
        .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))
        .map_err(|err| anyhow!("failed to draw line for {}: {err}", out_path.display()))?;
    chart
        .draw_series(
            points
                .iter()
                .map(|point| Circle::new(*point, 4, BLUE.filled())),
        )
        .map_err(|err| anyhow!("failed to draw markers for {}: {err}", out_path.display()))?;

    root.present()
        .map_err(|err| anyhow!("failed to write {}: {err}", out_path.display()))?;
    Ok(())
}
