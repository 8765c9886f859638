use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::{path::Path, sync::Arc};
use tokio::fs;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::schedule::Stamp;
use crate::service::Pipeline;

/// Replays a newline-delimited capture of `YYYY-MM-DD HH:MM <counter>`
/// samples through the regular tick pipeline: rollover truncation, delta
/// derivation, log appends and chart renders, with no network and no pacing.
/// No notifier is attached, so the hourly gate logs its skip instead of
/// posting anywhere.
pub async fn replay_capture(capture_path: impl AsRef<Path>, config: &AppConfig) -> Result<()> {
    let capture_path = capture_path.as_ref();
    let raw = fs::read_to_string(capture_path)
        .await
        .with_context(|| format!("failed to read capture {}", capture_path.display()))?;

    fs::create_dir_all(&config.data_directory)
        .await
        .with_context(|| {
            format!("failed to create data directory {}", config.data_directory)
        })?;

    let metrics = Arc::new(Metrics::new());
    // Boundary tracking seeds from the first capture stamp, not the wall
    // clock, so replays of old captures start clean.
    let mut pipeline: Option<Pipeline> = None;
    let mut rejected = 0u64;

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((stamp, value)) = parse_capture_line(line) else {
            rejected += 1;
            tracing::warn!(line = %line, "capture line rejected");
            continue;
        };
        let pipeline = pipeline.get_or_insert_with(|| {
            Pipeline::new(&config.data_directory, &stamp, None, metrics.clone())
        });
        pipeline.roll_over(&stamp).await;
        metrics.record_sample();
        pipeline.apply(&stamp, value).await;
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        samples = snapshot.samples,
        records = snapshot.records,
        store_errors = snapshot.store_errors,
        chart_errors = snapshot.chart_errors,
        rejected_lines = rejected,
        data_dir = %config.data_directory,
        "capture replay completed"
    );
    Ok(())
}

/// Parses one capture line into a stamp and counter value. Anything that is
/// not exactly `date time counter` with a well-formed date, time and integer
/// is rejected.
fn parse_capture_line(line: &str) -> Option<(Stamp, i64)> {
    let mut tokens = line.split_whitespace();
    let (Some(date), Some(time), Some(value), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return None;
    };
    let at = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").ok()?;
    let value = value.parse::<i64>().ok()?;
    Some((Stamp::from_naive(at), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let (stamp, value) = parse_capture_line("2024-01-01 10:01 1007").expect("parse");
        assert_eq!(stamp.date, "2024-01-01");
        assert_eq!(stamp.time, "10:01");
        assert_eq!(value, 1007);
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert!(parse_capture_line("2024-01-01 10:01").is_none());
        assert!(parse_capture_line("2024-01-01 10:01 1007 extra").is_none());
    }

    #[test]
    fn rejects_bad_timestamp() {
        assert!(parse_capture_line("2024-13-01 10:01 1007").is_none());
        assert!(parse_capture_line("2024-01-01 99:99 1007").is_none());
        assert!(parse_capture_line("yesterday 10:01 1007").is_none());
    }

    #[test]
    fn rejects_non_integer_counter() {
        assert!(parse_capture_line("2024-01-01 10:01 many").is_none());
        assert!(parse_capture_line("2024-01-01 10:01 10.5").is_none());
    }

    #[test]
    fn accepts_negative_counter() {
        let (_, value) = parse_capture_line("2024-01-01 10:01 -3").expect("parse");
        assert_eq!(value, -3);
    }
}
