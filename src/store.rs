use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

pub const HOUR_LOG_FILE: &str = "hour_data.txt";
pub const DAY_LOG_FILE: &str = "day_data.txt";

/// Parallel time/value columns read back from a delta log, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    pub times: Vec<String>,
    pub values: Vec<i64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One append-only delta log. Every operation opens the file, does its work
/// and closes it again, so no handle survives between ticks and a truncation
/// can land between any two appends.
pub struct DeltaLog {
    path: PathBuf,
}

impl DeltaLog {
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn hour(dir: impl AsRef<Path>) -> Self {
        Self::new(dir, HOUR_LOG_FILE)
    }

    pub fn day(dir: impl AsRef<Path>) -> Self {
        Self::new(dir, DAY_LOG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one `<date> <time> <delta>` line and flushes before returning.
    pub async fn append(&self, date: &str, time: &str, delta: i64) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(format!("{date} {time} {delta}\n").as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }

    /// Empties the log in place. A missing log is created empty.
    pub async fn truncate(&self) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to truncate {}", self.path.display()))?;
        Ok(())
    }

    /// Reads the log back as parallel columns, optionally keeping only lines
    /// whose date token matches `date` and whose time token falls in hour
    /// `hour` (the `HH` prefix of `HH:MM`). Lines without exactly three
    /// whitespace-separated tokens, or whose third token is not an integer,
    /// are skipped. A missing file reads as an empty series.
    pub async fn read(&self, date: Option<&str>, hour: Option<&str>) -> Result<Series> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Series::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        let mut series = Series::default();
        for line in contents.lines() {
            let mut tokens = line.split_whitespace();
            let (Some(date_token), Some(time_token), Some(value_token), None) =
                (tokens.next(), tokens.next(), tokens.next(), tokens.next())
            else {
                continue;
            };
            if date.is_some_and(|wanted| wanted != date_token) {
                continue;
            }
            let line_hour = time_token.split(':').next().unwrap_or(time_token);
            if hour.is_some_and(|wanted| wanted != line_hour) {
                continue;
            }
            let Ok(value) = value_token.parse::<i64>() else {
                continue;
            };
            series.times.push(time_token.to_string());
            series.values.push(value);
        }
        Ok(series)
    }
}
