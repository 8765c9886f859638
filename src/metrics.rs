use anyhow::Result;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::interval;

/// Aggregates pipeline counters that the health monitor can report on.
pub struct Metrics {
    samples: AtomicU64,
    fetch_failures: AtomicU64,
    records: AtomicU64,
    store_errors: AtomicU64,
    chart_errors: AtomicU64,
    notifications: AtomicU64,
    notification_failures: AtomicU64,
    last_sample: Mutex<Option<Instant>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            samples: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            records: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
            chart_errors: AtomicU64::new(0),
            notifications: AtomicU64::new(0),
            notification_failures: AtomicU64::new(0),
            last_sample: Mutex::new(None),
        }
    }

    pub fn record_sample(&self) {
        self.samples.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_sample.lock() {
            *guard = Some(Instant::now());
        }
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delta(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chart_error(&self) {
        self.chart_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_failure(&self) {
        self.notification_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last_sample_age = self.last_sample.lock().ok().and_then(|guard| {
            guard.map(|instant| Instant::now().saturating_duration_since(instant))
        });
        HealthSnapshot {
            samples: self.samples.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            chart_errors: self.chart_errors.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
            last_sample_age,
        }
    }
}

pub struct HealthSnapshot {
    pub samples: u64,
    pub fetch_failures: u64,
    pub records: u64,
    pub store_errors: u64,
    pub chart_errors: u64,
    pub notifications: u64,
    pub notification_failures: u64,
    pub last_sample_age: Option<Duration>,
}

pub async fn monitor_health(
    service_name: Arc<String>,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<()>,
    idle_threshold: Duration,
) -> Result<()> {
    let mut ticker = interval(Duration::from_secs(60));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let snapshot = metrics.snapshot();
                tracing::info!(
                    service = %service_name,
                    samples = snapshot.samples,
                    fetch_failures = snapshot.fetch_failures,
                    records = snapshot.records,
                    store_errors = snapshot.store_errors,
                    chart_errors = snapshot.chart_errors,
                    notifications = snapshot.notifications,
                    notification_failures = snapshot.notification_failures,
                    "health heartbeat"
                );
                if let Some(age) = snapshot.last_sample_age {
                    if age > idle_threshold {
                        tracing::warn!(
                            service = %service_name,
                            idle_seconds = ?age.as_secs_f64(),
                            "no successful sample in the last {} seconds",
                            idle_threshold.as_secs()
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.record_sample();
        metrics.record_sample();
        metrics.record_fetch_failure();
        metrics.record_delta();
        metrics.record_notification_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.samples, 2);
        assert_eq!(snapshot.fetch_failures, 1);
        assert_eq!(snapshot.records, 1);
        assert_eq!(snapshot.store_errors, 0);
        assert_eq!(snapshot.notifications, 0);
        assert_eq!(snapshot.notification_failures, 1);
        assert!(snapshot.last_sample_age.is_some());
    }
}
