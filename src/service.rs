use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{
    signal,
    sync::watch,
    time::{sleep, Duration},
};

use crate::chart::{
    self, BANS_AXIS_LABEL, DAY_CHART_FILE, DAY_CHART_TITLE, HOUR_CHART_FILE, HOUR_CHART_TITLE,
    TIME_AXIS_LABEL,
};
use crate::config::AppConfig;
use crate::metrics::{self, Metrics};
use crate::notify::Notifier;
use crate::schedule::{Observation, Stamp, TickState};
use crate::stats::StatsClient;
use crate::store::DeltaLog;

pub struct Service {
    config: AppConfig,
}

impl Service {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let AppConfig {
            service_name,
            api_url,
            user_agent,
            webhook_url,
            data_directory,
            poll_interval_seconds,
            idle_threshold_seconds,
            ..
        } = self.config;

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let supervisor_name = Arc::new(service_name);
        let data_directory = Arc::new(data_directory);
        let metrics = Arc::new(Metrics::new());

        tokio::fs::create_dir_all(data_directory.as_str())
            .await
            .with_context(|| format!("failed to create data directory {data_directory}"))?;

        let health_handle = tokio::spawn(metrics::monitor_health(
            supervisor_name.clone(),
            metrics.clone(),
            shutdown_rx.clone(),
            Duration::from_secs(idle_threshold_seconds),
        ));

        let worker_future = {
            let supervisor_name = supervisor_name.clone();
            let data_directory = data_directory.clone();
            let metrics = metrics.clone();
            let mut shutdown_rx = shutdown_rx.clone();
            async move {
                let stats = StatsClient::new(&api_url, &user_agent)?;
                let notifier = match webhook_url.as_deref() {
                    Some(url) => Some(Notifier::new(url)?),
                    None => None,
                };
                let mut pipeline = Pipeline::new(
                    data_directory.as_ref(),
                    &Stamp::now(),
                    notifier,
                    metrics.clone(),
                );
                tracing::info!(
                    service = %supervisor_name,
                    data_dir = %data_directory,
                    url = %api_url,
                    interval_seconds = poll_interval_seconds,
                    webhook = pipeline.notifier_configured(),
                    "ban watch starting"
                );
                loop {
                    let stamp = Stamp::now();
                    pipeline.roll_over(&stamp).await;
                    match stats.fetch().await {
                        Some(current) => {
                            metrics.record_sample();
                            pipeline.apply(&stamp, current).await;
                        }
                        None => {
                            metrics.record_fetch_failure();
                            tracing::warn!(
                                service = %supervisor_name,
                                time = %stamp.time,
                                "no sample this minute, retrying next tick"
                            );
                        }
                    }
                    // Fixed idle wait; the cadence drifts by each tick's own
                    // processing time.
                    tokio::select! {
                        _ = shutdown_rx.changed() => {
                            tracing::info!(service = %supervisor_name, "shutdown requested");
                            break;
                        }
                        _ = sleep(Duration::from_secs(poll_interval_seconds)) => {}
                    }
                }
                Ok(())
            }
        };

        let shutdown_signal = {
            let supervisor_name = supervisor_name.clone();
            let shutdown_tx = shutdown_tx.clone();
            async move {
                signal::ctrl_c().await.ok();
                tracing::info!(service = %supervisor_name, "ctrl-c received, requesting shutdown");
                shutdown_tx.send(()).ok();
            }
        };

        let worker_result = tokio::select! {
            res = worker_future => res,
            _ = shutdown_signal => Ok(()),
        };

        shutdown_tx.send(()).ok();
        health_handle.await??;

        worker_result
    }
}

/// One scheduler tick, start to finish: boundary truncation, delta
/// bookkeeping, log appends, read-back, chart renders and the hourly
/// delivery. The live loop and capture replay both drive their ticks through
/// this type, so the two stay behaviorally identical.
pub struct Pipeline {
    hour_log: DeltaLog,
    day_log: DeltaLog,
    hour_chart: PathBuf,
    day_chart: PathBuf,
    notifier: Option<Notifier>,
    metrics: Arc<Metrics>,
    state: TickState,
}

impl Pipeline {
    /// Binds the pipeline to a data directory. Boundary tracking seeds from
    /// `start`, so the first tick in the same hour and day truncates nothing.
    pub fn new(
        data_dir: impl AsRef<Path>,
        start: &Stamp,
        notifier: Option<Notifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let dir = data_dir.as_ref();
        Self {
            hour_log: DeltaLog::hour(dir),
            day_log: DeltaLog::day(dir),
            hour_chart: dir.join(HOUR_CHART_FILE),
            day_chart: dir.join(DAY_CHART_FILE),
            notifier,
            metrics,
            state: TickState::new(start),
        }
    }

    pub fn notifier_configured(&self) -> bool {
        self.notifier.is_some()
    }

    /// Tick step 1, before any fetch: empty whichever logs crossed their
    /// boundary since the previous tick. A truncate failure is logged and the
    /// tick carries on.
    pub async fn roll_over(&mut self, stamp: &Stamp) {
        let rollover = self.state.rollover(stamp);
        if rollover.hour {
            self.truncate_log(&self.hour_log, "hour", stamp).await;
        }
        if rollover.day {
            self.truncate_log(&self.day_log, "day", stamp).await;
        }
    }

    /// Tick steps 3 onward, given a successful sample: derive and persist the
    /// delta, refresh both charts and deliver at the top of the hour.
    pub async fn apply(&mut self, stamp: &Stamp, current: i64) {
        match self.state.observe(stamp, current) {
            Observation::BaselineEstablished => {
                tracing::info!(
                    time = %stamp.time,
                    staff_total = current,
                    "baseline established, deltas start next tick"
                );
            }
            Observation::Recorded { delta, notify } => {
                self.record(stamp, delta).await;
                if notify {
                    self.deliver().await;
                }
            }
        }
    }

    async fn truncate_log(&self, log: &DeltaLog, scope: &str, stamp: &Stamp) {
        match log.truncate().await {
            Ok(()) => tracing::info!(
                log = %log.path().display(),
                scope,
                time = %stamp.time,
                "boundary crossed, log emptied"
            ),
            Err(err) => {
                self.metrics.record_store_error();
                tracing::error!(
                    log = %log.path().display(),
                    scope,
                    error = %err,
                    "log truncate failed"
                );
            }
        }
    }

    async fn record(&self, stamp: &Stamp, delta: i64) {
        self.metrics.record_delta();
        for log in [&self.hour_log, &self.day_log] {
            if let Err(err) = log.append(&stamp.date, &stamp.time, delta).await {
                self.metrics.record_store_error();
                tracing::error!(
                    log = %log.path().display(),
                    error = %err,
                    "delta append failed"
                );
            }
        }
        tracing::info!(time = %stamp.time, delta, "bans recorded for the last minute");

        self.render_chart(
            &self.hour_log,
            Some(&stamp.date),
            Some(&stamp.hour_label),
            HOUR_CHART_TITLE,
            &self.hour_chart,
        )
        .await;
        self.render_chart(
            &self.day_log,
            Some(&stamp.date),
            None,
            DAY_CHART_TITLE,
            &self.day_chart,
        )
        .await;
    }

    async fn render_chart(
        &self,
        log: &DeltaLog,
        date: Option<&str>,
        hour: Option<&str>,
        title: &str,
        out: &Path,
    ) {
        let series = match log.read(date, hour).await {
            Ok(series) => series,
            Err(err) => {
                self.metrics.record_store_error();
                tracing::error!(
                    log = %log.path().display(),
                    error = %err,
                    "read-back failed, keeping previous chart"
                );
                return;
            }
        };
        if let Err(err) = chart::render(&series, title, TIME_AXIS_LABEL, BANS_AXIS_LABEL, out) {
            self.metrics.record_chart_error();
            tracing::error!(chart = %out.display(), error = %err, "chart render failed");
        }
    }

    async fn deliver(&self) {
        let Some(notifier) = &self.notifier else {
            tracing::warn!("hourly gate reached but no webhook configured, skipping delivery");
            return;
        };
        match notifier
            .send_chart_pair(&self.hour_chart, &self.day_chart)
            .await
        {
            Ok(()) => {
                self.metrics.record_notification();
                tracing::info!("chart pair delivered to webhook");
            }
            Err(err) => {
                self.metrics.record_notification_failure();
                tracing::error!(error = %err, "webhook delivery failed");
            }
        }
    }
}
