use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dedup::DedupTracker;
use super::evaluator::StateEvaluator;
use super::prober::Prober;
use crate::models::Monitor;
use crate::store::{MonitorRegistry, StoreError};

/// Cadence knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Default spacing between probes for monitors without an override.
    pub probe_interval: Duration,
    /// How often the job set is rebuilt from the registry.
    pub resync_interval: Duration,
    /// Grace period before a rebuild, letting in-flight probes settle.
    pub settle_delay: Duration,
    /// Default probe timeout for monitors without an override.
    pub probe_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(60),
            resync_interval: Duration::from_secs(600),
            settle_delay: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

/// Handle to one monitor's recurring probe task.
///
/// Stopping only suppresses future ticks; a probe already in flight runs
/// to completion and its outcome is still evaluated.
struct CheckJob {
    monitor_id: Uuid,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CheckJob {
    fn stop(&self) {
        // watch keeps only the latest value, so double-stop is a no-op.
        let _ = self.stop_tx.send(true);
    }
}

/// Owns the live check-job set and keeps it synchronized with the
/// registry.
///
/// Resynchronization is full-replace: after a successful fetch the old
/// job set is stopped and a fresh one is created under the same lock, so
/// no monitor ever has two live jobs and no stale job survives a cycle.
pub struct Scheduler {
    registry: Arc<dyn MonitorRegistry>,
    prober: Arc<dyn Prober>,
    evaluator: Arc<StateEvaluator>,
    dedup: DedupTracker,
    settings: SchedulerSettings,
    jobs: Mutex<Vec<CheckJob>>,
}

impl Scheduler {
    pub fn new(
        registry: Arc<dyn MonitorRegistry>,
        prober: Arc<dyn Prober>,
        evaluator: Arc<StateEvaluator>,
        dedup: DedupTracker,
        settings: SchedulerSettings,
    ) -> Self {
        Self { registry, prober, evaluator, dedup, settings, jobs: Mutex::new(Vec::new()) }
    }

    /// Populate the job set and start the resynchronization timer.
    pub async fn start(self: Arc<Self>) -> Result<(), StoreError> {
        let count = self.rebuild_jobs().await?;
        info!("Scheduled {count} monitor check jobs.");

        let scheduler = Arc::clone(&self);
        tokio::spawn(async move { scheduler.resync_loop().await });

        Ok(())
    }

    /// Replace the live job set with one built from a fresh registry
    /// fetch. The fetch happens first: if it fails, the previous jobs
    /// stay live and the error is returned to the caller.
    pub async fn rebuild_jobs(&self) -> Result<usize, StoreError> {
        let monitors = self.registry.list_active_monitors().await?;

        let mut jobs = self.jobs.lock().unwrap();
        for job in jobs.drain(..) {
            job.stop();
        }
        for monitor in monitors {
            if let Some(job) = self.spawn_job(monitor) {
                jobs.push(job);
            }
        }

        Ok(jobs.len())
    }

    /// Stop every job and wait for in-flight probes to finish.
    pub async fn shutdown(&self) {
        let stopped: Vec<CheckJob> = {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.drain(..).collect()
        };

        for job in &stopped {
            job.stop();
        }
        for job in stopped {
            debug!("Stopped check job for monitor {}.", job.monitor_id);
            let _ = job.handle.await;
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    async fn resync_loop(&self) {
        let mut timer = interval(self.settings.resync_interval);
        // The initial population already happened in start().
        timer.tick().await;

        loop {
            timer.tick().await;
            sleep(self.settings.settle_delay).await;

            info!("Refreshing monitor set...");
            match self.rebuild_jobs().await {
                Ok(count) => info!("Rescheduled {count} monitor check jobs."),
                Err(err) => warn!("Monitor refresh failed, keeping previous jobs: {err}"),
            }
        }
    }

    fn spawn_job(&self, monitor: Monitor) -> Option<CheckJob> {
        if !monitor.active {
            debug!("Skipping {} because it is inactive.", monitor.title);
            return None;
        }

        // A new job generation starts with no outstanding alert.
        self.dedup.clear(monitor.id);

        let every = monitor
            .interval_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.settings.probe_interval);
        let timeout = monitor
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.settings.probe_timeout);

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let prober = Arc::clone(&self.prober);
        let evaluator = Arc::clone(&self.evaluator);
        let monitor_id = monitor.id;

        let handle = tokio::spawn(async move {
            let mut timer = interval(every);

            loop {
                tokio::select! {
                    _ = timer.tick() => {}
                    _ = stop_rx.changed() => break,
                }

                let outcome = prober.probe(&monitor.url, timeout).await;
                if let Err(err) = evaluator.evaluate(&monitor, outcome).await {
                    warn!("Check for {} could not be applied: {err}", monitor.title);
                }

                // Stop requests that arrived mid-probe take effect here,
                // after the outcome has been evaluated.
                if *stop_rx.borrow() {
                    break;
                }
            }
        });

        Some(CheckJob { monitor_id, stop_tx, handle })
    }
}
