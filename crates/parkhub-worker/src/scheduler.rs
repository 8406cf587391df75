//! Interval scheduler for the reconciliation jobs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use parkhub_core::config::SchedulerConfig;
use parkhub_service::ReservationService;

use crate::executor::{self, JobReport, ReconciliationJob};
use crate::jobs::{ActivationJob, CancellationJob};

/// Runs each job once on [`start`](Self::start), then on its own interval
/// until [`stop`](Self::stop).
///
/// Stop before closing the storage pool: it waits for in-flight passes.
pub struct ReconciliationScheduler {
    jobs: Vec<(Arc<dyn ReconciliationJob>, Duration)>,
    token: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl std::fmt::Debug for ReconciliationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationScheduler")
            .field("jobs", &self.jobs.len())
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}

impl ReconciliationScheduler {
    /// Scheduler with the cancellation and activation jobs on their
    /// configured intervals.
    pub fn new(reservations: ReservationService, config: &SchedulerConfig) -> Self {
        Self::with_jobs(vec![
            (
                Arc::new(CancellationJob::new(reservations.clone())) as Arc<dyn ReconciliationJob>,
                config.cancellation_interval(),
            ),
            (
                Arc::new(ActivationJob::new(reservations)) as Arc<dyn ReconciliationJob>,
                config.activation_interval(),
            ),
        ])
    }

    /// Scheduler over arbitrary jobs.
    pub fn with_jobs(jobs: Vec<(Arc<dyn ReconciliationJob>, Duration)>) -> Self {
        Self {
            jobs,
            token: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Run every job once, in order.
    pub async fn run_once(&self) -> Vec<JobReport> {
        let mut reports = Vec::with_capacity(self.jobs.len());
        for (job, _) in &self.jobs {
            if let Some(report) = executor::execute(job.as_ref()).await {
                reports.push(report);
            }
        }
        reports
    }

    /// Reconcile immediately, then spawn one loop per job. A second call
    /// is ignored.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Reconciliation scheduler already started");
            return;
        }

        self.run_once().await;

        let mut handles = self.handles.lock().await;
        for (job, period) in &self.jobs {
            let job = Arc::clone(job);
            let period = *period;
            let token = self.token.clone();
            let task_job = Arc::clone(&job);
            handles.push(tokio::spawn(async move {
                let job = task_job;
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            executor::execute(job.as_ref()).await;
                        }
                    }
                }
                info!(job = job.name(), "Reconciliation loop stopped");
            }));
            info!(
                job = job.name(),
                interval_secs = period.as_secs(),
                "Registered reconciliation job"
            );
        }
    }

    /// Signal every loop to stop and wait for them. Safe to call more
    /// than once.
    pub async fn stop(&self) {
        self.token.cancel();
        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "Reconciliation loop ended abnormally");
            }
        }
        info!("Reconciliation scheduler stopped");
    }

    /// Whether [`stop`](Self::stop) has been requested.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}
