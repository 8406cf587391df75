//! The job abstraction shared by every reconciliation task.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use parkhub_core::error::AppError;

/// A unit of periodic reconciliation work.
#[async_trait]
pub trait ReconciliationJob: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run one pass.
    async fn run(&self) -> Result<JobReport, JobExecutionError>;
}

/// What one pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    /// Job name.
    pub job: &'static str,
    /// Records examined.
    pub examined: usize,
    /// Records changed.
    pub changed: usize,
}

/// Error from a job pass.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// The pass could not start, e.g. the candidate query failed.
    #[error("Job '{job}' aborted: {source}")]
    Aborted {
        /// Job name.
        job: &'static str,
        /// Underlying error.
        #[source]
        source: AppError,
    },
}

/// Run `job` once and log the outcome. Never fails.
pub async fn execute(job: &dyn ReconciliationJob) -> Option<JobReport> {
    match job.run().await {
        Ok(report) => {
            if report.changed > 0 {
                info!(
                    job = report.job,
                    examined = report.examined,
                    changed = report.changed,
                    "Reconciliation pass finished"
                );
            }
            Some(report)
        }
        Err(err) => {
            error!(job = job.name(), error = %err, "Reconciliation pass failed");
            None
        }
    }
}
