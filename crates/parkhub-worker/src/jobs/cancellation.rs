//! No-show cancellation.

use async_trait::async_trait;

use parkhub_service::ReservationService;

use crate::executor::{JobExecutionError, JobReport, ReconciliationJob};

/// Cancels reservations whose holder never showed up.
#[derive(Debug, Clone)]
pub struct CancellationJob {
    reservations: ReservationService,
}

impl CancellationJob {
    /// Create a new cancellation job.
    pub fn new(reservations: ReservationService) -> Self {
        Self { reservations }
    }
}

#[async_trait]
impl ReconciliationJob for CancellationJob {
    fn name(&self) -> &'static str {
        "reservation_cancellation"
    }

    async fn run(&self) -> Result<JobReport, JobExecutionError> {
        let changed = self
            .reservations
            .expire_stale()
            .await
            .map_err(|source| JobExecutionError::Aborted {
                job: self.name(),
                source,
            })?;
        Ok(JobReport {
            job: self.name(),
            examined: changed,
            changed,
        })
    }
}
