//! Pre-activation of reservations about to start.

use async_trait::async_trait;
use tracing::{debug, error};

use parkhub_service::{ActivationOutcome, ReservationService};

use crate::executor::{JobExecutionError, JobReport, ReconciliationJob};

/// Claims the spot of every pending reservation starting within the
/// activation window.
#[derive(Debug, Clone)]
pub struct ActivationJob {
    reservations: ReservationService,
}

impl ActivationJob {
    /// Create a new activation job.
    pub fn new(reservations: ReservationService) -> Self {
        Self { reservations }
    }
}

#[async_trait]
impl ReconciliationJob for ActivationJob {
    fn name(&self) -> &'static str {
        "parking_activation"
    }

    async fn run(&self) -> Result<JobReport, JobExecutionError> {
        let upcoming = self
            .reservations
            .upcoming_for_activation()
            .await
            .map_err(|source| JobExecutionError::Aborted {
                job: self.name(),
                source,
            })?;

        let examined = upcoming.len();
        let mut changed = 0;
        for reservation in upcoming {
            match self.reservations.activate_reservation(reservation.id).await {
                Ok(ActivationOutcome::Activated(_)) => changed += 1,
                Ok(outcome) => {
                    debug!(reservation_id = %reservation.id, ?outcome, "Reservation not activated");
                }
                Err(err) => error!(
                    reservation_id = %reservation.id,
                    error = %err,
                    "Failed to activate reservation"
                ),
            }
        }

        Ok(JobReport {
            job: self.name(),
            examined,
            changed,
        })
    }
}
