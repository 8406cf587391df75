//! Exit flow.

use tracing::{debug, info, warn};

use parkhub_core::events::{ParkingEvent, RejectionCode};
use parkhub_core::result::AppResult;
use parkhub_core::types::OperationOutcome;
use parkhub_entity::occupancy::{ExitMethod, OccupancySession};
use parkhub_entity::reservation::ReservationStatus;
use parkhub_entity::vehicle::normalize_plate;

use crate::flow::{Flow, reject, settle};

use super::dto::ExitRequest;
use super::processor::EntryExitProcessor;

impl EntryExitProcessor {
    /// Register a vehicle leaving: close its session and free the spot.
    pub async fn process_exit(
        &self,
        req: ExitRequest,
    ) -> AppResult<OperationOutcome<OccupancySession>> {
        let outcome = settle(self.try_exit(&req).await, "Exit registered")?;
        let (request, response) = Self::gate_event_parts(&req, &outcome);

        match &outcome.data {
            Some(session) => {
                info!(
                    session_id = %session.id,
                    spot_id = %session.spot_id,
                    "Vehicle exited"
                );
                self.ctx
                    .publish_to_admins(ParkingEvent::ExitSuccess { request, response });
            }
            None => {
                info!(
                    exit_type = %req.exit_type,
                    code = ?outcome.error_code,
                    reason = %outcome.message,
                    "Exit rejected"
                );
                self.ctx
                    .publish_to_admins(ParkingEvent::ExitRejected { request, response });
            }
        }
        Ok(outcome)
    }

    async fn try_exit(&self, req: &ExitRequest) -> Result<OccupancySession, Flow> {
        let Ok(method) = req.exit_type.parse::<ExitMethod>() else {
            return reject(
                RejectionCode::InvalidExitType,
                format!("Unknown exit type '{}'", req.exit_type),
            );
        };
        let session = self.find_departing(method, req).await?;
        if !session.is_open() {
            return reject(
                RejectionCode::ExitAlreadyRegistered,
                format!("Session {} is already closed", session.id),
            );
        }

        let _guard = self.ctx.spot_locks.lock(session.spot_id).await;
        let now = self.ctx.clock.now();
        let Some(closed) = self
            .ctx
            .repos
            .sessions
            .close_if_open(session.id, now)
            .await?
        else {
            return reject(
                RejectionCode::ExitAlreadyRegistered,
                format!("Session {} is already closed", session.id),
            );
        };

        if let Some(reservation_id) = closed.reservation_id {
            match self
                .ctx
                .repos
                .reservations
                .transition_status(
                    reservation_id,
                    ReservationStatus::Active,
                    ReservationStatus::Completed,
                )
                .await?
            {
                Some(_) => debug!(reservation_id = %reservation_id, "Reservation completed on exit"),
                None => debug!(reservation_id = %reservation_id, "Bound reservation was not active"),
            }
        }

        if !self
            .ctx
            .release_spot_unless_held(closed.spot_id, closed.reservation_id)
            .await?
        {
            warn!(spot_id = %closed.spot_id, "Spot not released on exit");
        }

        Ok(closed)
    }

    async fn find_departing(
        &self,
        method: ExitMethod,
        req: &ExitRequest,
    ) -> Result<OccupancySession, Flow> {
        let sessions = &self.ctx.repos.sessions;
        match method {
            ExitMethod::Id => {
                let Some(id) = req.session_id else {
                    return reject(RejectionCode::SessionIdRequired, "A session id is required");
                };
                match sessions.get(id).await? {
                    Some(session) => Ok(session),
                    None => reject(
                        RejectionCode::SessionNotFound,
                        format!("Session {id} not found"),
                    ),
                }
            }
            ExitMethod::Plate => {
                let Some(plate) = req
                    .plate
                    .as_deref()
                    .map(normalize_plate)
                    .filter(|p| !p.is_empty())
                else {
                    return reject(RejectionCode::PlateRequired, "A plate is required");
                };

                let by_vehicle = match self.ctx.repos.vehicles.find_by_plate(&plate).await? {
                    Some(vehicle) => sessions.find_open_for_vehicle(vehicle.id).await?,
                    None => None,
                };
                let found = match by_vehicle {
                    Some(session) => Some(session),
                    None => sessions.find_open_by_plate(&plate).await?,
                };
                match found {
                    Some(session) => Ok(session),
                    None => reject(
                        RejectionCode::ActiveSessionNotFound,
                        format!("No open session for plate {plate}"),
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::EntryRequest;
    use crate::test_support::{Fixture, at};
    use chrono::Duration;
    use parkhub_core::types::SessionId;
    use parkhub_entity::occupancy::SessionFilter;

    #[tokio::test]
    async fn test_entry_exit_round_trip() {
        let fx = Fixture::new(at(9, 0), 1).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let processor = fx.processor();

        let entered = processor
            .process_entry(EntryRequest::ocr("ABC123"))
            .await
            .expect("entry")
            .data
            .expect("session");

        fx.clock.advance(Duration::minutes(45));
        let outcome = processor
            .process_exit(ExitRequest::by_id(entered.id))
            .await
            .expect("exit");

        let closed = outcome.data.expect("closed");
        let exit_time = closed.exit_time.expect("exit time");
        assert!(closed.entry_time < exit_time);
        assert!(!fx.spot(closed.spot_id).await.occupied);
        assert!(processor.list_open_sessions().await.expect("open").is_empty());

        let history = processor
            .sessions_for_customer(&vehicle.customer_id, &SessionFilter::default())
            .await
            .expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(
            fx.publisher.admin_types(),
            vec!["entry_success", "session_opened", "exit_success"]
        );
    }

    #[tokio::test]
    async fn test_entry_exit_without_publisher() {
        let fx = Fixture::new(at(9, 0), 1).await.without_publisher();
        fx.vehicle("NOPUB1", "dana").await;
        let processor = fx.processor();

        let entry = processor
            .process_entry(EntryRequest::ocr("NOPUB1"))
            .await
            .expect("entry");
        assert!(entry.success);
        let entered = entry.data.expect("session");
        assert!(fx.spot(entered.spot_id).await.occupied);

        fx.clock.advance(Duration::minutes(20));
        let exit = processor
            .process_exit(ExitRequest::by_plate("NOPUB1"))
            .await
            .expect("exit");
        assert!(exit.success);
        assert!(exit.data.expect("closed").exit_time.is_some());
        assert!(!fx.spot(entered.spot_id).await.occupied);
        assert!(fx.publisher.admin_types().is_empty());
    }

    #[tokio::test]
    async fn test_exit_on_closed_session_rejected() {
        let fx = Fixture::new(at(9, 0), 1).await;
        let processor = fx.processor();
        let session = processor
            .process_entry(EntryRequest::manual("Ana", "XYZ9"))
            .await
            .expect("entry")
            .data
            .expect("session");

        fx.clock.advance(Duration::minutes(5));
        assert!(processor
            .process_exit(ExitRequest::by_id(session.id))
            .await
            .expect("exit")
            .success);

        let again = processor
            .process_exit(ExitRequest::by_id(session.id))
            .await
            .expect("exit");
        assert_eq!(again.error_code, Some(RejectionCode::ExitAlreadyRegistered));
        assert_eq!(
            fx.publisher.admin_types().last().copied(),
            Some("exit_rejected")
        );
    }

    #[tokio::test]
    async fn test_exit_input_validation() {
        let fx = Fixture::new(at(9, 0), 1).await;
        let processor = fx.processor();

        let cases = [
            (
                ExitRequest {
                    exit_type: "byTicket".to_string(),
                    ..ExitRequest::default()
                },
                RejectionCode::InvalidExitType,
            ),
            (
                ExitRequest {
                    exit_type: "byId".to_string(),
                    ..ExitRequest::default()
                },
                RejectionCode::SessionIdRequired,
            ),
            (ExitRequest::by_id(SessionId(404)), RejectionCode::SessionNotFound),
            (ExitRequest::by_plate(""), RejectionCode::PlateRequired),
            (ExitRequest::by_plate("NOPE1"), RejectionCode::ActiveSessionNotFound),
        ];
        for (req, code) in cases {
            let outcome = processor.process_exit(req).await.expect("exit");
            assert_eq!(outcome.error_code, Some(code));
        }
    }

    #[tokio::test]
    async fn test_exit_by_plate_finds_visitor_session() {
        let fx = Fixture::new(at(9, 0), 1).await;
        let processor = fx.processor();
        processor
            .process_entry(EntryRequest::manual("Ana", "XYZ-9"))
            .await
            .expect("entry");

        fx.clock.advance(Duration::minutes(30));
        let outcome = processor
            .process_exit(ExitRequest::by_plate("xyz 9"))
            .await
            .expect("exit");
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_exit_completes_bound_reservation() {
        let fx = Fixture::new(at(9, 0), 2).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let reservation = fx
            .book_for(
                fx.spots[1].id,
                vehicle.id,
                "alice",
                at(9, 0),
                at(10, 0),
                ReservationStatus::Pending,
            )
            .await;
        let processor = fx.processor();
        processor
            .process_entry(EntryRequest::ocr("ABC123"))
            .await
            .expect("entry");

        fx.clock.advance(Duration::minutes(50));
        let outcome = processor
            .process_exit(ExitRequest::by_plate("ABC123"))
            .await
            .expect("exit");

        assert_eq!(outcome.data.expect("closed").spot_id, fx.spots[1].id);
        assert_eq!(
            fx.reservation(&reservation).await.status,
            ReservationStatus::Completed
        );
        assert!(!fx.spot(fx.spots[1].id).await.occupied);
    }
}
