//! Expiry sweep: cancel `pending` and `confirmed` bookings whose
//! `scheduled_time` passed without the job starting.
//!
//! Each booking goes through the normal cancel path as [`Actor::system`], so
//! a booking that a hairdresser starts concurrently loses nothing: one side
//! wins the compare-and-swap and the other is counted as skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use salonbook_core::Timestamp;
use salonbook_state::{Actor, BookingEvent};

use crate::context::OpContext;
use crate::error::BookingError;
use crate::service::BookingService;
use crate::telemetry;

/// Cancellation reason recorded on expired bookings.
pub const EXPIRED_REASON: &str = "expired";

const BATCH_SIZE: usize = 500;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bookings read.
    pub examined: usize,
    /// Bookings cancelled.
    pub cancelled: usize,
    /// Bookings that moved on before they could be cancelled.
    pub skipped: usize,
}

impl BookingService {
    /// Cancel every active, unstarted booking scheduled before
    /// `now - sweep_grace`.
    pub async fn run_expiry_sweep(
        &self,
        ctx: &OpContext,
        now: Timestamp,
    ) -> Result<SweepReport, BookingError> {
        let cutoff = now.shifted(-self.config().sweep_grace);
        let system = Actor::system();
        let mut report = SweepReport::default();

        loop {
            let batch = ctx
                .run(self.repository().list_expiring(cutoff, BATCH_SIZE))
                .await?;
            let full = batch.len() == BATCH_SIZE;
            let before = report.cancelled;

            for booking in &batch {
                report.examined += 1;
                let outcome = self
                    .apply_event(
                        ctx,
                        &system,
                        booking,
                        BookingEvent::Cancel,
                        Some(EXPIRED_REASON.to_string()),
                    )
                    .await;
                match outcome {
                    Ok(_) => report.cancelled += 1,
                    Err(BookingError::Conflict(_) | BookingError::InvalidTransition { .. }) => {
                        report.skipped += 1
                    }
                    Err(err) => return Err(err),
                }
            }

            // A full batch with no progress would be listed again unchanged.
            if !full || report.cancelled == before {
                break;
            }
        }

        if report.examined > 0 {
            telemetry::record_expired(report.cancelled as u64);
            tracing::info!(
                cutoff = %cutoff,
                examined = report.examined,
                cancelled = report.cancelled,
                skipped = report.skipped,
                "expiry sweep finished"
            );
        }
        Ok(report)
    }
}

/// Run [`BookingService::run_expiry_sweep`] every `interval` until `token`
/// is cancelled. A failed sweep is logged and retried on the next tick.
pub fn spawn_expiry_sweeper(
    service: Arc<BookingService>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let ctx = OpContext::with_cancel(service.config().repository_timeout, token.child_token());
                    if let Err(err) = service.run_expiry_sweep(&ctx, Timestamp::now()).await {
                        tracing::warn!(error = %err, "expiry sweep failed");
                    }
                }
                _ = token.cancelled() => {
                    tracing::info!("expiry sweeper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookingConfig;
    use crate::memory::MemoryRepository;
    use crate::notify::TracingNotifier;
    use crate::repository::BookingRepository;
    use salonbook_core::{
        ClientId, Coordinate, HairdresserId, HairstyleId, Money, ServiceLocation,
    };
    use salonbook_state::{Booking, BookingDraft, BookingStatus, ClientRef, ServiceType};

    fn service(repo: &MemoryRepository, grace: chrono::Duration) -> BookingService {
        let config = BookingConfig {
            sweep_grace: grace,
            ..BookingConfig::default()
        };
        BookingService::new(Arc::new(repo.clone()), Arc::new(TracingNotifier), Arc::new(config))
    }

    fn booking_at(scheduled: Timestamp, status: BookingStatus) -> Booking {
        let mut b = Booking::pending(
            BookingDraft {
                client: ClientRef::Registered {
                    client_id: ClientId::new(),
                },
                hairdresser_id: Some(HairdresserId::new()),
                salon_id: None,
                offered_to: vec![],
                hairstyle_id: HairstyleId::new(),
                service_type: ServiceType::Home,
                location: ServiceLocation::new("x", Coordinate::new(0.0, 0.0).unwrap()).unwrap(),
                scheduled_time: scheduled,
                estimated_duration_minutes: 45,
                client_price: Money::new(1_000).unwrap(),
                service_fee: Money::new(100).unwrap(),
            },
            scheduled.shifted(chrono::Duration::days(-1)),
        );
        b.status = status;
        b
    }

    #[tokio::test]
    async fn cancels_only_overdue_active_bookings() {
        let repo = MemoryRepository::new();
        let now = Timestamp::now();
        let overdue = repo
            .create(booking_at(now.shifted(chrono::Duration::hours(-1)), BookingStatus::Pending))
            .await
            .unwrap();
        let overdue_confirmed = repo
            .create(booking_at(now.shifted(chrono::Duration::hours(-3)), BookingStatus::Confirmed))
            .await
            .unwrap();
        let future = repo
            .create(booking_at(now.shifted(chrono::Duration::hours(1)), BookingStatus::Pending))
            .await
            .unwrap();
        let done = repo
            .create(booking_at(now.shifted(chrono::Duration::hours(-2)), BookingStatus::Completed))
            .await
            .unwrap();

        let svc = service(&repo, chrono::Duration::zero());
        let report = svc.run_expiry_sweep(&svc.context(), now).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                examined: 2,
                cancelled: 2,
                skipped: 0
            }
        );

        for id in [overdue.id, overdue_confirmed.id] {
            let b = repo.get_by_id(id).await.unwrap();
            assert_eq!(b.status, BookingStatus::Cancelled);
            assert_eq!(b.cancellation_reason.as_deref(), Some(EXPIRED_REASON));
            assert!(b.cancelled_at.is_some());
        }
        assert_eq!(repo.get_by_id(future.id).await.unwrap().status, BookingStatus::Pending);
        assert_eq!(repo.get_by_id(done.id).await.unwrap().status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn grace_period_delays_expiry() {
        let repo = MemoryRepository::new();
        let now = Timestamp::now();
        repo.create(booking_at(now.shifted(chrono::Duration::minutes(-10)), BookingStatus::Pending))
            .await
            .unwrap();

        let svc = service(&repo, chrono::Duration::minutes(30));
        let report = svc.run_expiry_sweep(&svc.context(), now).await.unwrap();
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.examined, 0);
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let repo = MemoryRepository::new();
        let now = Timestamp::now();
        let stale = repo
            .create(booking_at(now.shifted(chrono::Duration::hours(-1)), BookingStatus::Pending))
            .await
            .unwrap();
        let svc = Arc::new(service(&repo, chrono::Duration::zero()));
        let token = CancellationToken::new();
        let handle = spawn_expiry_sweeper(svc, Duration::from_millis(10), token.clone());

        for _ in 0..100 {
            if repo.get_by_id(stale.id).await.unwrap().status == BookingStatus::Cancelled {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(repo.get_by_id(stale.id).await.unwrap().status, BookingStatus::Cancelled);

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should exit")
            .unwrap();
    }
}
