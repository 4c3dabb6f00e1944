use std::sync::Arc;

use busline_core::{
    Booking, BookingError, BookingResult, BookingStatus, BookingStore, Clock, TripTransaction,
};
use busline_shared::models::{BookingCancelledEvent, BookingConfirmedEvent};
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::{BookingEvent, BookingEvents};

/// Moves bookings through `PENDING -> CONFIRMED -> CANCELLED` and keeps the
/// booking's seats in step.
///
/// Each transition runs in the booking's trip transaction and re-reads the
/// booking once the trip is locked, so concurrent transitions on the same
/// booking are decided by whoever gets the lock first.
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    events: BookingEvents,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, events: BookingEvents) -> Self {
        Self { store, clock, events }
    }

    /// Transition: Pending → Confirmed (payment succeeded)
    pub async fn confirm(&self, booking_id: Uuid) -> BookingResult<Booking> {
        let (mut tx, mut booking) = self.lock_booking(booking_id).await?;

        if booking.status != BookingStatus::Pending {
            return Err(BookingError::Conflict(format!(
                "Booking {} is not in pending status",
                booking.booking_code
            )));
        }

        let now = self.clock.now();
        let mut seats = tx.seats_by_ids(&booking.seat_ids()).await?;
        for seat in seats.iter_mut() {
            if !seat.is_hold {
                warn!(
                    booking_id = %booking.id,
                    seat_number = seat.seat_number,
                    status = seat.status.as_str(),
                    "Seat no longer held at confirmation"
                );
                continue;
            }
            seat.mark_booked(now);
            tx.update_seat(seat).await?;
        }

        booking.update_status(BookingStatus::Confirmed, now);
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        info!(booking_id = %booking.id, booking_code = %booking.booking_code, "Booking confirmed");

        self.events.publish(BookingEvent::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.id,
            booking_code: booking.booking_code.clone(),
            trip_id: booking.trip_id,
            user_id: booking.user_id,
            seat_numbers: booking.seat_numbers(),
            total_amount: booking.total_amount,
            timestamp: now.timestamp(),
        }));

        Ok(booking)
    }

    /// Transition: Confirmed → Cancelled, releasing the booked seats
    pub async fn cancel(&self, booking_id: Uuid, reason: Option<String>) -> BookingResult<Booking> {
        let (mut tx, mut booking) = self.lock_booking(booking_id).await?;

        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::Conflict(format!(
                "Booking {} is not confirmed",
                booking.booking_code
            )));
        }

        let now = self.clock.now();
        let mut released = Vec::new();
        let mut seats = tx.seats_by_ids(&booking.seat_ids()).await?;
        for seat in seats.iter_mut().filter(|s| s.is_booked) {
            seat.release_booking(now);
            tx.update_seat(seat).await?;
            released.push(seat.seat_number);
        }

        booking.cancellation_reason = reason;
        booking.update_status(BookingStatus::Cancelled, now);
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            booking_code = %booking.booking_code,
            released = ?released,
            "Booking cancelled"
        );

        self.events.publish(BookingEvent::BookingCancelled(BookingCancelledEvent {
            booking_id: booking.id,
            trip_id: booking.trip_id,
            user_id: booking.user_id,
            released_seats: released,
            reason: booking.cancellation_reason.clone(),
            timestamp: now.timestamp(),
        }));

        Ok(booking)
    }

    pub async fn booking(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.store.booking(booking_id).await?.ok_or_else(|| not_found(booking_id))
    }

    /// Newest first
    pub async fn user_bookings(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.store.bookings_for_user(user_id).await
    }

    pub async fn all_bookings(&self) -> BookingResult<Vec<Booking>> {
        self.store.all_bookings().await
    }

    /// Opens the booking's trip transaction and reads the booking again
    /// under the lock.
    async fn lock_booking(
        &self,
        booking_id: Uuid,
    ) -> BookingResult<(Box<dyn TripTransaction>, Booking)> {
        let trip_id = self.booking(booking_id).await?.trip_id;
        let mut tx = self.store.begin(trip_id).await?;
        let booking = tx.booking(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        Ok((tx, booking))
    }
}

fn not_found(booking_id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Booking {} not found", booking_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use busline_core::SeatStatus;
    use chrono::Duration;

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let fx = Fixture::new(Some(4));
        let held = fx.holds.hold_seats(fx.request(vec![1, 2], 100)).await.unwrap();

        // Pending → Confirmed
        let confirmed = fx.lifecycle.confirm(held.id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        let seats = fx.store.seats_for_trip(fx.trip_id).await.unwrap();
        for seat in seats.iter().filter(|s| s.seat_number <= 2) {
            assert_eq!(seat.status, SeatStatus::Booked);
            assert!(seat.is_booked && !seat.is_hold && seat.hold_expiry.is_none());
        }

        // Confirmed → Cancelled
        let cancelled = fx.lifecycle.cancel(held.id, Some("change of plans".to_string())).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("change of plans"));
        let seats = fx.store.seats_for_trip(fx.trip_id).await.unwrap();
        assert!(seats.iter().all(|s| s.status == SeatStatus::Available && !s.is_booked));

        let stored = fx.lifecycle.booking(held.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.seats.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let fx = Fixture::new(Some(4));
        let held = fx.holds.hold_seats(fx.request(vec![1], 100)).await.unwrap();

        // Cannot cancel a booking that was never confirmed
        let result = fx.lifecycle.cancel(held.id, None).await;
        assert!(matches!(result, Err(BookingError::Conflict(_))));

        fx.lifecycle.confirm(held.id).await.unwrap();
        let result = fx.lifecycle.confirm(held.id).await;
        assert!(matches!(result, Err(BookingError::Conflict(_))));

        fx.lifecycle.cancel(held.id, None).await.unwrap();
        let result = fx.lifecycle.cancel(held.id, None).await;
        assert!(matches!(result, Err(BookingError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_booking() {
        let fx = Fixture::new(Some(4));
        let missing = Uuid::new_v4();

        assert!(matches!(fx.lifecycle.confirm(missing).await, Err(BookingError::NotFound(_))));
        assert!(matches!(fx.lifecycle.cancel(missing, None).await, Err(BookingError::NotFound(_))));
        assert!(matches!(fx.lifecycle.booking(missing).await, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_confirm_after_seat_was_retaken() {
        let fx = Fixture::new(Some(4));
        let stale = fx.holds.hold_seats(fx.request(vec![1], 100)).await.unwrap();

        fx.clock.advance(Duration::minutes(10));
        let fresh = fx.holds.hold_seats(fx.request(vec![1], 100)).await.unwrap();
        fx.lifecycle.confirm(fresh.id).await.unwrap();

        // seat 1 is booked by the fresh booking and stays that way
        let late = fx.lifecycle.confirm(stale.id).await.unwrap();
        assert_eq!(late.status, BookingStatus::Confirmed);
        let seat = fx.store.seats_for_trip(fx.trip_id).await.unwrap().remove(0);
        assert_eq!(seat.status, SeatStatus::Booked);
    }

    #[tokio::test]
    async fn test_user_bookings_newest_first() {
        let fx = Fixture::new(Some(4));
        let first = fx.holds.hold_seats(fx.request(vec![1], 100)).await.unwrap();
        fx.clock.advance(Duration::seconds(1));
        let second = fx.holds.hold_seats(fx.request(vec![2], 100)).await.unwrap();

        let bookings = fx.lifecycle.user_bookings(fx.user_id).await.unwrap();
        let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(fx.lifecycle.user_bookings(Uuid::new_v4()).await.unwrap().is_empty());
        assert_eq!(fx.lifecycle.all_bookings().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transitions_publish_events() {
        let fx = Fixture::new(Some(4));
        let held = fx.holds.hold_seats(fx.request(vec![3, 4], 250)).await.unwrap();
        let mut events = fx.events.subscribe();

        fx.lifecycle.confirm(held.id).await.unwrap();
        fx.lifecycle.cancel(held.id, Some("sick".to_string())).await.unwrap();

        match events.recv().await.unwrap() {
            BookingEvent::BookingConfirmed(event) => {
                assert_eq!(event.booking_code, held.booking_code);
                assert_eq!(event.total_amount, 250);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match events.recv().await.unwrap() {
            BookingEvent::BookingCancelled(event) => {
                assert_eq!(event.released_seats, vec![3, 4]);
                assert_eq!(event.reason.as_deref(), Some("sick"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
