use std::collections::HashMap;
use std::sync::Arc;

use busline_core::{
    Booking, BookingError, BookingResult, BookingRules, BookingSeat, BookingStore, Clock,
    PassengerDetails, TripDirectory, UserDirectory,
};
use busline_inventory::SeatInventory;
use busline_shared::models::SeatsHeldEvent;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{BookingEvent, BookingEvents};

/// A user's request to hold seats on one trip
#[derive(Debug, Clone, Deserialize)]
pub struct HoldRequest {
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub seat_numbers: Vec<u32>,
    /// Minor currency units
    pub total_amount: i64,
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Optional, matched to `seat_numbers` by position
    #[serde(default)]
    pub passengers: Vec<PassengerDetails>,
}

impl HoldRequest {
    pub fn validate(&self, rules: &BookingRules) -> BookingResult<()> {
        if self.seat_numbers.is_empty() {
            return Err(BookingError::Validation("At least one seat must be selected".to_string()));
        }
        if self.seat_numbers.len() > rules.max_seats_per_booking {
            return Err(BookingError::Validation(format!(
                "Cannot book more than {} seats per booking",
                rules.max_seats_per_booking
            )));
        }
        if self.total_amount <= 0 {
            return Err(BookingError::Validation("Total amount must be positive".to_string()));
        }
        if !self.passengers.is_empty() && self.passengers.len() != self.seat_numbers.len() {
            return Err(BookingError::Validation(format!(
                "Expected passenger details for {} seats, got {}",
                self.seat_numbers.len(),
                self.passengers.len()
            )));
        }
        Ok(())
    }
}

/// Places time-limited holds on seats and opens a pending booking for them.
///
/// Everything between reading the seats and writing the holds happens inside
/// one trip transaction, so two requests for the same seat can never both
/// see it free.
pub struct HoldManager {
    store: Arc<dyn BookingStore>,
    trips: Arc<dyn TripDirectory>,
    users: Arc<dyn UserDirectory>,
    rules: BookingRules,
    clock: Arc<dyn Clock>,
    events: BookingEvents,
}

impl HoldManager {
    pub fn new(
        store: Arc<dyn BookingStore>,
        trips: Arc<dyn TripDirectory>,
        users: Arc<dyn UserDirectory>,
        rules: BookingRules,
        clock: Arc<dyn Clock>,
        events: BookingEvents,
    ) -> Self {
        Self { store, trips, users, rules, clock, events }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub async fn hold_seats(&self, request: HoldRequest) -> BookingResult<Booking> {
        request.validate(&self.rules)?;

        let trip = self
            .trips
            .trip(request.trip_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Trip {} not found", request.trip_id)))?;
        if !self.users.user_exists(request.user_id).await? {
            return Err(BookingError::NotFound(format!("User {} not found", request.user_id)));
        }

        let mut tx = self.store.begin(trip.id).await?;
        // read after the trip lock is ours
        let now = self.clock.now();

        SeatInventory::seats_in(tx.as_mut(), &trip, now).await?;
        let mut seats = SeatInventory::find_by_numbers_in(tx.as_mut(), &request.seat_numbers).await?;

        for seat in seats.iter_mut().filter(|s| s.hold_lapsed(now)) {
            seat.release_hold(now);
            tx.update_seat(seat).await?;
            debug!(trip_id = %trip.id, seat_number = seat.seat_number, "Reclaimed lapsed hold");
        }

        if let Some(taken) = seats.iter().find(|s| !s.is_free(now)) {
            warn!(trip_id = %trip.id, seat_number = taken.seat_number, "Seat already taken");
            return Err(BookingError::Conflict(format!(
                "Seat {} is not available",
                taken.seat_number
            )));
        }

        let mut booking = Booking::pending(
            request.user_id,
            trip.id,
            request.total_amount,
            seats.len() as u32,
            now,
        );
        booking.special_requests = request.special_requests;

        let mut passengers: HashMap<u32, PassengerDetails> =
            request.seat_numbers.iter().copied().zip(request.passengers).collect();

        let expires_at = now + self.rules.hold_duration();
        for seat in seats.iter_mut() {
            seat.place_hold(expires_at, now);
            tx.update_seat(seat).await?;
            booking.seats.push(BookingSeat::new(
                booking.id,
                seat,
                passengers.remove(&seat.seat_number),
                now,
            ));
        }

        tx.insert_booking(&booking).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            booking_code = %booking.booking_code,
            trip_id = %trip.id,
            seats = ?booking.seat_numbers(),
            %expires_at,
            "Seats held"
        );

        self.events.publish(BookingEvent::SeatsHeld(SeatsHeldEvent {
            booking_id: booking.id,
            trip_id: booking.trip_id,
            user_id: booking.user_id,
            seat_numbers: booking.seat_numbers(),
            hold_expires_at: expires_at,
            timestamp: now.timestamp(),
        }));

        Ok(booking)
    }
}
