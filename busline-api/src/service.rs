use std::sync::Arc;

use busline_booking::{BookingEvent, BookingEvents, BookingLifecycle, HoldManager, HoldRequest};
use busline_core::{
    Booking, BookingError, BookingRules, BookingStore, Clock, Seat, SystemClock, TripDirectory,
    UserDirectory,
};
use busline_inventory::{SeatInventory, SeatSummary};
use busline_store::app_config::Config;
use busline_store::{MemoryDirectory, MemoryStore, PgBookingStore, PgDirectory};
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::ApiResult;

/// Entry point for collaborators (payment, notifications, the operator CLI).
/// Wires inventory, holds and the booking lifecycle over one store.
pub struct BookingService {
    trips: Arc<dyn TripDirectory>,
    inventory: SeatInventory,
    holds: HoldManager,
    lifecycle: BookingLifecycle,
    events: BookingEvents,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        trips: Arc<dyn TripDirectory>,
        users: Arc<dyn UserDirectory>,
        rules: BookingRules,
        clock: Arc<dyn Clock>,
        events: BookingEvents,
    ) -> Self {
        Self {
            inventory: SeatInventory::new(store.clone(), clock.clone()),
            holds: HoldManager::new(
                store.clone(),
                trips.clone(),
                users,
                rules,
                clock.clone(),
                events.clone(),
            ),
            lifecycle: BookingLifecycle::new(store, clock, events.clone()),
            trips,
            events,
        }
    }

    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        let directory = Arc::new(PgDirectory::new(pool.clone()));
        Self::new(
            Arc::new(PgBookingStore::new(pool)),
            directory.clone(),
            directory,
            config.booking_rules,
            Arc::new(SystemClock),
            BookingEvents::new(config.events.channel_capacity),
        )
    }

    pub fn in_memory(directory: Arc<MemoryDirectory>, rules: BookingRules, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            directory.clone(),
            directory,
            rules,
            clock,
            BookingEvents::default(),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    pub fn rules(&self) -> &BookingRules {
        self.holds.rules()
    }

    /// Seat map of the trip, generated on first access
    pub async fn seat_map(&self, trip_id: Uuid) -> ApiResult<Vec<Seat>> {
        let trip = self
            .trips
            .trip(trip_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Trip {} not found", trip_id)))?;
        Ok(self.inventory.list_seats(&trip).await?)
    }

    pub async fn seat_summary(&self, trip_id: Uuid) -> ApiResult<SeatSummary> {
        Ok(self.inventory.summary(trip_id).await?)
    }

    pub async fn available_seats(&self, trip_id: Uuid) -> ApiResult<Vec<Seat>> {
        Ok(self.inventory.available_seats(trip_id).await?)
    }

    pub async fn hold_seats(&self, request: HoldRequest) -> ApiResult<Booking> {
        Ok(self.holds.hold_seats(request).await?)
    }

    pub async fn confirm_booking(&self, booking_id: Uuid) -> ApiResult<Booking> {
        Ok(self.lifecycle.confirm(booking_id).await?)
    }

    pub async fn cancel_booking(&self, booking_id: Uuid, reason: Option<String>) -> ApiResult<Booking> {
        Ok(self.lifecycle.cancel(booking_id, reason).await?)
    }

    pub async fn booking(&self, booking_id: Uuid) -> ApiResult<Booking> {
        Ok(self.lifecycle.booking(booking_id).await?)
    }

    pub async fn user_bookings(&self, user_id: Uuid) -> ApiResult<Vec<Booking>> {
        Ok(self.lifecycle.user_bookings(user_id).await?)
    }

    pub async fn all_bookings(&self) -> ApiResult<Vec<Booking>> {
        Ok(self.lifecycle.all_bookings().await?)
    }
}
