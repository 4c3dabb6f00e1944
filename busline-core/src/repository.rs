use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::Booking;
use crate::seat::Seat;
use crate::BookingResult;

/// What the booking core needs to know about a trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripInfo {
    pub id: Uuid,
    /// Seat capacity of the bus assigned to the trip, if one is configured
    pub bus_total_seats: Option<u32>,
}

/// Trip lookup owned by the catalog side of the system
#[async_trait]
pub trait TripDirectory: Send + Sync {
    async fn trip(&self, trip_id: Uuid) -> BookingResult<Option<TripInfo>>;
}

/// User existence check owned by the account side of the system
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> BookingResult<bool>;
}

/// Exclusive unit of work over the seats and bookings of one trip.
///
/// While a transaction is open no other transaction for the same trip can
/// read or write its seats. Writes become visible on `commit`; dropping the
/// handle without committing discards them.
#[async_trait]
pub trait TripTransaction: Send {
    fn trip_id(&self) -> Uuid;

    /// All seats of the trip ordered by seat number
    async fn seats(&mut self) -> BookingResult<Vec<Seat>>;

    async fn insert_seats(&mut self, seats: &[Seat]) -> BookingResult<()>;

    /// Seats whose number is in `numbers`; unknown numbers are simply absent
    async fn seats_by_numbers(&mut self, numbers: &[u32]) -> BookingResult<Vec<Seat>>;

    async fn seats_by_ids(&mut self, ids: &[Uuid]) -> BookingResult<Vec<Seat>>;

    async fn update_seat(&mut self, seat: &Seat) -> BookingResult<()>;

    /// Persists the booking together with its seat links
    async fn insert_booking(&mut self, booking: &Booking) -> BookingResult<()>;

    async fn booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Booking>>;

    /// Persists status, cancellation and refund fields. Seat links are immutable.
    async fn update_booking(&mut self, booking: &Booking) -> BookingResult<()>;

    async fn commit(self: Box<Self>) -> BookingResult<()>;
}

/// Persistence for seats and bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Opens the exclusive transaction for `trip_id`, waiting for any other
    /// holder to finish first.
    async fn begin(&self, trip_id: Uuid) -> BookingResult<Box<dyn TripTransaction>>;

    async fn booking(&self, booking_id: Uuid) -> BookingResult<Option<Booking>>;

    async fn bookings_for_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>>;

    async fn all_bookings(&self) -> BookingResult<Vec<Booking>>;

    /// Committed seats of the trip, without taking the trip lock
    async fn seats_for_trip(&self, trip_id: Uuid) -> BookingResult<Vec<Seat>>;
}
