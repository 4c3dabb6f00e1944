use std::sync::Arc;

use busline_core::{
    BookingError, BookingResult, BookingStore, Clock, Seat, SeatType, TripInfo, TripTransaction,
};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::summary::SeatSummary;

/// Builds the seat map for a trip: one seat per unit of bus capacity,
/// numbered from 1, alternating window and aisle, all available.
pub fn generate_seat_map(trip: &TripInfo, now: DateTime<Utc>) -> BookingResult<Vec<Seat>> {
    let total_seats = trip.bus_total_seats.ok_or_else(|| {
        BookingError::Configuration(format!("Trip {} has no bus seat capacity configured", trip.id))
    })?;

    Ok((1..=total_seats)
        .map(|number| Seat::new(trip.id, number, SeatType::for_seat_number(number), now))
        .collect())
}

/// Per-trip seat records.
///
/// The associated functions work inside an already open trip transaction and
/// are what the hold manager uses. The methods on `SeatInventory` itself are
/// the read side offered to other collaborators.
pub struct SeatInventory {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl SeatInventory {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// All seats of the trip, generating the seat map if the trip has none yet
    pub async fn seats_in(
        tx: &mut dyn TripTransaction,
        trip: &TripInfo,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<Seat>> {
        let existing = tx.seats().await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let seats = generate_seat_map(trip, now)?;
        tx.insert_seats(&seats).await?;
        debug!(trip_id = %trip.id, count = seats.len(), "Generated seat map");
        Ok(seats)
    }

    /// Exactly the requested seats. Unknown or repeated numbers make the
    /// returned count differ from the requested count and fail the lookup.
    pub async fn find_by_numbers_in(
        tx: &mut dyn TripTransaction,
        numbers: &[u32],
    ) -> BookingResult<Vec<Seat>> {
        let seats = tx.seats_by_numbers(numbers).await?;
        if seats.len() != numbers.len() {
            return Err(BookingError::NotFound(format!(
                "One or more selected seats do not exist for trip {}",
                tx.trip_id()
            )));
        }
        Ok(seats)
    }

    /// Seat map of a trip, generated on first access
    pub async fn list_seats(&self, trip: &TripInfo) -> BookingResult<Vec<Seat>> {
        let mut tx = self.store.begin(trip.id).await?;
        let seats = Self::seats_in(tx.as_mut(), trip, self.clock.now()).await?;
        tx.commit().await?;
        Ok(seats)
    }

    pub async fn find_by_numbers(&self, trip_id: Uuid, numbers: &[u32]) -> BookingResult<Vec<Seat>> {
        let mut tx = self.store.begin(trip_id).await?;
        // read-only; dropping the transaction releases the trip
        Self::find_by_numbers_in(tx.as_mut(), numbers).await
    }

    pub async fn summary(&self, trip_id: Uuid) -> BookingResult<SeatSummary> {
        let seats = self.store.seats_for_trip(trip_id).await?;
        Ok(SeatSummary::from_seats(trip_id, seats, self.clock.now()))
    }

    pub async fn available_seats(&self, trip_id: Uuid) -> BookingResult<Vec<Seat>> {
        let now = self.clock.now();
        let seats = self.store.seats_for_trip(trip_id).await?;
        Ok(seats.into_iter().filter(|s| SeatSummary::counts_as_available(s, now)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::{SeatStatus, SystemClock};
    use busline_store::MemoryStore;

    fn trip(seats: Option<u32>) -> TripInfo {
        TripInfo { id: Uuid::new_v4(), bus_total_seats: seats }
    }

    fn inventory(store: &Arc<MemoryStore>) -> SeatInventory {
        SeatInventory::new(store.clone(), Arc::new(SystemClock))
    }

    #[test]
    fn test_generate_seat_map_matches_capacity() {
        let trip = trip(Some(40));
        let seats = generate_seat_map(&trip, Utc::now()).unwrap();

        assert_eq!(seats.len(), 40);
        assert_eq!(seats[0].seat_type, SeatType::Window);
        assert_eq!(seats[1].seat_type, SeatType::Aisle);
        assert!(seats.iter().all(|s| s.status == SeatStatus::Available && !s.is_hold && !s.is_booked));
        assert_eq!(seats.last().unwrap().seat_number, 40);
    }

    #[test]
    fn test_generate_seat_map_requires_capacity() {
        let result = generate_seat_map(&trip(None), Utc::now());
        assert!(matches!(result, Err(BookingError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_list_seats_generates_once() {
        let store = Arc::new(MemoryStore::new());
        let inventory = inventory(&store);
        let trip = trip(Some(4));

        let first = inventory.list_seats(&trip).await.unwrap();
        let second = inventory.list_seats(&trip).await.unwrap();

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_find_by_numbers_exact_count() {
        let store = Arc::new(MemoryStore::new());
        let inventory = inventory(&store);
        let trip = trip(Some(4));
        inventory.list_seats(&trip).await.unwrap();

        let seats = inventory.find_by_numbers(trip.id, &[1, 3]).await.unwrap();
        assert_eq!(seats.len(), 2);

        let unknown = inventory.find_by_numbers(trip.id, &[1, 9]).await;
        assert!(matches!(unknown, Err(BookingError::NotFound(_))));

        let repeated = inventory.find_by_numbers(trip.id, &[2, 2]).await;
        assert!(matches!(repeated, Err(BookingError::NotFound(_))));
    }
}
