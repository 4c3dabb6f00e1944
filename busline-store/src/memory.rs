use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use busline_core::{
    Booking, BookingError, BookingResult, BookingStore, Seat, TripDirectory, TripInfo,
    TripTransaction, UserDirectory,
};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    seats: HashMap<Uuid, Vec<Seat>>,
    bookings: HashMap<Uuid, Booking>,
}

fn poisoned() -> BookingError {
    BookingError::Storage("memory store lock poisoned".to_string())
}

/// In-process seat and booking store.
///
/// Each trip has its own async mutex; a `MemoryTripTransaction` owns that
/// mutex for its whole lifetime, works on a private copy of the trip's seats
/// and publishes its writes only on commit.
#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    trip_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn trip_lock(&self, trip_id: Uuid) -> BookingResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self.trip_locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(trip_id).or_default().clone())
    }

    fn read(&self) -> BookingResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| poisoned())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self, trip_id: Uuid) -> BookingResult<Box<dyn TripTransaction>> {
        let guard = self.trip_lock(trip_id)?.lock_owned().await;
        let seats = self.read()?.seats.get(&trip_id).cloned().unwrap_or_default();

        Ok(Box::new(MemoryTripTransaction {
            trip_id,
            _guard: guard,
            tables: self.tables.clone(),
            seats,
            seats_dirty: false,
            bookings: HashMap::new(),
        }))
    }

    async fn booking(&self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        Ok(self.read()?.bookings.get(&booking_id).cloned())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .read()?
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn all_bookings(&self) -> BookingResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self.read()?.bookings.values().cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn seats_for_trip(&self, trip_id: Uuid) -> BookingResult<Vec<Seat>> {
        Ok(self.read()?.seats.get(&trip_id).cloned().unwrap_or_default())
    }
}

pub struct MemoryTripTransaction {
    trip_id: Uuid,
    _guard: OwnedMutexGuard<()>,
    tables: Arc<RwLock<Tables>>,
    seats: Vec<Seat>,
    seats_dirty: bool,
    /// Bookings created or changed in this transaction
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryTripTransaction {
    fn write(&self) -> BookingResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl TripTransaction for MemoryTripTransaction {
    fn trip_id(&self) -> Uuid {
        self.trip_id
    }

    async fn seats(&mut self) -> BookingResult<Vec<Seat>> {
        Ok(self.seats.clone())
    }

    async fn insert_seats(&mut self, seats: &[Seat]) -> BookingResult<()> {
        for seat in seats {
            if seat.trip_id != self.trip_id {
                return Err(BookingError::Storage(format!(
                    "seat {} belongs to trip {}, not {}",
                    seat.seat_number, seat.trip_id, self.trip_id
                )));
            }
            if self.seats.iter().any(|s| s.seat_number == seat.seat_number) {
                return Err(BookingError::Storage(format!(
                    "seat number {} already exists for trip {}",
                    seat.seat_number, self.trip_id
                )));
            }
            self.seats.push(seat.clone());
        }
        self.seats.sort_by_key(|s| s.seat_number);
        self.seats_dirty = true;
        Ok(())
    }

    async fn seats_by_numbers(&mut self, numbers: &[u32]) -> BookingResult<Vec<Seat>> {
        let wanted: HashSet<u32> = numbers.iter().copied().collect();
        Ok(self
            .seats
            .iter()
            .filter(|s| wanted.contains(&s.seat_number))
            .cloned()
            .collect())
    }

    async fn seats_by_ids(&mut self, ids: &[Uuid]) -> BookingResult<Vec<Seat>> {
        let wanted: HashSet<Uuid> = ids.iter().copied().collect();
        Ok(self.seats.iter().filter(|s| wanted.contains(&s.id)).cloned().collect())
    }

    async fn update_seat(&mut self, seat: &Seat) -> BookingResult<()> {
        let slot = self
            .seats
            .iter_mut()
            .find(|s| s.id == seat.id)
            .ok_or_else(|| BookingError::NotFound(format!("Seat {} not found", seat.id)))?;
        *slot = seat.clone();
        self.seats_dirty = true;
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> BookingResult<()> {
        let exists = self.bookings.contains_key(&booking.id)
            || self
                .tables
                .read()
                .map_err(|_| poisoned())?
                .bookings
                .contains_key(&booking.id);
        if exists {
            return Err(BookingError::Storage(format!("booking {} already exists", booking.id)));
        }
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        if let Some(booking) = self.bookings.get(&booking_id) {
            return Ok(Some(booking.clone()));
        }
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.bookings.get(&booking_id).cloned())
    }

    async fn update_booking(&mut self, booking: &Booking) -> BookingResult<()> {
        let mut current = match self.booking(booking.id).await? {
            Some(current) => current,
            None => return Err(BookingError::NotFound(format!("Booking {} not found", booking.id))),
        };
        current.status = booking.status;
        current.cancellation_reason = booking.cancellation_reason.clone();
        current.refund_amount = booking.refund_amount;
        current.updated_at = booking.updated_at;
        self.bookings.insert(current.id, current);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let mut tables = self.write()?;
        if self.seats_dirty {
            tables.seats.insert(self.trip_id, self.seats.clone());
        }
        for (id, booking) in &self.bookings {
            tables.bookings.insert(*id, booking.clone());
        }
        Ok(())
    }
}

/// Trips and users known to an in-process deployment
#[derive(Default)]
pub struct MemoryDirectory {
    trips: RwLock<HashMap<Uuid, TripInfo>>,
    users: RwLock<HashSet<Uuid>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trip(&self, trip: TripInfo) {
        let mut trips = self.trips.write().unwrap_or_else(|e| e.into_inner());
        trips.insert(trip.id, trip);
    }

    pub fn add_user(&self, user_id: Uuid) {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(user_id);
    }
}

#[async_trait]
impl TripDirectory for MemoryDirectory {
    async fn trip(&self, trip_id: Uuid) -> BookingResult<Option<TripInfo>> {
        let trips = self.trips.read().map_err(|_| poisoned())?;
        Ok(trips.get(&trip_id).cloned())
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn user_exists(&self, user_id: Uuid) -> BookingResult<bool> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.contains(&user_id))
    }
}
