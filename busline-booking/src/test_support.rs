use std::sync::Arc;

use busline_core::{BookingRules, ManualClock, TripInfo};
use busline_store::{MemoryDirectory, MemoryStore};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::{BookingEvents, BookingLifecycle, HoldManager, HoldRequest};

/// One trip, one known user, in-memory storage and a hand-driven clock
pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub events: BookingEvents,
    pub holds: HoldManager,
    pub lifecycle: BookingLifecycle,
    pub trip_id: Uuid,
    pub user_id: Uuid,
}

impl Fixture {
    pub fn new(bus_total_seats: Option<u32>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()));
        let events = BookingEvents::new(16);

        let trip_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        directory.add_trip(TripInfo { id: trip_id, bus_total_seats });
        directory.add_user(user_id);

        let holds = HoldManager::new(
            store.clone(),
            directory.clone(),
            directory,
            BookingRules::default(),
            clock.clone(),
            events.clone(),
        );
        let lifecycle = BookingLifecycle::new(store.clone(), clock.clone(), events.clone());

        Self { store, clock, events, holds, lifecycle, trip_id, user_id }
    }

    pub fn request(&self, seat_numbers: Vec<u32>, total_amount: i64) -> HoldRequest {
        HoldRequest {
            trip_id: self.trip_id,
            user_id: self.user_id,
            seat_numbers,
            total_amount,
            special_requests: None,
            passengers: Vec::new(),
        }
    }
}
