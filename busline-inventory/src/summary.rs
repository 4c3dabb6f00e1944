use busline_core::Seat;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Occupancy snapshot of a trip, read by reporting and the seat picker
#[derive(Debug, Clone, Serialize)]
pub struct SeatSummary {
    pub trip_id: Uuid,
    pub total_seats: usize,
    pub available_seats: usize,
    pub booked_seats: usize,
    pub held_seats: usize,
    pub seats: Vec<Seat>,
}

impl SeatSummary {
    pub fn from_seats(trip_id: Uuid, seats: Vec<Seat>, now: DateTime<Utc>) -> Self {
        let available_seats = seats.iter().filter(|s| Self::counts_as_available(s, now)).count();
        let booked_seats = seats.iter().filter(|s| s.is_booked).count();
        let held_seats = seats.iter().filter(|s| Self::counts_as_held(s, now)).count();

        Self {
            trip_id,
            total_seats: seats.len(),
            available_seats,
            booked_seats,
            held_seats,
            seats,
        }
    }

    /// Not booked, and either not held or held with an expiry already passed.
    /// A hold without an expiry still counts as held here until a hold
    /// request reclaims it.
    pub fn counts_as_available(seat: &Seat, now: DateTime<Utc>) -> bool {
        !seat.is_booked
            && (!seat.is_hold || seat.hold_expiry.map_or(false, |expiry| expiry < now))
    }

    pub fn counts_as_held(seat: &Seat, now: DateTime<Utc>) -> bool {
        seat.is_hold && seat.hold_expiry.map_or(true, |expiry| expiry > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::SeatType;
    use chrono::Duration;

    #[test]
    fn test_summary_counts() {
        let now = Utc::now();
        let trip_id = Uuid::new_v4();
        let mut seats: Vec<Seat> = (1..=5)
            .map(|n| Seat::new(trip_id, n, SeatType::for_seat_number(n), now))
            .collect();

        seats[0].mark_booked(now);
        seats[1].place_hold(now + Duration::minutes(5), now);
        seats[2].place_hold(now - Duration::minutes(1), now - Duration::minutes(6));
        seats[3].place_hold(now, now);
        seats[3].hold_expiry = None;

        let summary = SeatSummary::from_seats(trip_id, seats, now);
        assert_eq!(summary.total_seats, 5);
        assert_eq!(summary.booked_seats, 1);
        // active hold plus the hold without expiry
        assert_eq!(summary.held_seats, 2);
        // free seat plus the lapsed hold
        assert_eq!(summary.available_seats, 2);
    }
}
