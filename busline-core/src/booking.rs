use busline_shared::Masked;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::seat::Seat;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "EXPIRED" => Ok(BookingStatus::Expired),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// Passenger travelling on one booked seat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerDetails {
    pub name: Masked<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// Link between a booking and one of its seats
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSeat {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    pub seat_number: u32,
    pub passenger: Option<PassengerDetails>,
    pub seat_fare: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl BookingSeat {
    pub fn new(booking_id: Uuid, seat: &Seat, passenger: Option<PassengerDetails>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            seat_id: seat.id,
            seat_number: seat.seat_number,
            passenger,
            seat_fare: None,
            created_at: now,
        }
    }
}

/// A reservation covering one or more seats of a single trip.
///
/// The set of `seats` is decided when the booking is created and never
/// changes afterwards; only `status` and the cancellation fields move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub user_id: Uuid,
    pub trip_id: Uuid,
    pub booking_date: DateTime<Utc>,
    /// Minor currency units
    pub total_amount: i64,
    pub status: BookingStatus,
    pub passenger_count: u32,
    pub special_requests: Option<String>,
    pub cancellation_reason: Option<String>,
    pub refund_amount: Option<i64>,
    pub seats: Vec<BookingSeat>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn pending(
        user_id: Uuid,
        trip_id: Uuid,
        total_amount: i64,
        passenger_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_code: generate_booking_code(now),
            user_id,
            trip_id,
            booking_date: now,
            total_amount,
            status: BookingStatus::Pending,
            passenger_count,
            special_requests: None,
            cancellation_reason: None,
            refund_amount: None,
            seats: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn seat_ids(&self) -> Vec<Uuid> {
        self.seats.iter().map(|s| s.seat_id).collect()
    }

    pub fn seat_numbers(&self) -> Vec<u32> {
        self.seats.iter().map(|s| s.seat_number).collect()
    }

    pub fn update_status(&mut self, status: BookingStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

/// `BK` + last 8 digits of the epoch millis + 3 random digits
pub fn generate_booking_code(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(100_000_000);
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("BK{:08}{:03}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat::SeatType;

    #[test]
    fn test_booking_code_shape() {
        let code = generate_booking_code(Utc::now());
        assert_eq!(code.len(), 13);
        assert!(code.starts_with("BK"));
        assert!(code[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_pending_booking_links_seats() {
        let now = Utc::now();
        let trip_id = Uuid::new_v4();
        let mut booking = Booking::pending(Uuid::new_v4(), trip_id, 100, 2, now);
        assert_eq!(booking.status, BookingStatus::Pending);

        let s1 = Seat::new(trip_id, 1, SeatType::Window, now);
        let s2 = Seat::new(trip_id, 2, SeatType::Aisle, now);
        booking.seats.push(BookingSeat::new(booking.id, &s1, None, now));
        booking.seats.push(BookingSeat::new(booking.id, &s2, None, now));

        assert_eq!(booking.seat_numbers(), vec![1, 2]);
        assert_eq!(booking.seat_ids(), vec![s1.id, s2.id]);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!("CONFIRMED".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::Expired.to_string(), "EXPIRED");
        assert!("LOCKED".parse::<BookingStatus>().is_err());
    }
}
