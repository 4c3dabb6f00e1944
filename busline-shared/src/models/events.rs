use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatsHeldEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub seat_numbers: Vec<u32>,
    pub hold_expires_at: DateTime<Utc>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub seat_numbers: Vec<u32>,
    pub total_amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub released_seats: Vec<u32>,
    pub reason: Option<String>,
    pub timestamp: i64,
}
