use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Physical seat position on the bus
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatType {
    Window,
    Aisle,
    Middle,
    LowerBerth,
    UpperBerth,
    SideLower,
    SideUpper,
}

impl SeatType {
    /// Seat map layout: odd numbers sit by the window, even numbers on the aisle
    pub fn for_seat_number(seat_number: u32) -> Self {
        if seat_number % 2 == 1 {
            SeatType::Window
        } else {
            SeatType::Aisle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatType::Window => "WINDOW",
            SeatType::Aisle => "AISLE",
            SeatType::Middle => "MIDDLE",
            SeatType::LowerBerth => "LOWER_BERTH",
            SeatType::UpperBerth => "UPPER_BERTH",
            SeatType::SideLower => "SIDE_LOWER",
            SeatType::SideUpper => "SIDE_UPPER",
        }
    }
}

impl FromStr for SeatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WINDOW" => Ok(SeatType::Window),
            "AISLE" => Ok(SeatType::Aisle),
            "MIDDLE" => Ok(SeatType::Middle),
            "LOWER_BERTH" => Ok(SeatType::LowerBerth),
            "UPPER_BERTH" => Ok(SeatType::UpperBerth),
            "SIDE_LOWER" => Ok(SeatType::SideLower),
            "SIDE_UPPER" => Ok(SeatType::SideUpper),
            other => Err(format!("unknown seat type: {}", other)),
        }
    }
}

/// Seat status as shown on the seat map
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Hold,
    Booked,
    Maintenance,
    Reserved,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Hold => "HOLD",
            SeatStatus::Booked => "BOOKED",
            SeatStatus::Maintenance => "MAINTENANCE",
            SeatStatus::Reserved => "RESERVED",
        }
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "HOLD" => Ok(SeatStatus::Hold),
            "BOOKED" => Ok(SeatStatus::Booked),
            "MAINTENANCE" => Ok(SeatStatus::Maintenance),
            "RESERVED" => Ok(SeatStatus::Reserved),
            other => Err(format!("unknown seat status: {}", other)),
        }
    }
}

/// A single seat of one trip.
///
/// `is_booked` and an active hold never coexist, and `status` always mirrors
/// the two flags. All transitions go through the methods below so the three
/// fields move together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seat {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_number: u32,
    pub seat_type: SeatType,
    pub status: SeatStatus,
    pub is_booked: bool,
    pub is_hold: bool,
    pub hold_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    pub fn new(trip_id: Uuid, seat_number: u32, seat_type: SeatType, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            seat_number,
            seat_type,
            status: SeatStatus::Available,
            is_booked: false,
            is_hold: false,
            hold_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Held with an expiry strictly in the future
    pub fn hold_active(&self, now: DateTime<Utc>) -> bool {
        self.is_hold && self.hold_expiry.map_or(false, |expiry| expiry > now)
    }

    /// Held, but the expiry is missing or already behind us
    pub fn hold_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.is_hold && self.hold_expiry.map_or(true, |expiry| expiry < now)
    }

    /// Can be taken by a new hold request right now
    pub fn is_free(&self, now: DateTime<Utc>) -> bool {
        !self.is_booked && !self.hold_active(now)
    }

    pub fn place_hold(&mut self, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.is_hold = true;
        self.hold_expiry = Some(expires_at);
        self.status = SeatStatus::Hold;
        self.updated_at = now;
    }

    pub fn release_hold(&mut self, now: DateTime<Utc>) {
        self.is_hold = false;
        self.hold_expiry = None;
        self.status = SeatStatus::Available;
        self.updated_at = now;
    }

    pub fn mark_booked(&mut self, now: DateTime<Utc>) {
        self.is_booked = true;
        self.is_hold = false;
        self.hold_expiry = None;
        self.status = SeatStatus::Booked;
        self.updated_at = now;
    }

    pub fn release_booking(&mut self, now: DateTime<Utc>) {
        self.is_booked = false;
        self.status = SeatStatus::Available;
        self.updated_at = now;
    }
}
