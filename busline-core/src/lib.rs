pub mod booking;
pub mod clock;
pub mod repository;
pub mod rules;
pub mod seat;

pub use booking::{Booking, BookingSeat, BookingStatus, Gender, PassengerDetails};
pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{BookingStore, TripDirectory, TripInfo, TripTransaction, UserDirectory};
pub use rules::BookingRules;
pub use seat::{Seat, SeatStatus, SeatType};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type BookingResult<T> = Result<T, BookingError>;
