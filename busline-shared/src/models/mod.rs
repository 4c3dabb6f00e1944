pub mod events;

pub use events::{BookingCancelledEvent, BookingConfirmedEvent, SeatsHeldEvent};
