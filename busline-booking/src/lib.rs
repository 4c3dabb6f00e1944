pub mod events;
pub mod hold;
pub mod lifecycle;

pub use events::{BookingEvent, BookingEvents};
pub use hold::{HoldManager, HoldRequest};
pub use lifecycle::BookingLifecycle;

#[cfg(test)]
pub(crate) mod test_support;
