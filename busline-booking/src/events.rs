use busline_shared::models::{BookingCancelledEvent, BookingConfirmedEvent, SeatsHeldEvent};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Domain events emitted after a booking transaction commits
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    SeatsHeld(SeatsHeldEvent),
    BookingConfirmed(BookingConfirmedEvent),
    BookingCancelled(BookingCancelledEvent),
}

impl BookingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::SeatsHeld(_) => "seats_held",
            BookingEvent::BookingConfirmed(_) => "booking_confirmed",
            BookingEvent::BookingCancelled(_) => "booking_cancelled",
        }
    }
}

/// Fan-out of booking events to in-process listeners (notifications,
/// ticketing). Publishing never fails the operation that produced the event.
#[derive(Clone)]
pub struct BookingEvents {
    tx: broadcast::Sender<BookingEvent>,
}

impl BookingEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: BookingEvent) {
        let name = event.name();
        // no subscribers is fine
        match self.tx.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Published booking event"),
            Err(_) => debug!(event = name, "No listeners for booking event"),
        }
    }
}

impl Default for BookingEvents {
    fn default() -> Self {
        Self::new(100)
    }
}
