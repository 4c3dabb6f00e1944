pub mod inventory;
pub mod summary;

pub use inventory::{generate_seat_map, SeatInventory};
pub use summary::SeatSummary;
