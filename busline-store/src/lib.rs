pub mod app_config;
pub mod database;
pub mod memory;
pub mod postgres;

pub use database::DbClient;
pub use memory::{MemoryDirectory, MemoryStore};
pub use postgres::{PgBookingStore, PgDirectory};

use busline_core::BookingError;

pub(crate) fn storage_err(e: sqlx::Error) -> BookingError {
    BookingError::Storage(e.to_string())
}
