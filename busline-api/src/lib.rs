pub mod cli;
pub mod error;
pub mod service;

pub use error::{ApiError, ApiResult};
pub use service::BookingService;
