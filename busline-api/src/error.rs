use busline_core::BookingError;
use serde_json::{json, Value};

/// Caller-facing error categories. Internal failures are logged here and
/// reach the caller without their details.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal Server Error")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP-style status code for the category
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal => 500,
        }
    }

    pub fn body(&self) -> Value {
        json!({
            "error": self.to_string(),
            "status": self.status_code(),
        })
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => ApiError::BadRequest(msg),
            BookingError::NotFound(msg) => ApiError::NotFound(msg),
            BookingError::Conflict(msg) => ApiError::Conflict(msg),
            BookingError::Configuration(msg) | BookingError::Storage(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                ApiError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_errors_map_to_categories() {
        let err: ApiError = BookingError::Validation("At least one seat must be selected".into()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.body()["error"], "At least one seat must be selected");

        let err: ApiError = BookingError::NotFound("Trip x not found".into()).into();
        assert_eq!(err.status_code(), 404);

        let err: ApiError = BookingError::Conflict("Seat 2 is not available".into()).into();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ApiError = BookingError::Storage("connection refused on 10.0.0.3".into()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.body()["error"], "Internal Server Error");

        let err: ApiError = BookingError::Configuration("Trip has no bus".into()).into();
        assert!(matches!(err, ApiError::Internal));
    }
}
