use serde::{Deserialize, Serialize};

use crate::{BookingError, BookingResult};

const MAX_HOLD_TIMEOUT_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Limits applied by the hold manager. Built from configuration once and
/// handed to the manager at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRules {
    #[serde(default = "default_hold_timeout_ms")]
    pub seat_hold_timeout_ms: u64,
    #[serde(default = "default_max_seats")]
    pub max_seats_per_booking: usize,
}

fn default_hold_timeout_ms() -> u64 { 300_000 }
fn default_max_seats() -> usize { 10 }

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            seat_hold_timeout_ms: default_hold_timeout_ms(),
            max_seats_per_booking: default_max_seats(),
        }
    }
}

impl BookingRules {
    pub fn validate(&self) -> BookingResult<()> {
        if self.seat_hold_timeout_ms == 0 || self.seat_hold_timeout_ms > MAX_HOLD_TIMEOUT_MS {
            return Err(BookingError::Configuration(format!(
                "seat_hold_timeout_ms must be between 1 and {}",
                MAX_HOLD_TIMEOUT_MS
            )));
        }
        if self.max_seats_per_booking == 0 {
            return Err(BookingError::Configuration(
                "max_seats_per_booking must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn hold_duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.seat_hold_timeout_ms.min(MAX_HOLD_TIMEOUT_MS) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = BookingRules::default();
        assert_eq!(rules.seat_hold_timeout_ms, 300_000);
        assert_eq!(rules.max_seats_per_booking, 10);
        assert_eq!(rules.hold_duration(), chrono::Duration::seconds(300));
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let rules = BookingRules { seat_hold_timeout_ms: 0, ..Default::default() };
        assert!(matches!(rules.validate(), Err(BookingError::Configuration(_))));

        let rules = BookingRules { max_seats_per_booking: 0, ..Default::default() };
        assert!(matches!(rules.validate(), Err(BookingError::Configuration(_))));
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let rules: BookingRules = serde_json::from_str(r#"{"max_seats_per_booking": 4}"#).unwrap();
        assert_eq!(rules.max_seats_per_booking, 4);
        assert_eq!(rules.seat_hold_timeout_ms, 300_000);
    }
}
