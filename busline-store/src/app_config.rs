use busline_core::BookingRules;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub booking_rules: BookingRules,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { channel_capacity: 100 }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. BUSLINE__BOOKING_RULES__MAX_SEATS_PER_BOOKING=4
            .add_source(config::Environment::with_prefix("BUSLINE").separator("__"))
            .build()?;

        s.try_deserialize::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, config::ConfigError> {
        self.booking_rules
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Config>()?
            .validated()
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let cfg = parse(
            r#"
            [database]
            url = "postgres://localhost/busline"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.booking_rules, BookingRules::default());
        assert_eq!(cfg.events.channel_capacity, 100);
    }

    #[test]
    fn test_booking_rules_override() {
        let cfg = parse(
            r#"
            [database]
            url = "postgres://localhost/busline"

            [booking_rules]
            seat_hold_timeout_ms = 60000
            max_seats_per_booking = 4
            "#,
        )
        .unwrap();

        assert_eq!(cfg.booking_rules.seat_hold_timeout_ms, 60_000);
        assert_eq!(cfg.booking_rules.max_seats_per_booking, 4);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let result = parse(
            r#"
            [database]
            url = "postgres://localhost/busline"

            [booking_rules]
            max_seats_per_booking = 0
            "#,
        );
        assert!(result.is_err());
    }
}
