//! Key server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::KeyAlgorithm;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("{field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Cluster-wide key server settings.
///
/// Durations are written in humantime form (`"1h"`, `"90s"`) when
/// serialized.
///
/// # Example
///
/// ```
/// use keyserver::KeyServerConfig;
/// use std::time::Duration;
///
/// let config = KeyServerConfig {
///     rotation_interval: Duration::from_secs(600),
///     ..KeyServerConfig::default()
/// };
/// config.validate().unwrap();
/// assert_eq!(config.grace_window().unwrap(), chrono::Duration::minutes(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyServerConfig {
    /// Time between regeneration batches
    #[serde(with = "humantime_serde")]
    pub rotation_interval: Duration,

    /// Expiration of a rotating secret is `issued + grace_multiplier × rotation_interval`
    pub grace_multiplier: u32,

    /// Rotating generations kept per service class (1 = latest only)
    pub retained_generations: usize,

    /// Algorithm requested from the key generator
    pub secret_algorithm: KeyAlgorithm,
}

impl Default for KeyServerConfig {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(3600),
            grace_multiplier: 3,
            retained_generations: 3,
            secret_algorithm: KeyAlgorithm::Aes128,
        }
    }
}

impl KeyServerConfig {
    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "rotation_interval",
                reason: "must be greater than zero".into(),
            });
        }
        if self.grace_multiplier == 0 {
            return Err(ConfigError::InvalidValue {
                field: "grace_multiplier",
                reason: "must be at least 1".into(),
            });
        }
        if self.retained_generations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retained_generations",
                reason: "must be at least 1".into(),
            });
        }
        let window = self.grace_window()?;
        if chrono::Utc::now().checked_add_signed(window).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "rotation_interval",
                reason: format!("expiration {window} past now is out of the representable time range"),
            });
        }
        Ok(())
    }

    /// Lifetime given to every rotating secret at issuance.
    pub fn grace_window(&self) -> Result<chrono::Duration, ConfigError> {
        let overflow = || ConfigError::InvalidValue {
            field: "grace_multiplier",
            reason: format!(
                "{} x {:?} overflows the representable time range",
                self.grace_multiplier, self.rotation_interval
            ),
        };
        let window = self
            .rotation_interval
            .checked_mul(self.grace_multiplier)
            .ok_or_else(overflow)?;
        chrono::Duration::from_std(window).map_err(|_| overflow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = KeyServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.grace_window().unwrap(), chrono::Duration::hours(3));
    }

    #[test]
    fn rejects_zero_values() {
        let cases = [
            KeyServerConfig {
                rotation_interval: Duration::ZERO,
                ..KeyServerConfig::default()
            },
            KeyServerConfig {
                grace_multiplier: 0,
                ..KeyServerConfig::default()
            },
            KeyServerConfig {
                retained_generations: 0,
                ..KeyServerConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn rejects_overflowing_grace_window() {
        let config = KeyServerConfig {
            rotation_interval: Duration::from_secs(u64::MAX / 2),
            ..KeyServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("grace_multiplier:"));
    }

    #[test]
    fn rejects_expiration_past_the_time_range() {
        // fits in a TimeDelta, but not once added to the current instant
        let config = KeyServerConfig {
            rotation_interval: Duration::from_secs(100_000 * 365 * 24 * 3600),
            ..KeyServerConfig::default()
        };
        assert!(config.grace_window().is_ok());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("rotation_interval:"), "{err}");
    }

    #[test]
    fn serializes_durations_in_humantime() {
        let json = serde_json::to_value(KeyServerConfig::default()).unwrap();
        assert_eq!(json["rotation_interval"], "1h");
        assert_eq!(json["secret_algorithm"], "aes128");

        let parsed: KeyServerConfig =
            serde_json::from_str(r#"{"rotation_interval": "15m", "grace_multiplier": 2}"#).unwrap();
        assert_eq!(parsed.rotation_interval, Duration::from_secs(900));
        assert_eq!(parsed.grace_multiplier, 2);
        assert_eq!(parsed.retained_generations, 3);
    }
}
