//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Format};

impl Config {
    /// Create configuration from environment variables
    ///
    /// - `KEYSERVER_LOG`, falling back to `RUST_LOG`: filter directive
    /// - `KEYSERVER_LOG_FORMAT`: `compact`, `pretty` or `json`
    /// - `KEYSERVER_LOG_{COLORS,TIME,TARGET,SOURCE}`: display flags
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply the [`from_env`](Self::from_env) variables on top of `self`.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_lookup(|name| std::env::var(name).ok())
    }

    /// [`with_env`](Self::with_env) with an explicit variable lookup.
    #[must_use]
    pub fn with_lookup(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = var("KEYSERVER_LOG").or_else(|| var("RUST_LOG")) {
            self.level = level;
        }

        // Unknown formats fall back to the default
        if let Some(format) = var("KEYSERVER_LOG_FORMAT") {
            self.format = format.parse().unwrap_or_default();
        }

        self.display.apply_env(&var);
        self
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                ..DisplayConfig::default()
            },
        }
    }

    /// Test configuration
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(Config::default().with_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn keyserver_log_wins_over_rust_log() {
        let config = Config::default().with_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("KEYSERVER_LOG", "keyserver=trace"),
        ]));
        assert_eq!(config.level, "keyserver=trace");

        let config = Config::default().with_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn format_and_display_overrides() {
        let config = Config::default().with_lookup(lookup(&[
            ("KEYSERVER_LOG_FORMAT", "json"),
            ("KEYSERVER_LOG_COLORS", "false"),
            ("KEYSERVER_LOG_SOURCE", "1"),
            ("KEYSERVER_LOG_TIME", "garbage"),
        ]));
        assert_eq!(config.format, Format::Json);
        assert!(!config.display.colors);
        assert!(config.display.source);
        assert!(config.display.time);
    }

    #[test]
    fn unknown_format_falls_back_to_compact() {
        let config = Config::default().with_lookup(lookup(&[("KEYSERVER_LOG_FORMAT", "xml")]));
        assert_eq!(config.format, Format::Compact);
    }

    #[test]
    fn overrides_apply_on_top_of_a_preset() {
        let config = Config::production().with_lookup(lookup(&[("KEYSERVER_LOG", "debug")]));
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, Format::Json);
    }

    #[test]
    fn presets() {
        assert_eq!(Config::production().format, Format::Json);
        assert!(!Config::production().display.colors);
        assert_eq!(Config::development().level, "debug");
        assert!(Config::development().display.source);
        assert!(!Config::test().display.time);
    }
}
