//! Logger configuration

mod presets;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `EnvFilter` directive, e.g. `info` or `keyserver=debug,info`
    pub level: String,

    /// Output format
    pub format: Format,

    /// Per-event decorations
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Single line per event
    #[default]
    Compact,
    /// Multi-line, human oriented
    Pretty,
    /// Newline-delimited JSON
    Json,
}

impl Format {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(LogError::Env {
                variable: "KEYSERVER_LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// Which decorations each event carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DisplayConfig {
    /// ANSI colors
    pub colors: bool,
    /// Timestamp
    pub time: bool,
    /// Event target (module path)
    pub target: bool,
    /// Source file and line
    pub source: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            time: true,
            target: true,
            source: false,
        }
    }
}

impl DisplayConfig {
    /// Apply `KEYSERVER_LOG_COLORS`, `KEYSERVER_LOG_TIME`,
    /// `KEYSERVER_LOG_TARGET` and `KEYSERVER_LOG_SOURCE` overrides.
    ///
    /// Unparseable values are ignored.
    pub(crate) fn apply_env(&mut self, var: &impl Fn(&str) -> Option<String>) {
        let flag = |name: &str| var(name).and_then(|v| parse_bool(&v));
        if let Some(colors) = flag("KEYSERVER_LOG_COLORS") {
            self.colors = colors;
        }
        if let Some(time) = flag("KEYSERVER_LOG_TIME") {
            self.time = time;
        }
        if let Some(target) = flag("KEYSERVER_LOG_TARGET") {
            self.target = target;
        }
        if let Some(source) = flag("KEYSERVER_LOG_SOURCE") {
            self.source = source;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
