//! Logging bootstrap for the key server
//!
//! Builds a `tracing` subscriber from a [`Config`]: an `EnvFilter` driven
//! by the configured level plus one fmt layer in compact, pretty or JSON
//! form, written to stderr.
//!
//! ```no_run
//! use keyserver_log::{Config, init};
//!
//! init(Config::from_env())?;
//! tracing::info!("ready");
//! # Ok::<(), keyserver_log::LogError>(())
//! ```
#![forbid(unsafe_code)]

mod builder;
mod config;
mod error;

pub use builder::LoggerBuilder;
pub use config::{Config, DisplayConfig, Format};
pub use error::{LogError, LogResult};

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// - [`LogError::Filter`] if the level is not a valid filter directive
/// - [`LogError::Init`] if a global subscriber is already installed
pub fn init(config: Config) -> LogResult<()> {
    LoggerBuilder::from_config(config).build()
}

/// Install a subscriber configured from the environment.
///
/// # Errors
///
/// See [`init`].
pub fn auto_init() -> LogResult<()> {
    init(Config::from_env())
}
