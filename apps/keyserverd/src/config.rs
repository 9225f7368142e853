//! Daemon configuration: defaults, then an optional TOML file, then
//! `KEYSERVER_*` environment variables.

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;

use keyserver::KeyServerConfig;

/// Effective daemon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Rotation settings
    pub keyserver: KeyServerConfig,

    /// Logging settings; `KEYSERVER_LOG*` variables override them
    pub log: keyserver_log::Config,
}

impl DaemonConfig {
    /// Load and validate.
    ///
    /// `KEYSERVER_ROTATION_INTERVAL=10m` sets `keyserver.rotation_interval`.
    /// `KEYSERVER_LOG*` is left to the logging crate and `KEYSERVER_CONFIG`
    /// names the file itself, so neither is read here.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        let figment = figment.merge(
            Env::prefixed("KEYSERVER_")
                .filter(|key| {
                    let key = key.as_str().to_ascii_lowercase();
                    !key.starts_with("log") && key != "config"
                })
                .map(|key| format!("keyserver.{key}").into()),
        );

        let mut config: Self = figment.extract()?;
        config.keyserver.validate()?;
        config.log = config.log.with_env();
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
