//! Logger builder implementation

use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, DisplayConfig, Format};
use crate::error::{LogError, LogResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build a boxed fmt layer in the given style (`compact`, `pretty`, `json`)
/// with the display flags applied. Dropping the timestamp changes the layer
/// type, hence the boxing.
macro_rules! create_fmt_layer {
    ($style:ident, $display:expr) => {{
        let display: &DisplayConfig = $display;
        let layer = tracing_subscriber::fmt::layer()
            .$style()
            .with_ansi(display.colors)
            .with_target(display.target)
            .with_file(display.source)
            .with_line_number(display.source)
            .with_writer(std::io::stderr);
        let boxed: BoxedLayer = if display.time {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        };
        boxed
    }};
}

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Parse the level into an `EnvFilter`.
    ///
    /// # Errors
    ///
    /// [`LogError::Filter`] if the directive does not parse.
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            directive: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Build and install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already set
    pub fn build(self) -> LogResult<()> {
        let filter = self.filter()?;
        let fmt_layer = match self.config.format {
            Format::Compact => create_fmt_layer!(compact, &self.config.display),
            Format::Pretty => create_fmt_layer!(pretty, &self.config.display),
            Format::Json => create_fmt_layer!(json, &self.config.display),
        };

        Registry::default()
            .with(fmt_layer)
            .with(filter)
            .try_init()
            .map_err(|e| LogError::Init(e.to_string()))
    }
}
