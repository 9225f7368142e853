//! Construction of [`KeyServer`]

use std::sync::Arc;

use crate::config::KeyServerConfig;
use crate::core::KeyServerResult;
use crate::rotation::TokioTimer;
use crate::server::KeyServer;
use crate::traits::{Clock, KeyGenerator, RandomKeyGenerator, SystemClock, Timer};

/// Builder for [`KeyServer`].
///
/// Every capability is optional. Defaults are [`RandomKeyGenerator`],
/// [`SystemClock`] and a [`TokioTimer`] on the current runtime.
///
/// # Examples
///
/// ```
/// use keyserver::{KeyServer, KeyServerConfig};
/// use keyserver::testing::ManualTimer;
/// use std::sync::Arc;
///
/// let server = KeyServer::builder()
///     .config(KeyServerConfig::default())
///     .timer(Arc::new(ManualTimer::new()))
///     .build()
///     .unwrap();
/// assert_eq!(server.rotating_version(), 0);
/// ```
#[derive(Default)]
#[must_use]
pub struct KeyServerBuilder {
    config: KeyServerConfig,
    generator: Option<Arc<dyn KeyGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    timer: Option<Arc<dyn Timer>>,
}

impl KeyServerBuilder {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: KeyServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the key generation capability
    pub fn generator(mut self, generator: Arc<dyn KeyGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the clock used for issuance and expiration stamps
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the scheduling capability driving rotation
    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Validate the configuration and assemble the server.
    ///
    /// # Errors
    ///
    /// - [`KeyServerError::Config`](crate::KeyServerError::Config) if the
    ///   configuration is rejected
    /// - [`KeyServerError::ResourceExhausted`](crate::KeyServerError::ResourceExhausted)
    ///   if no timer was given and the caller is not inside a tokio runtime
    pub fn build(self) -> KeyServerResult<KeyServer> {
        self.config.validate()?;
        let grace_window = self.config.grace_window()?;

        let timer: Arc<dyn Timer> = match self.timer {
            Some(timer) => timer,
            None => Arc::new(TokioTimer::current()?),
        };
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(RandomKeyGenerator));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(KeyServer::assemble(
            self.config,
            grace_window,
            generator,
            clock,
            timer,
        ))
    }
}
