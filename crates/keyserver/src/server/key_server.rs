//! Key server facade
//!
//! Every public operation takes the single state lock for its full
//! duration. The lock is never held across a suspension point or a call
//! back into the server, so timer callbacks and concurrent lookups
//! serialize without deadlocking.

use chrono::TimeDelta;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::KeyServerConfig;
use crate::core::{CryptoKey, EntityName, EntityType, KeyServerError, KeyServerResult};
use crate::rotation::{RotatingSecret, RotatingState, RotationReport, Rotator};
use crate::secrets::SecretStore;
use crate::server::KeyServerBuilder;
use crate::sync::{self, RotatingSnapshot};
use crate::traits::{Clock, KeyGenerator, Timer, TimerHandle};

/// Authoritative store of permanent and rotating secrets.
///
/// Cloning is cheap; clones share the same state.
///
/// # Examples
///
/// ```
/// use keyserver::{EntityType, KeyServer, KeyServerConfig};
/// use keyserver::testing::ManualTimer;
/// use std::sync::Arc;
///
/// let timer = Arc::new(ManualTimer::new());
/// let server = KeyServer::builder()
///     .config(KeyServerConfig::default())
///     .timer(timer.clone())
///     .build()
///     .unwrap();
///
/// server.start(true).unwrap();
/// assert_eq!(server.rotating_version(), 1);
/// assert!(server.get_service_secret(EntityType::Monitor).is_some());
///
/// // The armed timer fires: next batch.
/// timer.fire_next();
/// assert_eq!(server.rotating_version(), 2);
/// ```
#[derive(Clone)]
pub struct KeyServer {
    shared: Arc<Shared>,
}

struct Shared {
    config: KeyServerConfig,
    grace_window: TimeDelta,
    generator: Arc<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    timer: Arc<dyn Timer>,
    inner: Mutex<Inner>,
    /// Captured by timer callbacks so a pending timer never keeps the
    /// server alive.
    this: Weak<Shared>,
}

#[derive(Default)]
struct Inner {
    secrets: SecretStore,
    rotating: RotatingState,
    scheduled: Option<TimerHandle>,
    /// Identifies the armed chain; callbacks from older chains are ignored.
    epoch: u64,
    running: bool,
}

impl KeyServer {
    /// Start building a server
    pub fn builder() -> KeyServerBuilder {
        KeyServerBuilder::new()
    }

    pub(crate) fn assemble(
        config: KeyServerConfig,
        grace_window: TimeDelta,
        generator: Arc<dyn KeyGenerator>,
        clock: Arc<dyn Clock>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        let shared = Arc::new_cyclic(|this| Shared {
            config,
            grace_window,
            generator,
            clock,
            timer,
            inner: Mutex::new(Inner::default()),
            this: this.clone(),
        });
        Self { shared }
    }

    /// Configuration the server was built with
    pub fn config(&self) -> &KeyServerConfig {
        &self.shared.config
    }

    // ── Rotation chain ──────────────────────────────────────────────────

    /// Arm the rotation chain.
    ///
    /// With `initialize`, one regeneration batch runs first (first boot
    /// with empty state). Any chain already armed is cancelled, so at most
    /// one exists.
    ///
    /// # Errors
    ///
    /// [`KeyServerError::ResourceExhausted`] if the timer cannot be
    /// allocated. The initial batch, if requested, has already been
    /// applied and the chain stays stopped.
    pub fn start(&self, initialize: bool) -> KeyServerResult<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock();
        inner.disarm();

        if initialize {
            shared.generate_all(&mut inner);
        }

        let interval = shared.config.rotation_interval;
        shared.arm(&mut inner, interval).inspect_err(|e| {
            error!(error = %e, "Failed to arm rotation timer");
        })?;
        info!(
            interval = ?interval,
            version = inner.rotating.version(),
            "Rotation started"
        );
        Ok(())
    }

    /// Cancel the pending rotation timer.
    ///
    /// A callback already racing with `stop` observes the stopped chain and
    /// neither rotates nor rearms. [`start`](Self::start) may be called
    /// again afterwards.
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.running {
            inner.disarm();
            info!(version = inner.rotating.version(), "Rotation stopped");
        }
    }

    /// Whether a rotation chain is armed and its pending timer is live.
    ///
    /// A chain whose timer was cancelled from outside, for example by
    /// [`TokioTimer::shutdown`](crate::TokioTimer::shutdown), is not running.
    pub fn is_running(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.running
            && inner
                .scheduled
                .as_ref()
                .is_some_and(|handle| !handle.is_cancelled())
    }

    /// Timer expiry: run one batch, then rearm for `interval`.
    ///
    /// Ignored when the chain is stopped. A rearm failure is logged and
    /// leaves the chain stopped.
    pub fn on_timeout(&self, interval: Duration) {
        let mut inner = self.shared.inner.lock();
        self.shared.on_timeout(&mut inner, interval);
    }

    /// Run one regeneration batch for every service class.
    pub fn generate_all_rotating_secrets(&self) -> RotationReport {
        let mut inner = self.shared.inner.lock();
        self.shared.generate_all(&mut inner)
    }

    // ── Permanent secrets ───────────────────────────────────────────────

    /// Secret installed for `name`
    pub fn get_secret(&self, name: &EntityName) -> Option<CryptoKey> {
        self.shared.inner.lock().secrets.get(name).cloned()
    }

    /// Whether `name` has a secret
    pub fn contains(&self, name: &EntityName) -> bool {
        self.shared.inner.lock().secrets.contains(name)
    }

    /// Insert or overwrite the secret for `name`.
    pub fn add_secret(&self, name: EntityName, key: CryptoKey) {
        debug!(entity = %name, fingerprint = %key.fingerprint(), "Secret installed");
        self.shared.inner.lock().secrets.add(name, key);
    }

    /// Remove the secret for `name`. Returns whether it existed.
    pub fn remove_secret(&self, name: &EntityName) -> bool {
        let removed = self.shared.inner.lock().secrets.remove(name).is_some();
        if removed {
            debug!(entity = %name, "Secret removed");
        }
        removed
    }

    /// Install fresh material for `name` and return it.
    ///
    /// Material is requested before the lock is taken.
    ///
    /// # Errors
    ///
    /// [`KeyServerError::CryptoUnavailable`] if the generator fails; the
    /// store is left untouched.
    pub fn generate_secret(&self, name: EntityName) -> KeyServerResult<CryptoKey> {
        let algorithm = self.shared.config.secret_algorithm;
        let material = self
            .shared
            .generator
            .create(algorithm)
            .map_err(|e| KeyServerError::crypto_unavailable(algorithm, e))?;
        let key = CryptoKey::new(algorithm, self.shared.clock.now(), material);
        self.add_secret(name, key.clone());
        Ok(key)
    }

    /// Identities in insertion order
    pub fn entity_names(&self) -> Vec<EntityName> {
        self.shared.inner.lock().secrets.names().cloned().collect()
    }

    /// Newline-joined listing of installed identities for operators.
    pub fn list_secrets(&self) -> String {
        self.shared.inner.lock().secrets.list()
    }

    // ── Rotating secrets ────────────────────────────────────────────────

    /// Latest generation for `service`; `None` until its first rotation.
    pub fn get_service_secret(&self, service: EntityType) -> Option<RotatingSecret> {
        self.shared.inner.lock().rotating.latest(service).cloned()
    }

    /// A retained generation of `service` by id.
    pub fn get_service_secret_by_id(
        &self,
        service: EntityType,
        secret_id: u64,
    ) -> Option<RotatingSecret> {
        self.shared
            .inner
            .lock()
            .rotating
            .secrets(service)
            .and_then(|generations| generations.by_id(secret_id))
            .cloned()
    }

    /// All retained generations of `service`, oldest first.
    pub fn service_secrets(&self, service: EntityType) -> Vec<RotatingSecret> {
        self.shared
            .inner
            .lock()
            .rotating
            .secrets(service)
            .map(|generations| generations.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current batch version
    pub fn rotating_version(&self) -> u64 {
        self.shared.inner.lock().rotating.version()
    }

    /// Copy of the whole rotating aggregate
    pub fn rotating_state(&self) -> RotatingState {
        self.shared.inner.lock().rotating.clone()
    }

    /// Diagnostic dump of rotating secrets with fingerprints in place of
    /// key material.
    pub fn describe_rotating(&self) -> String {
        self.shared.inner.lock().rotating.to_string()
    }

    // ── Replication ─────────────────────────────────────────────────────

    /// Encoded rotating state for a replica at version `since`, or `None`
    /// when the replica is up to date.
    ///
    /// # Errors
    ///
    /// [`KeyServerError::Encode`] if serialization fails.
    pub fn updated_rotating(&self, since: u64) -> KeyServerResult<Option<RotatingSnapshot>> {
        let inner = self.shared.inner.lock();
        sync::snapshot(&inner.rotating, since)
    }

    /// Replace the local rotating state with a decoded payload and return it.
    ///
    /// No freshness check is made: the caller must have obtained `payload`
    /// through [`updated_rotating`](Self::updated_rotating) against a newer
    /// authority.
    ///
    /// # Errors
    ///
    /// [`KeyServerError::Decode`] on malformed input; local state is left
    /// untouched.
    pub fn decode_rotating(&self, payload: &[u8]) -> KeyServerResult<RotatingState> {
        let state = sync::decode(payload)?;
        let mut inner = self.shared.inner.lock();
        debug!(
            from = inner.rotating.version(),
            to = state.version(),
            "Rotating secrets replaced from replica payload"
        );
        inner.rotating = state.clone();
        Ok(state)
    }
}

impl fmt::Debug for KeyServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("KeyServer")
            .field("config", &self.shared.config)
            .field("entities", &inner.secrets.len())
            .field("rotating_version", &inner.rotating.version())
            .field("running", &inner.running)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn disarm(&mut self) {
        if let Some(handle) = self.scheduled.take() {
            handle.cancel();
        }
        self.running = false;
    }
}

impl Shared {
    fn generate_all(&self, inner: &mut Inner) -> RotationReport {
        let rotator = Rotator {
            generator: self.generator.as_ref(),
            algorithm: self.config.secret_algorithm,
            grace_window: self.grace_window,
            retain: self.config.retained_generations,
        };
        let report = rotator.generate_all(&mut inner.rotating, self.clock.now());
        info!(
            version = report.version,
            rotated = report.rotated.len(),
            failed = report.failed.len(),
            "Rotating secrets regenerated"
        );
        report
    }

    /// Schedule the next expiry of a new chain.
    fn arm(&self, inner: &mut Inner, interval: Duration) -> KeyServerResult<()> {
        inner.epoch += 1;
        let epoch = inner.epoch;
        let this = self.this.clone();
        let handle = self.timer.schedule_once(
            interval,
            Box::new(move || {
                if let Some(shared) = this.upgrade() {
                    shared.fire(epoch, interval);
                }
            }),
        )?;
        inner.scheduled = Some(handle);
        inner.running = true;
        Ok(())
    }

    fn fire(&self, epoch: u64, interval: Duration) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "Ignoring timer from a superseded chain");
            return;
        }
        self.on_timeout(&mut inner, interval);
    }

    fn on_timeout(&self, inner: &mut Inner, interval: Duration) {
        if !inner.running {
            debug!("Rotation stopped, ignoring timeout");
            return;
        }
        inner.disarm();
        self.generate_all(inner);
        if let Err(e) = self.arm(inner, interval) {
            error!(
                error = %e,
                version = inner.rotating.version(),
                "Failed to rearm rotation timer, rotation halted"
            );
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.inner.get_mut().disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, ManualTimer, SequenceKeyGenerator};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    struct Fixture {
        server: KeyServer,
        timer: Arc<ManualTimer>,
        generator: Arc<SequenceKeyGenerator>,
    }

    fn fixture() -> Fixture {
        let timer = Arc::new(ManualTimer::new());
        let generator = Arc::new(SequenceKeyGenerator::new());
        let server = KeyServer::builder()
            .timer(timer.clone())
            .generator(generator.clone())
            .clock(Arc::new(ManualClock::new(Utc::now())))
            .build()
            .unwrap();
        Fixture {
            server,
            timer,
            generator,
        }
    }

    #[test]
    fn restart_cancels_previous_chain() {
        let f = fixture();
        f.server.start(true).unwrap();
        f.server.start(false).unwrap();

        assert_eq!(f.timer.scheduled(), 2);
        assert_eq!(f.timer.pending(), 1);
        assert!(f.timer.fire_next());
        assert_eq!(f.server.rotating_version(), 2);
    }

    #[test]
    fn superseded_callback_is_ignored() {
        let f = fixture();
        f.server.start(false).unwrap();
        // simulate a callback that was already running when the chain was replaced
        f.server.shared.fire(0, Duration::from_secs(1));
        assert_eq!(f.server.rotating_version(), 0);
        assert_eq!(f.timer.pending(), 1);
    }

    #[test]
    fn generate_secret_failure_leaves_store_untouched() {
        let f = fixture();
        let name = EntityName::new(EntityType::Client, "admin");
        f.generator.set_failing(true);

        let err = f.server.generate_secret(name.clone()).unwrap_err();

        assert!(matches!(err, KeyServerError::CryptoUnavailable { .. }));
        assert!(!f.server.contains(&name));
        assert_eq!(f.server.list_secrets(), "no installed auth entries!");
    }

    #[test]
    fn dropping_server_cancels_pending_timer() {
        let f = fixture();
        f.server.start(false).unwrap();
        assert_eq!(f.timer.pending(), 1);

        drop(f.server);
        assert_eq!(f.timer.pending(), 0);
        assert!(!f.timer.fire_next());
    }

    #[test]
    fn debug_does_not_dump_secrets() {
        let f = fixture();
        f.server.start(true).unwrap();
        let debug = format!("{:?}", f.server);
        assert!(debug.contains("rotating_version: 1"));
        assert!(!debug.contains("CryptoKey"));
    }
}
