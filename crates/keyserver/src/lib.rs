//! Key server - permanent and rotating secrets for cluster HMAC authentication
//!
//! Owns two kinds of secret material:
//!
//! - **Permanent secrets** issued to named principals ([`EntityName`])
//! - **Rotating secrets** per service class, regenerated on a fixed
//!   schedule and used to build time-limited session tickets
//!
//! Rotating secrets carry a monotonic version so that non-authoritative
//! replicas pull an encoded [`RotatingSnapshot`] only when they are stale.
//!
//! # Features
//!
//! - **Single lock** - every [`KeyServer`] operation runs under one mutex;
//!   readers never observe a half-finished batch
//! - **Injected capabilities** - key generation, clock and timer are traits
//! - **Cancellable rotation** - the self-rearming timer chain stops on
//!   [`KeyServer::stop`] or when the server is dropped
//! - **No raw key logging** - diagnostics show SHA-256 fingerprints only
#![forbid(unsafe_code)]

/// Runtime configuration
pub mod config;
/// Identities, key material and errors
pub mod core;
/// Rotating secrets, regeneration batches and the tokio timer
pub mod rotation;
/// Permanent per-identity secret bookkeeping
pub mod secrets;
/// Thread-safe facade
pub mod server;
/// Replication codec for rotating secrets
pub mod sync;
/// Deterministic capabilities for tests
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
/// Capability traits: key generation, clock, timer
pub mod traits;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::config::{ConfigError, KeyServerConfig};
pub use crate::core::{
    CryptoKey, DecodeError, EntityName, EntityParseError, EntityType, KeyAlgorithm,
    KeyServerError, KeyServerResult, ROTATING_SERVICES,
};
pub use crate::rotation::{
    RotatingSecret, RotatingSecrets, RotatingState, RotationError, RotationReport, TokioTimer,
};
pub use crate::secrets::SecretStore;
pub use crate::server::{KeyServer, KeyServerBuilder};
pub use crate::sync::RotatingSnapshot;
pub use crate::traits::{
    Clock, KeyGenError, KeyGenerator, RandomKeyGenerator, SystemClock, Timer, TimerCallback,
    TimerHandle,
};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::config::KeyServerConfig;
    pub use crate::core::{
        CryptoKey, EntityName, EntityType, KeyAlgorithm, KeyServerError, KeyServerResult,
        ROTATING_SERVICES,
    };
    pub use crate::rotation::{
        RotatingSecret, RotatingState, RotationError, RotationReport, TokioTimer,
    };
    pub use crate::server::KeyServer;
    pub use crate::sync::RotatingSnapshot;
    pub use crate::traits::{Clock, KeyGenerator, Timer};
}
