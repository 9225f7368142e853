//! Regeneration batches

use chrono::{DateTime, TimeDelta, Utc};

use crate::core::{CryptoKey, EntityType, KeyAlgorithm, ROTATING_SERVICES};
use crate::rotation::RotatingState;
use crate::traits::{KeyGenError, KeyGenerator};

/// Why one class was not rotated in a batch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    /// The key generator failed
    #[error("key generation failed: {0}")]
    KeyGen(#[from] KeyGenError),

    /// `now + grace_window` is past the last representable instant
    #[error("expiration {now} + {grace_window} is out of range")]
    ExpirationOverflow {
        now: DateTime<Utc>,
        grace_window: TimeDelta,
    },

    /// The class already holds the largest generation id
    #[error("secret ids for {service} are exhausted")]
    SecretIdExhausted { service: EntityType },

    /// The state already holds the largest version; the batch was refused
    #[error("rotating version is exhausted")]
    VersionExhausted,
}

/// Outcome of one regeneration batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    /// Version after the batch
    pub version: u64,

    /// Classes that received a new generation, in rotation order
    pub rotated: Vec<EntityType>,

    /// Classes whose generation failed; their previous generation is kept
    pub failed: Vec<(EntityType, RotationError)>,
}

impl RotationReport {
    /// Whether every class was rotated
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parameters shared by every rotation in a batch.
pub(crate) struct Rotator<'a> {
    pub generator: &'a dyn KeyGenerator,
    pub algorithm: KeyAlgorithm,
    pub grace_window: TimeDelta,
    pub retain: usize,
}

impl Rotator<'_> {
    /// Generate and install one new generation for `service`.
    ///
    /// The state is untouched on any error.
    pub fn rotate_secret(
        &self,
        state: &mut RotatingState,
        service: EntityType,
        now: DateTime<Utc>,
    ) -> Result<u64, RotationError> {
        let expiration = now.checked_add_signed(self.grace_window).ok_or(
            RotationError::ExpirationOverflow {
                now,
                grace_window: self.grace_window,
            },
        )?;
        let material = self.generator.create(self.algorithm)?;
        let secret = CryptoKey::new(self.algorithm, now, material);
        let fingerprint = secret.fingerprint();

        let secret_id = state.rotate(service, secret, expiration, self.retain)?;
        tracing::debug!(
            service = %service,
            secret_id,
            fingerprint = %fingerprint,
            expiration = %expiration,
            "Rotating secret generated"
        );
        Ok(secret_id)
    }

    /// Bump the version exactly once and rotate every service class.
    ///
    /// A failed class does not stop the batch. The version is bumped even
    /// when every class failed so that replicas observe the attempt. A state
    /// already at `u64::MAX` is left untouched and every class is reported
    /// as [`RotationError::VersionExhausted`].
    pub fn generate_all(&self, state: &mut RotatingState, now: DateTime<Utc>) -> RotationReport {
        let Some(version) = state.bump_version() else {
            tracing::error!(
                version = state.version(),
                "Rotating version exhausted, batch refused"
            );
            return RotationReport {
                version: state.version(),
                rotated: Vec::new(),
                failed: ROTATING_SERVICES
                    .iter()
                    .map(|service| (*service, RotationError::VersionExhausted))
                    .collect(),
            };
        };

        let mut rotated = Vec::with_capacity(ROTATING_SERVICES.len());
        let mut failed = Vec::new();

        for service in ROTATING_SERVICES {
            match self.rotate_secret(state, service, now) {
                Ok(_) => rotated.push(service),
                Err(e) => {
                    tracing::warn!(
                        service = %service,
                        algorithm = %self.algorithm,
                        error = %e,
                        "Rotating secret generation failed, keeping previous generation"
                    );
                    failed.push((service, e));
                }
            }
        }

        RotationReport {
            version,
            rotated,
            failed,
        }
    }
}
