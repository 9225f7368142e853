//! Rotating secret aggregate
//!
//! [`RotatingState`] is the only replicated structure. It maps every service
//! class to its retained generations and carries the batch version used to
//! gate replication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::core::{CryptoKey, DecodeError, EntityType};
use crate::rotation::RotationError;

/// One generation of a service-class secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatingSecret {
    /// Per-class generation id, starting at 1
    pub secret_id: u64,

    /// Shared secret for the class
    pub secret: CryptoKey,

    /// Instant after which consumers must treat the secret as stale
    pub expiration: DateTime<Utc>,
}

impl RotatingSecret {
    /// Whether `now` is past the expiration.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }
}

/// Retained generations of one class, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotatingSecrets {
    generations: VecDeque<RotatingSecret>,
}

impl RotatingSecrets {
    /// Most recent generation
    pub fn latest(&self) -> Option<&RotatingSecret> {
        self.generations.back()
    }

    /// Generation with the given id, if still retained
    pub fn by_id(&self, secret_id: u64) -> Option<&RotatingSecret> {
        self.generations.iter().find(|s| s.secret_id == secret_id)
    }

    /// Generations oldest first
    pub fn iter(&self) -> impl Iterator<Item = &RotatingSecret> {
        self.generations.iter()
    }

    /// Number of retained generations
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Whether no generation is retained
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Id the next generation will receive, `None` once ids are exhausted.
    pub fn next_secret_id(&self) -> Option<u64> {
        self.latest().map_or(Some(1), |s| s.secret_id.checked_add(1))
    }

    /// Append a generation and drop the oldest ones beyond `retain`.
    fn push(&mut self, secret: RotatingSecret, retain: usize) {
        self.generations.push_back(secret);
        while self.generations.len() > retain.max(1) {
            self.generations.pop_front();
        }
    }

    fn ids_strictly_increasing(&self) -> bool {
        self.generations
            .iter()
            .zip(self.generations.iter().skip(1))
            .all(|(a, b)| a.secret_id < b.secret_id)
    }
}

impl<'a> IntoIterator for &'a RotatingSecrets {
    type Item = &'a RotatingSecret;
    type IntoIter = std::collections::vec_deque::Iter<'a, RotatingSecret>;

    fn into_iter(self) -> Self::IntoIter {
        self.generations.iter()
    }
}

/// Versioned rotating secrets for every service class.
///
/// Field order is the wire order: `version` first, then the class map in
/// [`EntityType`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatingState {
    version: u64,
    secrets: BTreeMap<EntityType, RotatingSecrets>,
}

impl RotatingState {
    /// Empty state at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed regeneration batches
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Retained generations for `service`
    pub fn secrets(&self, service: EntityType) -> Option<&RotatingSecrets> {
        self.secrets.get(&service)
    }

    /// Latest generation for `service`
    pub fn latest(&self, service: EntityType) -> Option<&RotatingSecret> {
        self.secrets(service).and_then(RotatingSecrets::latest)
    }

    /// Classes that have at least one generation, with their generations
    pub fn iter(&self) -> impl Iterator<Item = (EntityType, &RotatingSecrets)> {
        self.secrets.iter().map(|(service, secrets)| (*service, secrets))
    }

    /// Install a new generation for `service`, superseding the previous
    /// latest. Returns the new generation id.
    pub(crate) fn rotate(
        &mut self,
        service: EntityType,
        secret: CryptoKey,
        expiration: DateTime<Utc>,
        retain: usize,
    ) -> Result<u64, RotationError> {
        let generations = self.secrets.entry(service).or_default();
        let secret_id = generations
            .next_secret_id()
            .ok_or(RotationError::SecretIdExhausted { service })?;
        generations.push(
            RotatingSecret {
                secret_id,
                secret,
                expiration,
            },
            retain,
        );
        Ok(secret_id)
    }

    /// Open a batch. `None` leaves the state untouched at `u64::MAX`.
    pub(crate) fn bump_version(&mut self) -> Option<u64> {
        self.version = self.version.checked_add(1)?;
        Some(self.version)
    }

    /// Structural checks applied to replicated state before it is accepted.
    ///
    /// Counters must leave room for one more batch, and only rotating
    /// service classes may appear.
    pub(crate) fn validate(&self) -> Result<(), DecodeError> {
        if self.version == u64::MAX {
            return Err(DecodeError::VersionOutOfRange {
                version: self.version,
            });
        }
        for (service, generations) in &self.secrets {
            let service = *service;
            if !service.is_rotating_service() {
                return Err(DecodeError::UnexpectedService { service });
            }
            if !generations.ids_strictly_increasing() {
                return Err(DecodeError::NonMonotonicSecretIds { service });
            }
            if generations.latest().is_some_and(|s| s.secret_id == u64::MAX) {
                return Err(DecodeError::SecretIdOutOfRange {
                    service,
                    secret_id: u64::MAX,
                });
            }
        }
        Ok(())
    }
}

/// Diagnostic dump. Secrets appear as fingerprints only.
impl fmt::Display for RotatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rotating secrets (version {}):", self.version)?;
        if self.secrets.is_empty() {
            return writeln!(f, "  (none)");
        }
        for (service, generations) in &self.secrets {
            writeln!(f, "  {service}:")?;
            for s in generations {
                writeln!(
                    f,
                    "    id {} {} expires {}",
                    s.secret_id,
                    s.secret.fingerprint(),
                    s.expiration.to_rfc3339()
                )?;
            }
        }
        Ok(())
    }
}
