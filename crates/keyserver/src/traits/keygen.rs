//! Key generation capability

use rand::RngCore;

use crate::core::KeyAlgorithm;

/// Key generation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyGenError {
    /// The generator has no implementation for the requested algorithm
    #[error("algorithm {algorithm} is not supported")]
    Unsupported { algorithm: KeyAlgorithm },

    /// The generator's backend failed
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Source of fresh symmetric key material.
///
/// Implementations are called while the key server lock is held during
/// rotation, so they must be fast and must not call back into the server.
pub trait KeyGenerator: Send + Sync {
    /// Produce `algorithm.key_len()` bytes of fresh secret material.
    fn create(&self, algorithm: KeyAlgorithm) -> Result<Vec<u8>, KeyGenError>;
}

/// Generator backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn create(&self, algorithm: KeyAlgorithm) -> Result<Vec<u8>, KeyGenError> {
        let mut secret = vec![0u8; algorithm.key_len()];
        rand::rng().fill_bytes(&mut secret);
        Ok(secret)
    }
}
