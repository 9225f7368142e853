//! Key server error types
//!
//! Lookup misses are not errors: they surface as `Option::None` from the
//! store and facade accessors.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{EntityType, KeyAlgorithm};

/// Errors returned by [`KeyServer`](crate::KeyServer) operations
#[derive(Debug, Error)]
pub enum KeyServerError {
    /// The scheduling capability could not allocate a timer. Fatal at boot:
    /// the cluster cannot serve without rotating secrets.
    #[error("Resource exhausted: {reason}")]
    ResourceExhausted { reason: String },

    /// The key generation capability is missing or failed. No state was
    /// modified.
    #[error("Key generation unavailable for {algorithm}: {reason}")]
    CryptoUnavailable {
        algorithm: KeyAlgorithm,
        reason: String,
    },

    /// Rotating state could not be serialized for replication
    #[error("Failed to encode rotating secrets: {0}")]
    Encode(#[source] postcard::Error),

    /// Replicated rotating state could not be decoded. No state was
    /// modified.
    #[error("Failed to decode rotating secrets: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl KeyServerError {
    /// Construct a [`KeyServerError::ResourceExhausted`]
    pub fn resource_exhausted(reason: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            reason: reason.into(),
        }
    }

    /// Construct a [`KeyServerError::CryptoUnavailable`]
    pub fn crypto_unavailable(algorithm: KeyAlgorithm, reason: impl fmt::Display) -> Self {
        Self::CryptoUnavailable {
            algorithm,
            reason: reason.to_string(),
        }
    }

    /// Whether the error should abort the owning process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. } | Self::Config(_))
    }
}

/// Malformed replicated rotating state
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Truncated input or an invalid value for a field
    #[error("malformed payload: {0}")]
    Malformed(#[from] postcard::Error),

    /// Bytes left over after a complete state was read
    #[error("{count} trailing bytes after rotating state")]
    TrailingBytes { count: usize },

    /// Generation ids for one class are not strictly increasing
    #[error("secret ids for {service} are not strictly increasing")]
    NonMonotonicSecretIds { service: EntityType },

    /// The version leaves no room for another batch
    #[error("version {version} is out of range")]
    VersionOutOfRange { version: u64 },

    /// A generation id leaves no room for another generation
    #[error("secret id {secret_id} for {service} is out of range")]
    SecretIdOutOfRange { service: EntityType, secret_id: u64 },

    /// Rotating secrets for a class that never receives them
    #[error("{service} is not a rotating service")]
    UnexpectedService { service: EntityType },
}

/// Result type for key server operations
pub type KeyServerResult<T> = Result<T, KeyServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(KeyServerError::resource_exhausted("no timer").is_fatal());
        assert!(
            !KeyServerError::CryptoUnavailable {
                algorithm: KeyAlgorithm::Aes128,
                reason: "offline".into(),
            }
            .is_fatal()
        );
        assert!(!KeyServerError::from(DecodeError::TrailingBytes { count: 2 }).is_fatal());
    }

    #[test]
    fn messages_name_the_cause() {
        let err = KeyServerError::CryptoUnavailable {
            algorithm: KeyAlgorithm::Aes256,
            reason: "backend offline".into(),
        };
        assert_eq!(
            err.to_string(),
            "Key generation unavailable for aes256: backend offline"
        );
        let err = DecodeError::NonMonotonicSecretIds {
            service: EntityType::StorageNode,
        };
        assert_eq!(
            err.to_string(),
            "secret ids for storage-node are not strictly increasing"
        );
    }

    #[test]
    fn decode_errors_are_not_fatal() {
        let errors = [
            DecodeError::VersionOutOfRange { version: u64::MAX },
            DecodeError::UnexpectedService {
                service: EntityType::Auth,
            },
        ];
        for err in errors {
            assert!(!KeyServerError::from(err).is_fatal());
        }
        assert_eq!(
            DecodeError::UnexpectedService {
                service: EntityType::Client
            }
            .to_string(),
            "client is not a rotating service"
        );
    }
}
