//! Symmetric key material
//!
//! Provides [`CryptoKey`], an algorithm-tagged secret that zeroizes its bytes
//! on drop, compares in constant time, and only ever shows a fingerprint in
//! `Debug` and diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric algorithm a secret is intended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAlgorithm {
    /// AES with a 128-bit key
    #[default]
    Aes128,
    /// AES with a 256-bit key
    Aes256,
}

impl KeyAlgorithm {
    /// Length in bytes of a secret for this algorithm.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes256 => 32,
        }
    }

    /// Stable identifier used in logs and errors.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes128 => "aes128",
            Self::Aes256 => "aes256",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw secret bytes, wiped on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
struct SecretBytes(Vec<u8>);

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SecretBytes {}

/// Opaque symmetric secret tagged with its algorithm.
///
/// The bytes are never exposed by `Debug`, `Display`, or logging; use
/// [`fingerprint`](Self::fingerprint) to identify a key in diagnostics and
/// [`expose_secret`](Self::expose_secret) when the material is actually
/// needed.
///
/// # Examples
///
/// ```
/// use keyserver::{CryptoKey, KeyAlgorithm};
///
/// let key = CryptoKey::new(KeyAlgorithm::Aes128, chrono::Utc::now(), vec![7; 16]);
/// assert_eq!(key.expose_secret(|bytes| bytes.len()), 16);
/// assert!(format!("{key:?}").contains(&key.fingerprint()));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoKey {
    algorithm: KeyAlgorithm,
    created: DateTime<Utc>,
    secret: SecretBytes,
}

impl CryptoKey {
    /// Wrap freshly generated material.
    pub fn new(algorithm: KeyAlgorithm, created: DateTime<Utc>, secret: Vec<u8>) -> Self {
        Self {
            algorithm,
            created,
            secret: SecretBytes(secret),
        }
    }

    /// Algorithm tag.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// When the material was generated.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.secret.0.len()
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.secret.0.is_empty()
    }

    /// Access the raw bytes within a closure scope.
    pub fn expose_secret<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        f(&self.secret.0)
    }

    /// Non-reversible identifier: `sha256:` followed by the first 8 digest
    /// bytes in hex.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.secret.0);
        format!("sha256:{}", hex::encode(&digest[..8]))
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("algorithm", &self.algorithm)
            .field("created", &self.created)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
