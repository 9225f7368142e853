//! Core types: identities, key material, errors

mod entity;
mod error;
mod key;

pub use entity::{EntityName, EntityParseError, EntityType, ROTATING_SERVICES};
pub use error::{DecodeError, KeyServerError, KeyServerResult};
pub use key::{CryptoKey, KeyAlgorithm};
