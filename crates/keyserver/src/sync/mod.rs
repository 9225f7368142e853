//! Replication of rotating secrets to non-authoritative replicas
//!
//! A replica sends its current version; the authority answers with a
//! [`RotatingSnapshot`] only when the replica is behind. Applying a snapshot
//! trusts the caller to have gated on freshness.

mod codec;

pub use codec::{RotatingSnapshot, decode, encode, snapshot};
