//! Permanent per-identity secrets

mod store;

pub use store::SecretStore;
