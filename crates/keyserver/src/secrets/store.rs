//! Identity to key bookkeeping

use indexmap::IndexMap;

use crate::core::{CryptoKey, EntityName};

/// Permanent secrets keyed by principal identity.
///
/// Entries never expire. Iteration follows insertion order; overwriting an
/// existing identity keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    secrets: IndexMap<EntityName, CryptoKey>,
}

impl SecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the secret for `name`.
    ///
    /// Returns the secret that was replaced, if any.
    pub fn add(&mut self, name: EntityName, key: CryptoKey) -> Option<CryptoKey> {
        self.secrets.insert(name, key)
    }

    /// Secret installed for `name`
    pub fn get(&self, name: &EntityName) -> Option<&CryptoKey> {
        self.secrets.get(name)
    }

    /// Whether `name` has a secret
    pub fn contains(&self, name: &EntityName) -> bool {
        self.secrets.contains_key(name)
    }

    /// Remove the secret for `name`, preserving the order of the rest.
    pub fn remove(&mut self, name: &EntityName) -> Option<CryptoKey> {
        self.secrets.shift_remove(name)
    }

    /// Installed identities in insertion order
    pub fn names(&self) -> impl Iterator<Item = &EntityName> {
        self.secrets.keys()
    }

    /// Number of installed identities
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether no identity is installed
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Human-readable listing of installed identities.
    ///
    /// Not a machine-parseable format.
    pub fn list(&self) -> String {
        if self.secrets.is_empty() {
            return "no installed auth entries!".to_string();
        }
        let mut out = String::from("installed auth entries:\n");
        for name in self.secrets.keys() {
            out.push_str(&name.to_string());
            out.push('\n');
        }
        out
    }
}
