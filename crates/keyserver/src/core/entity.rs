//! Principal identities
//!
//! An [`EntityName`] is the `(type, id)` pair every secret is keyed by. The
//! [`EntityType`] doubles as the service class for rotating secrets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of cluster principal.
///
/// Declaration order is the canonical ordering used by the rotating-secret
/// map and therefore by the replicated encoding. Do not reorder variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// The authentication service itself
    Auth,
    /// Cluster monitor
    Monitor,
    /// Object storage daemon
    StorageNode,
    /// Metadata server
    MetadataNode,
    /// External client
    Client,
}

/// Service classes that receive rotating secrets, in regeneration order.
pub const ROTATING_SERVICES: [EntityType; 3] = [
    EntityType::Monitor,
    EntityType::StorageNode,
    EntityType::MetadataNode,
];

impl EntityType {
    /// Stable textual name, used in [`EntityName`] display and parsing.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Monitor => "monitor",
            Self::StorageNode => "storage-node",
            Self::MetadataNode => "metadata-node",
            Self::Client => "client",
        }
    }

    /// Whether this class is part of [`ROTATING_SERVICES`].
    pub fn is_rotating_service(self) -> bool {
        ROTATING_SERVICES.contains(&self)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from parsing an [`EntityType`] or [`EntityName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityParseError {
    /// The type component is not a known principal category.
    #[error("unknown entity type: {0}")]
    UnknownType(String),
    /// The input has no `.` separating type and id.
    #[error("entity name must be of the form <type>.<id>: {0}")]
    MissingSeparator(String),
    /// The id component is empty.
    #[error("entity id cannot be empty")]
    EmptyId,
}

impl FromStr for EntityType {
    type Err = EntityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Self::Auth),
            "monitor" => Ok(Self::Monitor),
            "storage-node" => Ok(Self::StorageNode),
            "metadata-node" => Ok(Self::MetadataNode),
            "client" => Ok(Self::Client),
            other => Err(EntityParseError::UnknownType(other.to_string())),
        }
    }
}

/// Identity of a principal holding a permanent secret.
///
/// # Examples
///
/// ```
/// use keyserver::{EntityName, EntityType};
///
/// let name: EntityName = "storage-node.3".parse().unwrap();
/// assert_eq!(name.entity_type(), EntityType::StorageNode);
/// assert_eq!(name.id(), "3");
/// assert_eq!(name.to_string(), "storage-node.3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityName {
    entity_type: EntityType,
    id: String,
}

impl EntityName {
    /// Create a name from its parts.
    pub fn new(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
        }
    }

    /// Principal category.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Instance id within the category.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.id)
    }
}

impl FromStr for EntityName {
    type Err = EntityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, id) = s
            .split_once('.')
            .ok_or_else(|| EntityParseError::MissingSeparator(s.to_string()))?;
        if id.is_empty() {
            return Err(EntityParseError::EmptyId);
        }
        Ok(Self::new(ty.parse()?, id))
    }
}
