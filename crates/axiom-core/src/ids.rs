//! Stable identifiers for entities and properties.

use std::fmt;

/// A Wikibase-style entity id (`Q42`, `P31`, ...).
///
/// Equality and hashing are by the raw id string; callers that need
/// redirect-aware equality must resolve the target first (see
/// `axiom_core::traits::EntityStore`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A property id (`P17`, ...). Kept as a plain string type alias: properties
/// are used purely as map keys and string comparisons throughout the engine,
/// mirroring how the source data (Wikibase JSON) represents them.
pub type PropertyId = String;
