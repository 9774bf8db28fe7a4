//! The structural position a constraint governs.

use std::collections::BTreeSet;

/// Structural position of a claim within its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Scope {
    Main,
    Qualifier,
    Reference,
}

impl Scope {
    /// All three scopes, used as the default for constraints that don't
    /// restrict their applicability.
    pub fn all() -> BTreeSet<Scope> {
        [Scope::Main, Scope::Qualifier, Scope::Reference]
            .into_iter()
            .collect()
    }
}
