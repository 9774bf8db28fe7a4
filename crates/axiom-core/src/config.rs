//! Tunables for caches and collaborator behavior. All fields are optional so
//! a config can be partially specified (e.g. loaded from TOML/JSON) and
//! defaulted the rest of the way via the `effective_*` accessors.

use serde::{Deserialize, Serialize};

/// Engine-wide configuration: cache capacities and the redirect-chain cap.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of each `ValueType` predicate's own target-id cache.
    /// Default: 100.
    pub value_type_cache_capacity: Option<u64>,
    /// Capacity of the store-owned, shared `SubjectType` `(base, class)`
    /// cache. Default: 1000.
    pub subject_type_cache_capacity: Option<u64>,
    /// Maximum redirect hops `resolve_target_entity` will follow before
    /// treating the chain as a cycle. Default: 10.
    pub redirect_hop_limit: Option<u32>,
    /// Below this many uncached properties, `get_item_constraints` loads
    /// them individually instead of batching a SPARQL discovery query.
    /// Default: 5.
    pub item_constraint_batch_threshold: Option<usize>,
}

impl EngineConfig {
    pub fn effective_value_type_cache_capacity(&self) -> u64 {
        self.value_type_cache_capacity.unwrap_or(100)
    }

    pub fn effective_subject_type_cache_capacity(&self) -> u64 {
        self.subject_type_cache_capacity.unwrap_or(1000)
    }

    pub fn effective_redirect_hop_limit(&self) -> u32 {
        self.redirect_hop_limit.unwrap_or(10)
    }

    pub fn effective_item_constraint_batch_threshold(&self) -> usize {
        self.item_constraint_batch_threshold.unwrap_or(5)
    }
}
