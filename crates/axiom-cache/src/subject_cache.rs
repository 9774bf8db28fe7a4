//! The one cache the predicate family shares across instances: `SubjectType`
//! memoizes `(base, class)` tree-closure membership under a single store-wide
//! cache, since many properties' `SubjectType` constraints test the same
//! `class` against overlapping `base` entities.
//!
//! `ValueType` caches the same kind of answer but does not share it: each
//! `ValueType` instance owns its own [`BoundedCache`] scoped to the single
//! property it constrains, matching the source behavior where the cache
//! lives on the constraint instance rather than the store.

use axiom_core::EntityId;

use crate::lru_cache::BoundedCache;

/// Key for the shared subject/value-type membership cache: does `base`
/// belong (directly or via subclass/instance closure) to `class`.
pub type TypeMembershipKey = (EntityId, EntityId);

/// A shared `(base, class) -> bool` cache, sized per
/// `EngineConfig::effective_subject_type_cache_capacity`.
pub type SubjectTypeCache = BoundedCache<TypeMembershipKey, bool>;

/// A per-instance `target id -> violates` cache for a single `ValueType`
/// constraint, sized per `EngineConfig::effective_value_type_cache_capacity`.
/// Unlike `SubjectTypeCache`, `classes` is fixed per `ValueType` instance, so
/// the key collapses to the resolved target id alone.
pub type ValueTypeCache = BoundedCache<EntityId, bool>;
