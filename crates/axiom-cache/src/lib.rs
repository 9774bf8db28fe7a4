//! # axiom-cache
//!
//! Bounded, strict-LRU caches used by the class/subclass-walking predicates
//! (`SubjectType`, `ValueType`) to bound how many collaborator round-trips a
//! single evaluation run can cost.

pub mod lru_cache;
pub mod subject_cache;

pub use lru_cache::BoundedCache;
pub use subject_cache::{SubjectTypeCache, TypeMembershipKey, ValueTypeCache};
