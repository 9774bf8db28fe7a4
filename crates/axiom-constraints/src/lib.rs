//! # axiom-constraints
//!
//! The constraint predicate family and the per-property constraint store:
//! parses `P2302` declarations into [`Constraint`]s, caches them per
//! property, and exposes the bulk item-constraint discovery query used by
//! entity-level checks.

pub mod best_claim;
pub mod constraint;
pub mod membership;
pub mod predicate;
pub mod resolve;
pub mod sparql;
pub mod store;
pub mod time_math;

pub use constraint::Constraint;
pub use predicate::{ConstraintPredicate, PredicateKind, PredicateTag, ReferenceScopeSource};
pub use store::parse::PropertyDatatype;
pub use store::{ConstraintsStore, StoreError};
