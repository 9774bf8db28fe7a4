//! A single constraint declaration: a predicate bound to the property it was
//! declared on, its severity, and the scopes it applies to.

use std::collections::BTreeSet;

use axiom_core::{PropertyId, Scope, Status};

use crate::predicate::ConstraintPredicate;

/// One parsed `P2302` declaration. `claim_id` is the snak id of the
/// declaring statement, used for traceability (e.g. linking a violation back
/// to the constraint that raised it); `None` for constraints synthesized
/// without a backing statement (`HasValidReference`, `LargeChange`).
pub struct Constraint {
    pub property: PropertyId,
    pub claim_id: Option<String>,
    pub predicate: ConstraintPredicate,
    pub status: Status,
    /// Scopes this declaration was explicitly narrowed to (via `P4680`
    /// qualifiers); effective scope is this set intersected with the
    /// predicate's own [`ConstraintPredicate::intrinsic_scopes`].
    pub scopes: BTreeSet<Scope>,
}

impl Constraint {
    pub fn new(
        property: impl Into<PropertyId>,
        claim_id: Option<String>,
        predicate: ConstraintPredicate,
        status: Status,
        scopes: BTreeSet<Scope>,
    ) -> Self {
        Self {
            property: property.into(),
            claim_id,
            predicate,
            status,
            scopes,
        }
    }

    /// Whether this constraint applies to claims in `scope`, per the
    /// intersection of its declared scopes and the predicate's own.
    pub fn may_check(&self, scope: Scope) -> bool {
        let effective = &self.scopes & &self.predicate.intrinsic_scopes();
        effective.contains(&scope)
    }
}
