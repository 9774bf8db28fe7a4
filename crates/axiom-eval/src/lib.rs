//! # axiom-eval
//!
//! Orchestrates [`axiom_diff`] and [`axiom_constraints`] into the two checks
//! a host actually wants: the score contribution of a single edit
//! (`evaluate_change`) and a full-entity pass over everything currently
//! asserted (`evaluate_entity`).
//!
//! Score sign convention: **positive is worse**. A claim or entity that
//! starts clean and becomes violated contributes a positive score; one that
//! starts violated and gets fixed contributes negative (`violated = score >
//! 0`, `fixed = score < 0`). `Status::weight()` scales the magnitude
//! (`Suggestion` = 1, `Regular` = 2, `Mandatory` = 4) but only on *updates*
//! (spec §4.1); additions and removals always contribute their raw `{-1, 0,
//! 1}` unweighted. A newly-added claim under a `Suggestion`-status
//! constraint is clamped to `min(0, score)` — additions can only ever hurt a
//! suggestion's score, not help it; fixes (removals, updates) are always
//! credited in full.

use std::sync::Arc;

use axiom_constraints::{ConstraintsStore, PredicateKind, PredicateTag, PropertyDatatype, StoreError};
use axiom_core::{CollaboratorError, Context, PropertyId, Revision, Scope, Status};
use axiom_diff::{diff_entities, property_set_delta, DiffKind};

/// Failures surfaced while evaluating a change or an entity: either the
/// constraint store failed to load a property's declarations, or a
/// predicate's own collaborator call (e.g. `Symmetric`'s entity fetch,
/// `Error404`'s HTTP probe) failed directly. Spec §7: a transient
/// collaborator failure aborts the whole evaluation; no partial `Result` is
/// ever returned. Kept distinct from `axiom_constraints::StoreError` so
/// callers match on `axiom_eval`'s own error type.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Looks up a property's declared Wikibase datatype, needed only to decide
/// which of the always-on synthesized constraints
/// (`NoLinksToDisambiguation`/`NoSelfLink` for item-typed properties,
/// `LargeChange` for quantities) apply. Mirrors the
/// trait-plus-`Arc`-blanket-impl collaborator pattern used throughout
/// `axiom-core`.
pub trait PropertyDatatypes: Send + Sync {
    fn datatype_of(&self, prop: &str) -> PropertyDatatype;
}

impl<T: PropertyDatatypes + ?Sized> PropertyDatatypes for Arc<T> {
    fn datatype_of(&self, prop: &str) -> PropertyDatatype {
        (**self).datatype_of(prop)
    }
}

/// The outcome of checking one constraint against one change or claim: a
/// signed score contribution, plus enough identifying detail for a host to
/// render a human-facing violation report.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub property: PropertyId,
    pub predicate: PredicateTag,
    pub scope: Scope,
    pub status: Status,
    pub score: i64,
}

impl CheckResult {
    /// Whether this result represents a problem worth surfacing. Per the
    /// crate's sign convention, a positive score is a newly (or still)
    /// violated constraint; a negative score is a fix.
    pub fn is_violation(&self) -> bool {
        self.score > 0
    }

    pub fn is_fix(&self) -> bool {
        self.score < 0
    }
}

/// Accumulated outcome of [`ConstraintEvaluator::evaluate_change`]: a
/// running sum of every dispatched constraint's score contribution, plus the
/// individual results it was built from (spec §4.4, §6:
/// `Result.{score, evaluated, get_violated_constraints, get_fixed_constraints}`).
#[derive(Debug, Clone, Default)]
pub struct EvalResult {
    pub evaluated: Vec<CheckResult>,
}

impl EvalResult {
    pub fn new(evaluated: Vec<CheckResult>) -> Self {
        Self { evaluated }
    }

    /// The aggregate score across every dispatched result. Addition is
    /// associative-commutative, so this is independent of dispatch order.
    pub fn score(&self) -> i64 {
        self.evaluated.iter().map(|r| r.score).sum()
    }

    pub fn get_violated_constraints(&self) -> Vec<&CheckResult> {
        self.evaluated.iter().filter(|r| r.is_violation()).collect()
    }

    pub fn get_fixed_constraints(&self) -> Vec<&CheckResult> {
        self.evaluated.iter().filter(|r| r.is_fix()).collect()
    }
}

/// Ties a [`ConstraintsStore`] to a host's datatype lookup and exposes the
/// two top-level checks.
pub struct ConstraintEvaluator {
    store: Arc<ConstraintsStore>,
    datatypes: Arc<dyn PropertyDatatypes>,
}

impl ConstraintEvaluator {
    pub fn new(store: Arc<ConstraintsStore>, datatypes: Arc<dyn PropertyDatatypes>) -> Self {
        Self { store, datatypes }
    }

    /// Score every claim/qualifier atom between `old_rev` and `new_rev`,
    /// plus any entity-level constraint (`ItemRequires`, `ConflictsWith`,
    /// `SubjectType`) whose satisfaction could have changed because the
    /// entity's property set itself changed.
    ///
    /// `current`, when given, is the entity's present-day state: an atom
    /// whose old claim is still present there was reverted by some later
    /// edit, and an atom whose new claim's property is entirely absent
    /// there was undone — both are skipped rather than scored (spec §4.4
    /// step 1). This lets a host evaluate one edit in a span of several
    /// without double-counting changes a later edit in the same span
    /// already cancelled out.
    pub fn evaluate_change(
        &self,
        old_rev: &Revision,
        new_rev: &Revision,
        current: Option<&Revision>,
    ) -> Result<EvalResult, EvalError> {
        let mut results = Vec::new();

        for atom in diff_entities(old_rev, new_rev) {
            if let Some(current) = current {
                let reverted = atom.old_claim.is_some_and(|c| current.has_claim_matching(c));
                let undone = atom
                    .new_claim
                    .is_some_and(|c| !current.property_set().contains(&c.property));
                if reverted || undone {
                    continue;
                }
            }

            let prop = atom.property();
            let constraints = self.store.get_constraints(prop, self.datatypes.datatype_of(prop))?;
            for c in constraints
                .iter()
                .filter(|c| c.predicate.kind() == PredicateKind::Claim && c.may_check(atom.scope))
            {
                let ctx = Context::new(old_rev, new_rev, atom.old_claim, atom.new_claim);
                let raw = match atom.kind() {
                    DiffKind::Addition => c.predicate.score_for_addition(&ctx)?,
                    DiffKind::Removal => c.predicate.score_for_removal(&ctx)?,
                    DiffKind::Update => c.predicate.score_for_update(&ctx)?,
                };
                let adjusted = clamp_suggestion_addition(raw, atom.kind(), c.status);
                if adjusted == 0 {
                    continue;
                }
                let score = match atom.kind() {
                    DiffKind::Update => adjusted * c.status.weight(),
                    DiffKind::Addition | DiffKind::Removal => adjusted,
                };
                results.push(CheckResult {
                    property: prop.clone(),
                    predicate: c.predicate.tag(),
                    scope: atom.scope,
                    status: c.status,
                    score,
                });
            }
        }

        results.extend(self.recheck_property_set_dependents(old_rev, new_rev, current)?);
        let result = EvalResult::new(results);
        tracing::debug!(
            entity = new_rev.entity_id.as_str(),
            evaluated = result.evaluated.len(),
            score = result.score(),
            "evaluated change"
        );
        Ok(result)
    }

    /// Spec §4.4 steps 3-4: properties whose mere presence changed, and
    /// properties unaffected themselves but whose declared constraints
    /// reference one that did.
    fn recheck_property_set_dependents(
        &self,
        old_rev: &Revision,
        new_rev: &Revision,
        current: Option<&Revision>,
    ) -> Result<Vec<CheckResult>, EvalError> {
        let delta = property_set_delta(old_rev, new_rev, current);
        let mut added: Vec<PropertyId> = delta.added.into_iter().map(|p| p.clone()).collect();
        let mut removed: Vec<PropertyId> = delta.removed.into_iter().map(|p| p.clone()).collect();
        added.sort();
        added.dedup();
        removed.sort();
        removed.dedup();

        let mut results = Vec::new();

        // Step 3: the added/removed property's own entity-level
        // constraints, dispatched as an addition or removal against that
        // property directly (no diff atom names it, since its own presence
        // is what changed, not a claim value under it).
        for prop in &added {
            results.extend(self.score_own_entity_constraints(prop, old_rev, new_rev, true)?);
        }
        for prop in &removed {
            results.extend(self.score_own_entity_constraints(prop, old_rev, new_rev, false)?);
        }

        // Step 4: properties present in both revisions, re-checked as
        // updates if `get_item_constraints` finds they declare one of the
        // five entity-level predicates (`ItemRequires`/`ConflictsWith`/
        // `SubjectType` gated by a touched related property, e.g. a
        // `ConflictsWith` naming a property that was just added elsewhere;
        // `LabelInLanguage`/`DescriptionInLanguage` ungated, since a label or
        // description fix can land independent of which claim property moved).
        let mut touched: Vec<PropertyId> = added.iter().chain(removed.iter()).cloned().collect();
        touched.sort();
        touched.dedup();
        if touched.is_empty() {
            return Ok(results);
        }

        let candidates: Vec<PropertyId> = old_rev
            .property_set()
            .intersection(&new_rev.property_set())
            .map(|p| (**p).clone())
            .collect();
        if candidates.is_empty() {
            return Ok(results);
        }

        let ctx = Context::for_revisions(old_rev, new_rev);
        for tag in [
            PredicateTag::ItemRequires,
            PredicateTag::ConflictsWith,
            PredicateTag::SubjectType,
            PredicateTag::LabelInLanguage,
            PredicateTag::DescriptionInLanguage,
        ] {
            let item = constraint_item_for(tag);
            // The `P2306`-related-property gate only makes sense for the
            // predicates parameterized by a related property (`ItemRequires`/
            // `ConflictsWith`'s own `prop`, `SubjectType`'s `{P31,P279}`
            // dependency); `LabelInLanguage`/`DescriptionInLanguage` declare no
            // `P2306` qualifier at all, so gating their discovery query by
            // `touched` would just drop every candidate.
            let changed = match tag {
                PredicateTag::LabelInLanguage | PredicateTag::DescriptionInLanguage => None,
                _ => Some(touched.as_slice()),
            };
            let discovered = self.store.get_item_constraints(&candidates, tag, item, changed)?;
            for prop in discovered {
                let constraints = self.store.get_constraints(&prop, self.datatypes.datatype_of(&prop))?;
                for c in constraints.iter().filter(|c| c.predicate.tag() == tag) {
                    let raw = c.predicate.score_for_update(&ctx)?;
                    if raw == 0 {
                        continue;
                    }
                    results.push(CheckResult {
                        property: prop.clone(),
                        predicate: tag,
                        scope: Scope::Main,
                        status: c.status,
                        score: raw * c.status.weight(),
                    });
                }
            }
        }
        Ok(results)
    }

    fn score_own_entity_constraints(
        &self,
        prop: &PropertyId,
        old_rev: &Revision,
        new_rev: &Revision,
        is_addition: bool,
    ) -> Result<Vec<CheckResult>, EvalError> {
        let constraints = self.store.get_constraints(prop, self.datatypes.datatype_of(prop))?;
        let ctx = Context::for_revisions(old_rev, new_rev);
        let mut results = Vec::new();
        for c in constraints.iter().filter(|c| {
            matches!(c.predicate.tag(), PredicateTag::ItemRequires | PredicateTag::ConflictsWith | PredicateTag::SubjectType)
        }) {
            let raw = if is_addition {
                c.predicate.score_for_addition(&ctx)?
            } else {
                c.predicate.score_for_removal(&ctx)?
            };
            let kind = if is_addition { DiffKind::Addition } else { DiffKind::Removal };
            let adjusted = clamp_suggestion_addition(raw, kind, c.status);
            if adjusted == 0 {
                continue;
            }
            // Additions/removals are never status-weighted (spec §4.1: the
            // multiplier applies to updates only).
            results.push(CheckResult {
                property: prop.clone(),
                predicate: c.predicate.tag(),
                scope: Scope::Main,
                status: c.status,
                score: adjusted,
            });
        }
        Ok(results)
    }

    /// A full scan of `rev`'s current claims and their qualifiers against
    /// every property's constraints, independent of any prior revision.
    /// Reference-scoped predicates are exercised via `evaluate_change`'s
    /// diff atoms rather than here: references are never diffed, so a bare
    /// revision has no occasion to check them standalone.
    pub fn evaluate_entity(&self, rev: &Revision) -> Result<Vec<CheckResult>, EvalError> {
        let mut results = Vec::new();

        for prop in rev.property_set() {
            let constraints = self.store.get_constraints(prop, self.datatypes.datatype_of(prop))?;
            for c in constraints.iter().filter(|c| c.may_check(Scope::Main)) {
                match c.predicate.kind() {
                    PredicateKind::Entity => {
                        if !c.predicate.satisfied(rev)? {
                            results.push(CheckResult {
                                property: prop.clone(),
                                predicate: c.predicate.tag(),
                                scope: Scope::Main,
                                status: c.status,
                                score: c.status.weight(),
                            });
                        }
                    }
                    PredicateKind::Claim => {
                        for claim in rev.claims_for(prop) {
                            if c.predicate.violates(claim, rev)? {
                                results.push(CheckResult {
                                    property: prop.clone(),
                                    predicate: c.predicate.tag(),
                                    scope: Scope::Main,
                                    status: c.status,
                                    score: c.status.weight(),
                                });
                            }
                        }
                    }
                }
            }
        }

        // Every qualifier snak, checked against the constraints declared
        // for the qualifier's own property rather than its host claim's.
        for prop in rev.property_set() {
            for claim in rev.claims_for(prop) {
                for (qual_prop, quals) in &claim.qualifiers {
                    let constraints = self.store.get_constraints(qual_prop, self.datatypes.datatype_of(qual_prop))?;
                    for c in constraints
                        .iter()
                        .filter(|c| c.predicate.kind() == PredicateKind::Claim && c.may_check(Scope::Qualifier))
                    {
                        for qualifier_claim in quals {
                            if c.predicate.violates(qualifier_claim, rev)? {
                                results.push(CheckResult {
                                    property: qual_prop.clone(),
                                    predicate: c.predicate.tag(),
                                    scope: Scope::Qualifier,
                                    status: c.status,
                                    score: c.status.weight(),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(results)
    }
}

/// A `SUGGESTION`-status addition that would otherwise register a new
/// violation (`raw == 1`) is dropped to 0: suggestions only ever count
/// against a score when they're fixed, never when newly broken (spec §4.1,
/// scenario 6). Removals and updates are never clamped — fixes are always
/// credited in full regardless of status.
fn clamp_suggestion_addition(raw: i64, kind: DiffKind, status: Status) -> i64 {
    if kind == DiffKind::Addition && status == Status::Suggestion {
        raw.min(0)
    } else {
        raw
    }
}

fn constraint_item_for(tag: PredicateTag) -> &'static str {
    use axiom_constraints::store::constraint_items::constraint_type;
    match tag {
        PredicateTag::ItemRequires => constraint_type::ITEM_REQUIRES,
        PredicateTag::ConflictsWith => constraint_type::CONFLICTS_WITH,
        PredicateTag::SubjectType => constraint_type::SUBJECT_TYPE,
        PredicateTag::LabelInLanguage => constraint_type::LABEL_IN_LANGUAGE,
        PredicateTag::DescriptionInLanguage => constraint_type::DESCRIPTION_IN_LANGUAGE,
        _ => unreachable!("constraint_item_for called with a non-property-set-gated tag"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_constraints::PropertyDatatype;
    use axiom_core::{CollaboratorError, EntityId, EntityStore, HttpClient, HttpResponse, Rank, SnakType, SparqlClient, SparqlRow, Value};
    use indexmap::IndexMap;
    use rustc_hash::FxHashMap;

    struct EmptyStore;
    impl EntityStore for EmptyStore {
        fn load(&self, id: &EntityId) -> Result<Revision, CollaboratorError> {
            Ok(Revision {
                entity_id: id.clone(),
                revision_id: 1,
                claims: IndexMap::new(),
                labels: FxHashMap::default(),
                descriptions: FxHashMap::default(),
            })
        }
        fn load_old_revision(&self, id: &EntityId, _revision_id: u64) -> Result<Revision, CollaboratorError> {
            self.load(id)
        }
    }

    struct NullSparql;
    impl SparqlClient for NullSparql {
        fn ask(&self, _query: &str) -> Result<bool, CollaboratorError> {
            Ok(true)
        }
        fn select(&self, _query: &str) -> Result<Vec<SparqlRow>, CollaboratorError> {
            Ok(Vec::new())
        }
    }

    struct NullHttp;
    impl HttpClient for NullHttp {
        fn get(&self, _url: &str) -> Result<HttpResponse, CollaboratorError> {
            Ok(HttpResponse { ok: true, status: 200 })
        }
    }

    struct AllOther;
    impl PropertyDatatypes for AllOther {
        fn datatype_of(&self, _prop: &str) -> PropertyDatatype {
            PropertyDatatype::Other
        }
    }

    fn claim(id: &str, property: &str, target: Option<Value>) -> axiom_core::Claim {
        axiom_core::Claim {
            id: id.to_string(),
            on_item: EntityId::from("Q1"),
            property: property.to_string(),
            snak_type: SnakType::Value,
            target,
            rank: Rank::Normal,
            qualifiers: IndexMap::new(),
            sources: Vec::new(),
            is_qualifier: false,
            is_reference: false,
        }
    }

    fn revision(claims: Vec<axiom_core::Claim>) -> Revision {
        let mut map: IndexMap<PropertyId, Vec<axiom_core::Claim>> = IndexMap::new();
        for c in claims {
            map.entry(c.property.clone()).or_default().push(c);
        }
        Revision {
            entity_id: EntityId::from("Q1"),
            revision_id: 1,
            claims: map,
            labels: FxHashMap::default(),
            descriptions: FxHashMap::default(),
        }
    }

    fn evaluator() -> ConstraintEvaluator {
        let store = ConstraintsStore::new(Arc::new(EmptyStore), Arc::new(NullSparql), Arc::new(NullHttp), Default::default());
        ConstraintEvaluator::new(store, Arc::new(AllOther))
    }

    #[test]
    fn no_declared_constraints_means_no_results_besides_synthesized_reference_check() {
        let eval = evaluator();
        let old = revision(vec![]);
        let new = revision(vec![claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))))]);
        let result = eval.evaluate_change(&old, &new, None).unwrap();
        // HasValidReference is synthesized for every property, but an
        // addition with no sources at all contributes 0 (no references to
        // count), so nothing besides that should be emitted here.
        assert!(result.evaluated.iter().all(|r| r.predicate == PredicateTag::HasValidReference));
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn evaluate_entity_runs_without_error_on_empty_revision() {
        let eval = evaluator();
        let rev = revision(vec![]);
        assert!(eval.evaluate_entity(&rev).unwrap().is_empty());
    }

    #[test]
    fn is_violation_is_positive_score_is_fix_is_negative() {
        let violated = CheckResult {
            property: "P17".to_string(),
            predicate: PredicateTag::OneOf,
            scope: Scope::Main,
            status: Status::Regular,
            score: 2,
        };
        let fixed = CheckResult { score: -2, ..violated.clone() };
        assert!(violated.is_violation());
        assert!(!violated.is_fix());
        assert!(fixed.is_fix());
        assert!(!fixed.is_violation());
    }

    #[test]
    fn current_bracket_skips_atoms_already_reverted() {
        let eval = evaluator();
        let old = revision(vec![claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))))]);
        let new = revision(vec![claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q6"))))]);
        // Current still shows the old value: some later edit reverted this one.
        let current = revision(vec![claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))))]);
        let result = eval.evaluate_change(&old, &new, Some(&current)).unwrap();
        assert!(result.evaluated.iter().all(|r| r.predicate == PredicateTag::HasValidReference));
    }
}
