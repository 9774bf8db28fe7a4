//! # axiom-diff
//!
//! Turns a pair of entity revisions into the flat list of diff atoms the
//! evaluator scores: one atom per changed top-level claim, plus one atom per
//! affected qualifier snak nested under it — every qualifier of a claim pair
//! that changed between revisions, or every qualifier of a claim that was
//! wholly added or removed (it moves one-sided with its parent). Also
//! exposes the property-set delta used to decide which entity-level
//! constraints need re-checking after an edit (spec §4.3/§4.4).
//!
//! Claims are paired across revisions by their stable snak id, per property
//! bucket (spec §4.3: "for each property present in either, index both
//! sides by claim snak id"). Qualifiers use a *different* pairing rule,
//! scoped to a single updated claim pair: `cmp_key` (snaktype, target)
//! equality, first-match-wins in encounter order, with a lone leftover pair
//! promoted to an update — the only way a qualifier can change without its
//! identity surviving the match (spec §4.3, last two paragraphs). Reference
//! snaks are not diffed at all in this design; `HasValidReference` scores
//! reference changes by counting instead (spec §4.1, §9).

use std::collections::BTreeSet;

use axiom_core::{same_as, Claim, PropertyId, Revision, Scope};
use rustc_hash::FxHashSet;

/// One unit of change the evaluator scores: a claim or qualifier snak
/// present on only one side (addition/removal) or changed between both
/// (update).
#[derive(Debug, Clone, Copy)]
pub struct DiffAtom<'a> {
    pub scope: Scope,
    pub old_claim: Option<&'a Claim>,
    pub new_claim: Option<&'a Claim>,
}

/// Which of the three dispatch shapes an atom represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Addition,
    Removal,
    Update,
}

impl<'a> DiffAtom<'a> {
    pub fn kind(&self) -> DiffKind {
        match (self.old_claim, self.new_claim) {
            (None, Some(_)) => DiffKind::Addition,
            (Some(_), None) => DiffKind::Removal,
            (Some(_), Some(_)) => DiffKind::Update,
            (None, None) => unreachable!("diff atom with neither side present"),
        }
    }

    /// The property either side's claim belongs to.
    pub fn property(&self) -> &'a PropertyId {
        self.old_claim
            .map(|c| &c.property)
            .or_else(|| self.new_claim.map(|c| &c.property))
            .expect("diff atom with neither side present")
    }
}

/// Pair `old`/`new` claim lists by snak id and push one atom per id in the
/// union: additions/removals where only one side has the id, updates where
/// both sides have it but `same_as` says they differ.
fn diff_claim_list<'a>(
    old: &'a [Claim],
    new: &'a [Claim],
    scope: Scope,
    atoms: &mut Vec<DiffAtom<'a>>,
    mut on_update: impl FnMut(&'a Claim, &'a Claim, &mut Vec<DiffAtom<'a>>),
) {
    let mut ids: Vec<&str> = old.iter().map(|c| c.id.as_str()).chain(new.iter().map(|c| c.id.as_str())).collect();
    ids.sort_unstable();
    ids.dedup();

    for id in ids {
        let o = old.iter().find(|c| c.id == id);
        let n = new.iter().find(|c| c.id == id);
        match (o, n) {
            (None, Some(n)) => {
                atoms.push(DiffAtom { scope, old_claim: None, new_claim: Some(n) });
                one_sided_qualifier_atoms(n, true, atoms);
            }
            (Some(o), None) => {
                atoms.push(DiffAtom { scope, old_claim: Some(o), new_claim: None });
                one_sided_qualifier_atoms(o, false, atoms);
            }
            (Some(o), Some(n)) => {
                if !same_as(o, n, true) {
                    atoms.push(DiffAtom { scope, old_claim: Some(o), new_claim: Some(n) });
                    on_update(o, n, atoms);
                }
            }
            (None, None) => unreachable!(),
        }
    }
}

/// A wholly added or removed top-level claim carries its qualifiers with it
/// one-sided: each becomes its own `Scope::Qualifier` addition (or removal)
/// atom rather than being silently dropped, matching `evaluator.py`'s walk
/// over `new_claim.qualifiers` on a pure addition.
fn one_sided_qualifier_atoms<'a>(claim: &'a Claim, is_addition: bool, atoms: &mut Vec<DiffAtom<'a>>) {
    for quals in claim.qualifiers.values() {
        for q in quals {
            if is_addition {
                atoms.push(DiffAtom { scope: Scope::Qualifier, old_claim: None, new_claim: Some(q) });
            } else {
                atoms.push(DiffAtom { scope: Scope::Qualifier, old_claim: Some(q), new_claim: None });
            }
        }
    }
}

/// Within an updated `(old_claim, new_claim)` pair, diff their qualifiers
/// property-bucket by property-bucket using `cmp_key` matching rather than
/// snak-id matching (spec §4.3).
fn diff_qualifiers<'a>(old_claim: &'a Claim, new_claim: &'a Claim, atoms: &mut Vec<DiffAtom<'a>>) {
    let props: BTreeSet<&PropertyId> =
        old_claim.qualifiers.keys().chain(new_claim.qualifiers.keys()).collect();
    for prop in props {
        let old_list = old_claim.qualifiers.get(prop).map(Vec::as_slice).unwrap_or(&[]);
        let new_list = new_claim.qualifiers.get(prop).map(Vec::as_slice).unwrap_or(&[]);
        diff_qualifier_bucket(old_list, new_list, atoms);
    }
}

/// `cmp_key`-based matching within one qualifier property bucket: first
/// unclaimed new entry with an equal `cmp_key` wins, in encounter order.
/// Whatever's left unmatched is additions/removals, unless exactly one of
/// each remains — that lone pair is promoted to an update, since it's the
/// only way a qualifier snak can change identity-free.
fn diff_qualifier_bucket<'a>(old_list: &'a [Claim], new_list: &'a [Claim], atoms: &mut Vec<DiffAtom<'a>>) {
    let mut used_new = vec![false; new_list.len()];
    let mut matched_old = vec![false; old_list.len()];

    for (i, o) in old_list.iter().enumerate() {
        if let Some(j) = new_list
            .iter()
            .enumerate()
            .find(|(j, n)| !used_new[*j] && n.cmp_key() == o.cmp_key())
            .map(|(j, _)| j)
        {
            used_new[j] = true;
            matched_old[i] = true;
        }
    }

    let unmatched_old: Vec<&Claim> =
        old_list.iter().enumerate().filter(|(i, _)| !matched_old[*i]).map(|(_, c)| c).collect();
    let unmatched_new: Vec<&Claim> =
        new_list.iter().enumerate().filter(|(j, _)| !used_new[*j]).map(|(_, c)| c).collect();

    if unmatched_old.len() == 1 && unmatched_new.len() == 1 {
        atoms.push(DiffAtom { scope: Scope::Qualifier, old_claim: Some(unmatched_old[0]), new_claim: Some(unmatched_new[0]) });
        return;
    }
    for o in unmatched_old {
        atoms.push(DiffAtom { scope: Scope::Qualifier, old_claim: Some(o), new_claim: None });
    }
    for n in unmatched_new {
        atoms.push(DiffAtom { scope: Scope::Qualifier, old_claim: None, new_claim: Some(n) });
    }
}

/// The full set of diff atoms between `old_rev` and `new_rev`: one top-level
/// `Scope::Main` atom per changed claim, and — nested inside each updated
/// claim pair — one `Scope::Qualifier` atom per changed qualifier snak.
/// Reference snaks are not diffed (spec §4.3, §9).
pub fn diff_entities<'a>(old_rev: &'a Revision, new_rev: &'a Revision) -> Vec<DiffAtom<'a>> {
    let mut atoms = Vec::new();
    let props: BTreeSet<&PropertyId> = old_rev.claims.keys().chain(new_rev.claims.keys()).collect();
    for prop in props {
        diff_claim_list(old_rev.claims_for(prop), new_rev.claims_for(prop), Scope::Main, &mut atoms, |o, n, atoms| {
            diff_qualifiers(o, n, atoms);
        });
    }
    atoms
}

/// Properties that appear on one side of the entity's claim set but not the
/// other — used to decide which entity-level constraints (`ItemRequires`,
/// `ConflictsWith`, `SubjectType`) need re-checking after an edit, since
/// those depend on whether a property is asserted at all rather than on any
/// single claim's value.
///
/// When `current` is given (spec §4.4 step 3's bracketed clause), `added` is
/// further intersected with `current`'s property set (a property re-added by
/// some other edit doesn't count as newly added here) and `removed` has
/// `current`'s property set subtracted (a property already restored by some
/// other edit doesn't count as newly removed).
pub struct PropertySetDelta<'a> {
    pub added: FxHashSet<&'a PropertyId>,
    pub removed: FxHashSet<&'a PropertyId>,
}

pub fn property_set_delta<'a>(
    old_rev: &'a Revision,
    new_rev: &'a Revision,
    current: Option<&'a Revision>,
) -> PropertySetDelta<'a> {
    let old_set = old_rev.property_set();
    let new_set = new_rev.property_set();
    let mut added: FxHashSet<&PropertyId> = new_set.difference(&old_set).copied().collect();
    let mut removed: FxHashSet<&PropertyId> = old_set.difference(&new_set).copied().collect();
    if let Some(current) = current {
        let current_set = current.property_set();
        added.retain(|p| current_set.contains(p));
        removed.retain(|p| !current_set.contains(p));
    }
    PropertySetDelta { added, removed }
}
