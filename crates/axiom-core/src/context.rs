//! The `(old_claim, new_claim)` pair a predicate is dispatched against.

use crate::entity::Claim;
use crate::ids::PropertyId;
use crate::Revision;

/// Pairs the old and new sides of a single diff atom (or, for whole-entity
/// checks and item-level dispatch, a pair of bare revisions with no claim on
/// either side).
///
/// Borrowing both revisions rather than cloning claims keeps an evaluation
/// pass allocation-free outside of the diff engine's own bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub old_rev: &'a Revision,
    pub new_rev: &'a Revision,
    pub old_claim: Option<&'a Claim>,
    pub new_claim: Option<&'a Claim>,
}

impl<'a> Context<'a> {
    pub fn new(
        old_rev: &'a Revision,
        new_rev: &'a Revision,
        old_claim: Option<&'a Claim>,
        new_claim: Option<&'a Claim>,
    ) -> Self {
        Self {
            old_rev,
            new_rev,
            old_claim,
            new_claim,
        }
    }

    /// A bare context carrying only the two revisions, used for entity-level
    /// dispatch where no single claim drives the check.
    pub fn for_revisions(old_rev: &'a Revision, new_rev: &'a Revision) -> Self {
        Self::new(old_rev, new_rev, None, None)
    }

    /// The property of whichever side's claim is present.
    ///
    /// Panics if both sides are absent — invalid per the data model's
    /// invariant that claim-level dispatch always has at least one side.
    pub fn prop(&self) -> &'a PropertyId {
        self.old_claim
            .map(|c| &c.property)
            .or_else(|| self.new_claim.map(|c| &c.property))
            .expect("Context dispatched to a claim-level predicate with both sides absent")
    }
}
