//! Claims, reference blocks, and entity revisions.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::ids::{EntityId, PropertyId};
use crate::rank::Rank;
use crate::value::Value;

/// Whether a snak carries a value, or is an explicit "no value"/"some value"
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SnakType {
    Value,
    NoValue,
    SomeValue,
}

impl SnakType {
    /// The literal membership-test token used by `OneOf`/`NoneOf` for
    /// non-value snaks.
    pub fn as_literal(self) -> &'static str {
        match self {
            SnakType::Value => "value",
            SnakType::NoValue => "novalue",
            SnakType::SomeValue => "somevalue",
        }
    }
}

/// A grouping of property-value assertions attached to a claim as citation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceBlock {
    pub snaks: IndexMap<PropertyId, Vec<Claim>>,
}

impl ReferenceBlock {
    pub fn properties(&self) -> impl Iterator<Item = &PropertyId> {
        self.snaks.keys()
    }
}

/// A property-value assertion on an entity (or, nested, on a claim as a
/// qualifier or on a reference block as a source snak).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Claim {
    /// Stable snak id, unique within the entity.
    pub id: String,
    pub on_item: EntityId,
    pub property: PropertyId,
    pub snak_type: SnakType,
    pub target: Option<Value>,
    pub rank: Rank,
    pub qualifiers: IndexMap<PropertyId, Vec<Claim>>,
    pub sources: Vec<ReferenceBlock>,
    pub is_qualifier: bool,
    pub is_reference: bool,
}

impl Claim {
    /// `(snaktype, target)` — the key used to match a claim or qualifier
    /// across revisions independent of its rank, qualifiers, or sources.
    pub fn cmp_key(&self) -> (SnakType, Option<&Value>) {
        (self.snak_type, self.target.as_ref())
    }

    /// Whether the claim's target entity equals `other`, following no
    /// redirects — callers that need redirect-aware comparison must resolve
    /// first via `EntityStore`.
    pub fn target_equals(&self, other: &EntityId) -> bool {
        self.target.as_ref().and_then(Value::as_entity) == Some(other)
    }

    /// `true` for a claim in `{deprecated, normal, preferred}` whose rank is
    /// `deprecated` — used when filtering constraint declarations, which are
    /// never loaded from a deprecated `P2302` statement.
    pub fn is_deprecated(&self) -> bool {
        matches!(self.rank, Rank::Deprecated)
    }
}

/// An immutable snapshot of an entity at a given revision.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Revision {
    pub entity_id: EntityId,
    pub revision_id: u64,
    pub claims: IndexMap<PropertyId, Vec<Claim>>,
    pub labels: FxHashMap<String, String>,
    pub descriptions: FxHashMap<String, String>,
}

impl Revision {
    pub fn claims_for(&self, prop: &str) -> &[Claim] {
        self.claims.get(prop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_claim_matching(&self, claim: &Claim) -> bool {
        self.claims_for(&claim.property)
            .iter()
            .any(|cl| same_as(cl, claim, true))
    }

    /// Properties asserted on this revision, as a set for diffing against
    /// another revision's property set.
    pub fn property_set(&self) -> rustc_hash::FxHashSet<&PropertyId> {
        self.claims.keys().collect()
    }
}

/// Structural equality between two claims, ignoring rank. This is the "same
/// claim" test used by the diff engine: two claims with identical snak
/// content, qualifiers and sources are the same logical claim even if their
/// rank changed (rank changes are not diffed as claim updates).
pub fn same_as(a: &Claim, b: &Claim, ignore_rank: bool) -> bool {
    if !ignore_rank && a.rank != b.rank {
        return false;
    }
    if a.snak_type != b.snak_type || a.target != b.target {
        return false;
    }
    if a.qualifiers.len() != b.qualifiers.len() {
        return false;
    }
    for (prop, a_quals) in &a.qualifiers {
        let Some(b_quals) = b.qualifiers.get(prop) else {
            return false;
        };
        if a_quals.len() != b_quals.len() {
            return false;
        }
        if !a_quals
            .iter()
            .zip(b_quals)
            .all(|(x, y)| same_as(x, y, true))
        {
            return false;
        }
    }
    a.sources.len() == b.sources.len()
        && a.sources
            .iter()
            .zip(&b.sources)
            .all(|(x, y)| reference_block_same_as(x, y))
}

fn reference_block_same_as(a: &ReferenceBlock, b: &ReferenceBlock) -> bool {
    if a.snaks.len() != b.snaks.len() {
        return false;
    }
    for (prop, a_snaks) in &a.snaks {
        let Some(b_snaks) = b.snaks.get(prop) else {
            return false;
        };
        if a_snaks.len() != b_snaks.len() {
            return false;
        }
        if !a_snaks
            .iter()
            .zip(b_snaks)
            .all(|(x, y)| same_as(x, y, true))
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn bare_claim(id: &str, property: &str, target: Option<Value>, rank: Rank) -> Claim {
        Claim {
            id: id.to_string(),
            on_item: EntityId::from("Q1"),
            property: property.to_string(),
            snak_type: SnakType::Value,
            target,
            rank,
            qualifiers: IndexMap::new(),
            sources: Vec::new(),
            is_qualifier: false,
            is_reference: false,
        }
    }

    #[test]
    fn same_as_ignores_rank_by_default() {
        let a = bare_claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Normal);
        let b = bare_claim("Q1$b", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Preferred);
        assert!(same_as(&a, &b, true));
        assert!(!same_as(&a, &b, false));
    }

    #[test]
    fn same_as_detects_target_change() {
        let a = bare_claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Normal);
        let b = bare_claim("Q1$b", "P31", Some(Value::Entity(EntityId::from("Q6"))), Rank::Normal);
        assert!(!same_as(&a, &b, true));
    }

    #[test]
    fn same_as_compares_qualifiers_by_content() {
        let mut a = bare_claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Normal);
        let mut b = bare_claim("Q1$b", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Normal);
        a.qualifiers.insert(
            "P580".to_string(),
            vec![bare_claim("Q1$a$1", "P580", None, Rank::Normal)],
        );
        b.qualifiers.insert(
            "P580".to_string(),
            vec![bare_claim("Q1$b$1", "P580", None, Rank::Normal)],
        );
        assert!(same_as(&a, &b, true));

        b.qualifiers.get_mut("P580").unwrap().push(bare_claim(
            "Q1$b$2",
            "P580",
            None,
            Rank::Normal,
        ));
        assert!(!same_as(&a, &b, true));
    }

    #[test]
    fn cmp_key_ignores_id_and_rank() {
        let a = bare_claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Normal);
        let b = bare_claim("Q1$b", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Deprecated);
        assert_eq!(a.cmp_key(), b.cmp_key());
    }

    #[test]
    fn has_claim_matching_checks_property_bucket() {
        let claim = bare_claim("Q1$a", "P31", Some(Value::Entity(EntityId::from("Q5"))), Rank::Normal);
        let mut claims = IndexMap::new();
        claims.insert("P31".to_string(), vec![claim.clone()]);
        let rev = Revision {
            entity_id: EntityId::from("Q1"),
            revision_id: 1,
            claims,
            labels: FxHashMap::default(),
            descriptions: FxHashMap::default(),
        };
        assert!(rev.has_claim_matching(&claim));
        let other = bare_claim("Q1$c", "P31", Some(Value::Entity(EntityId::from("Q7"))), Rank::Normal);
        assert!(!rev.has_claim_matching(&other));
    }
}
