//! Rank-aware "best claims" selection: `preferred` shadows `normal` for a
//! given property, and `deprecated` claims are never "best". Used by
//! `Error404` to find a property's formatter URL (`P1630`) and by the
//! constraint-declaration parser, which never loads from a deprecated
//! `P2302` claim.

use axiom_core::{Claim, Rank};

/// The best-ranked claims for a property: every `preferred` claim if one
/// exists, else every non-deprecated claim.
pub fn best_claims(claims: &[Claim]) -> Vec<&Claim> {
    let preferred: Vec<&Claim> = claims.iter().filter(|c| c.rank == Rank::Preferred).collect();
    if !preferred.is_empty() {
        return preferred;
    }
    claims.iter().filter(|c| c.rank != Rank::Deprecated).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::{EntityId, SnakType};
    use indexmap::IndexMap;

    fn claim(rank: Rank) -> Claim {
        Claim {
            id: "x".into(),
            on_item: EntityId::from("Q1"),
            property: "P1630".into(),
            snak_type: SnakType::Value,
            target: None,
            rank,
            qualifiers: IndexMap::new(),
            sources: Vec::new(),
            is_qualifier: false,
            is_reference: false,
        }
    }

    #[test]
    fn preferred_shadows_normal() {
        let claims = vec![claim(Rank::Normal), claim(Rank::Preferred)];
        let best = best_claims(&claims);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].rank, Rank::Preferred);
    }

    #[test]
    fn deprecated_excluded_when_no_preferred() {
        let claims = vec![claim(Rank::Normal), claim(Rank::Deprecated)];
        let best = best_claims(&claims);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].rank, Rank::Normal);
    }
}
