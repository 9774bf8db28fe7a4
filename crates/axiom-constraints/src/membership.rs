//! Membership values used by `OneOf`/`NoneOf`/`Units` and the qualifier
//! parsing that feeds them: either an entity id or a non-value snak-kind
//! literal (`"novalue"`, `"somevalue"`).

use std::collections::BTreeSet;

use axiom_core::{Claim, EntityId, SnakType};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MembershipValue {
    Entity(EntityId),
    Literal(&'static str),
}

impl MembershipValue {
    pub fn entity(id: impl Into<EntityId>) -> Self {
        MembershipValue::Entity(id.into())
    }
}

/// Whether `claim` is "in" `values`: for non-value snaks, compares the
/// snak-kind literal; for value snaks, compares the target entity id.
/// Claims whose target is not entity-typed never match (mirrors the source,
/// which only ever applies `OneOf`/`NoneOf`/`Units` to entity- or
/// quantity-unit-valued properties).
pub fn in_values(claim: &Claim, values: &BTreeSet<MembershipValue>) -> bool {
    match claim.snak_type {
        SnakType::NoValue => values.contains(&MembershipValue::Literal("novalue")),
        SnakType::SomeValue => values.contains(&MembershipValue::Literal("somevalue")),
        SnakType::Value => claim
            .target
            .as_ref()
            .and_then(axiom_core::Value::as_entity)
            .is_some_and(|id| values.contains(&MembershipValue::Entity(id.clone()))),
    }
}
