//! The closed constraint-predicate family. Modeled as a tagged sum rather
//! than open trait objects (per spec §9: the family is closed and small);
//! each variant carries its own parameters and, where needed, a handle to
//! the collaborator(s) it dereferences through.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use axiom_core::{
    Claim, CollaboratorError, Context, EntityId, EntityStore, HttpClient, PropertyId, Revision,
    Scope, SparqlClient, Value, WbTime,
};
use axiom_cache::{SubjectTypeCache, ValueTypeCache};
use regex::Regex;
use rust_decimal::Decimal;

use crate::best_claim::best_claims;
use crate::membership::{in_values, MembershipValue};
use crate::resolve::resolve_target_entity;
use crate::sparql::{subject_type_query, value_type_query};
use crate::time_math::{delta_in_unit, UNIT_DAY};

/// Properties `HasValidReference` never counts towards a valid reference,
/// even when a `PropertyScope` constraint would otherwise allow them in
/// `REFERENCE` scope (stated by/imported from/etc. are metadata, not a
/// citation in their own right).
pub const REFERENCE_METADATA_BLACKLIST: [&str; 5] = ["P143", "P813", "P887", "P3452", "P4656"];

/// The two disambiguation-page classes `NoLinksToDisambiguation` rejects.
pub const DISAMBIGUATION_CLASSES: [&str; 2] = ["Q4167410", "Q22808320"];

/// Whether a predicate is dispatched per-claim (`violates`) or per-entity
/// (`satisfied`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    Claim,
    Entity,
}

/// A stable discriminant for each predicate variant, used by
/// `ConstraintsStore::get_constraints`'s `type` filter and by
/// `get_item_constraints`'s hard-coded entity-level specifier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateTag {
    PropertyScope,
    OneOf,
    NoneOf,
    Format,
    ValueRequires,
    ValueType,
    Symmetric,
    Inverse,
    CommonsLink,
    Integer,
    NoBounds,
    QuantityRange,
    TimeRange,
    DifferenceWithinRange,
    Units,
    Qualifiers,
    RequiredQualifiers,
    ValueExists,
    NoLinksToDisambiguation,
    NoSelfLink,
    SandboxProperty,
    Error404,
    SubjectType,
    ItemRequires,
    ConflictsWith,
    LabelInLanguage,
    DescriptionInLanguage,
    HasValidReference,
    LargeChange,
}

/// Read-only view `HasValidReference` needs of the store: whether every
/// `PropertyScope` constraint declared for `prop` allows `REFERENCE` scope
/// (vacuously true if `prop` declares none). Kept as a trait, rather than a
/// direct handle to `ConstraintsStore`, so the predicate family doesn't
/// depend on the store's concrete type.
pub trait ReferenceScopeSource: Send + Sync {
    fn reference_scope_allowed(&self, prop: &str) -> bool;
}

/// The constraint predicate family.
pub enum ConstraintPredicate {
    PropertyScope {
        allowed: BTreeSet<Scope>,
    },
    OneOf {
        values: BTreeSet<MembershipValue>,
    },
    NoneOf {
        values: BTreeSet<MembershipValue>,
    },
    Format {
        /// Pre-anchored (`^(?:...)$`) so `is_match` behaves like a full match.
        regex: Regex,
    },
    ValueRequires {
        prop: PropertyId,
        values: Option<BTreeSet<MembershipValue>>,
        entity_store: Arc<dyn EntityStore>,
        redirect_hop_limit: u32,
    },
    ValueType {
        relation: Vec<PropertyId>,
        classes: Vec<EntityId>,
        sparql: Arc<dyn SparqlClient>,
        cache: Arc<ValueTypeCache>,
    },
    Symmetric {
        entity_store: Arc<dyn EntityStore>,
        redirect_hop_limit: u32,
    },
    Inverse {
        prop: PropertyId,
        entity_store: Arc<dyn EntityStore>,
        redirect_hop_limit: u32,
    },
    CommonsLink {
        file_repo_base: String,
        namespace: String,
        http: Arc<dyn HttpClient>,
    },
    Integer,
    NoBounds,
    QuantityRange {
        lower: Option<Decimal>,
        upper: Option<Decimal>,
    },
    TimeRange {
        lower: Option<WbTime>,
        upper: Option<WbTime>,
    },
    DifferenceWithinRange {
        prop: PropertyId,
        lower: Option<axiom_core::Quantity>,
        upper: Option<axiom_core::Quantity>,
    },
    Units {
        units: BTreeSet<MembershipValue>,
    },
    Qualifiers {
        allowed: BTreeSet<PropertyId>,
    },
    RequiredQualifiers {
        required: BTreeSet<PropertyId>,
    },
    ValueExists {
        entity_store: Arc<dyn EntityStore>,
    },
    NoLinksToDisambiguation {
        entity_store: Arc<dyn EntityStore>,
        redirect_hop_limit: u32,
    },
    NoSelfLink,
    SandboxProperty,
    Error404 {
        entity_store: Arc<dyn EntityStore>,
        http: Arc<dyn HttpClient>,
    },

    SubjectType {
        relation: Vec<PropertyId>,
        classes: Vec<EntityId>,
        sparql: Arc<dyn SparqlClient>,
        cache: Arc<SubjectTypeCache>,
    },
    ItemRequires {
        prop: PropertyId,
        values: Option<BTreeSet<MembershipValue>>,
    },
    ConflictsWith {
        prop: PropertyId,
        values: Option<BTreeSet<MembershipValue>>,
    },
    LabelInLanguage {
        langs: BTreeSet<String>,
    },
    DescriptionInLanguage {
        langs: BTreeSet<String>,
    },

    HasValidReference {
        store: Weak<dyn ReferenceScopeSource>,
    },
    LargeChange,
}

impl Clone for ConstraintPredicate {
    fn clone(&self) -> Self {
        match self {
            Self::PropertyScope { allowed } => Self::PropertyScope { allowed: allowed.clone() },
            Self::OneOf { values } => Self::OneOf { values: values.clone() },
            Self::NoneOf { values } => Self::NoneOf { values: values.clone() },
            Self::Format { regex } => Self::Format { regex: regex.clone() },
            Self::ValueRequires { prop, values, entity_store, redirect_hop_limit } => {
                Self::ValueRequires {
                    prop: prop.clone(),
                    values: values.clone(),
                    entity_store: entity_store.clone(),
                    redirect_hop_limit: *redirect_hop_limit,
                }
            }
            Self::ValueType { relation, classes, sparql, cache } => Self::ValueType {
                relation: relation.clone(),
                classes: classes.clone(),
                sparql: sparql.clone(),
                cache: cache.clone(),
            },
            Self::Symmetric { entity_store, redirect_hop_limit } => Self::Symmetric {
                entity_store: entity_store.clone(),
                redirect_hop_limit: *redirect_hop_limit,
            },
            Self::Inverse { prop, entity_store, redirect_hop_limit } => Self::Inverse {
                prop: prop.clone(),
                entity_store: entity_store.clone(),
                redirect_hop_limit: *redirect_hop_limit,
            },
            Self::CommonsLink { file_repo_base, namespace, http } => Self::CommonsLink {
                file_repo_base: file_repo_base.clone(),
                namespace: namespace.clone(),
                http: http.clone(),
            },
            Self::Integer => Self::Integer,
            Self::NoBounds => Self::NoBounds,
            Self::QuantityRange { lower, upper } => {
                Self::QuantityRange { lower: *lower, upper: *upper }
            }
            Self::TimeRange { lower, upper } => Self::TimeRange { lower: *lower, upper: *upper },
            Self::DifferenceWithinRange { prop, lower, upper } => Self::DifferenceWithinRange {
                prop: prop.clone(),
                lower: lower.clone(),
                upper: upper.clone(),
            },
            Self::Units { units } => Self::Units { units: units.clone() },
            Self::Qualifiers { allowed } => Self::Qualifiers { allowed: allowed.clone() },
            Self::RequiredQualifiers { required } => {
                Self::RequiredQualifiers { required: required.clone() }
            }
            Self::ValueExists { entity_store } => {
                Self::ValueExists { entity_store: entity_store.clone() }
            }
            Self::NoLinksToDisambiguation { entity_store, redirect_hop_limit } => {
                Self::NoLinksToDisambiguation {
                    entity_store: entity_store.clone(),
                    redirect_hop_limit: *redirect_hop_limit,
                }
            }
            Self::NoSelfLink => Self::NoSelfLink,
            Self::SandboxProperty => Self::SandboxProperty,
            Self::Error404 { entity_store, http } => {
                Self::Error404 { entity_store: entity_store.clone(), http: http.clone() }
            }
            Self::SubjectType { relation, classes, sparql, cache } => Self::SubjectType {
                relation: relation.clone(),
                classes: classes.clone(),
                sparql: sparql.clone(),
                cache: cache.clone(),
            },
            Self::ItemRequires { prop, values } => {
                Self::ItemRequires { prop: prop.clone(), values: values.clone() }
            }
            Self::ConflictsWith { prop, values } => {
                Self::ConflictsWith { prop: prop.clone(), values: values.clone() }
            }
            Self::LabelInLanguage { langs } => Self::LabelInLanguage { langs: langs.clone() },
            Self::DescriptionInLanguage { langs } => {
                Self::DescriptionInLanguage { langs: langs.clone() }
            }
            Self::HasValidReference { store } => Self::HasValidReference { store: store.clone() },
            Self::LargeChange => Self::LargeChange,
        }
    }
}

impl std::fmt::Debug for ConstraintPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.tag())
    }
}

impl ConstraintPredicate {
    pub fn tag(&self) -> PredicateTag {
        match self {
            Self::PropertyScope { .. } => PredicateTag::PropertyScope,
            Self::OneOf { .. } => PredicateTag::OneOf,
            Self::NoneOf { .. } => PredicateTag::NoneOf,
            Self::Format { .. } => PredicateTag::Format,
            Self::ValueRequires { .. } => PredicateTag::ValueRequires,
            Self::ValueType { .. } => PredicateTag::ValueType,
            Self::Symmetric { .. } => PredicateTag::Symmetric,
            Self::Inverse { .. } => PredicateTag::Inverse,
            Self::CommonsLink { .. } => PredicateTag::CommonsLink,
            Self::Integer => PredicateTag::Integer,
            Self::NoBounds => PredicateTag::NoBounds,
            Self::QuantityRange { .. } => PredicateTag::QuantityRange,
            Self::TimeRange { .. } => PredicateTag::TimeRange,
            Self::DifferenceWithinRange { .. } => PredicateTag::DifferenceWithinRange,
            Self::Units { .. } => PredicateTag::Units,
            Self::Qualifiers { .. } => PredicateTag::Qualifiers,
            Self::RequiredQualifiers { .. } => PredicateTag::RequiredQualifiers,
            Self::ValueExists { .. } => PredicateTag::ValueExists,
            Self::NoLinksToDisambiguation { .. } => PredicateTag::NoLinksToDisambiguation,
            Self::NoSelfLink => PredicateTag::NoSelfLink,
            Self::SandboxProperty => PredicateTag::SandboxProperty,
            Self::Error404 { .. } => PredicateTag::Error404,
            Self::SubjectType { .. } => PredicateTag::SubjectType,
            Self::ItemRequires { .. } => PredicateTag::ItemRequires,
            Self::ConflictsWith { .. } => PredicateTag::ConflictsWith,
            Self::LabelInLanguage { .. } => PredicateTag::LabelInLanguage,
            Self::DescriptionInLanguage { .. } => PredicateTag::DescriptionInLanguage,
            Self::HasValidReference { .. } => PredicateTag::HasValidReference,
            Self::LargeChange => PredicateTag::LargeChange,
        }
    }

    pub fn kind(&self) -> PredicateKind {
        match self.tag() {
            PredicateTag::SubjectType
            | PredicateTag::ItemRequires
            | PredicateTag::ConflictsWith
            | PredicateTag::LabelInLanguage
            | PredicateTag::DescriptionInLanguage => PredicateKind::Entity,
            _ => PredicateKind::Claim,
        }
    }

    /// The predicate's intrinsic scopes (spec §4.1); a `Constraint`'s
    /// effective scopes are this set intersected with its own `scopes`.
    pub fn intrinsic_scopes(&self) -> BTreeSet<Scope> {
        match self.tag() {
            PredicateTag::SubjectType
            | PredicateTag::ItemRequires
            | PredicateTag::ConflictsWith
            | PredicateTag::LabelInLanguage
            | PredicateTag::DescriptionInLanguage
            | PredicateTag::Symmetric
            | PredicateTag::Inverse
            | PredicateTag::Qualifiers
            | PredicateTag::RequiredQualifiers
            | PredicateTag::HasValidReference => [Scope::Main].into_iter().collect(),
            _ => Scope::all(),
        }
    }

    /// Whether the predicate only needs to re-run on update when the
    /// claim's `(snaktype, target)` actually changed — false for structural
    /// predicates that care about the claim's position or qualifier set
    /// regardless of value.
    pub fn value_change_needed(&self) -> bool {
        !matches!(self.tag(), PredicateTag::Qualifiers | PredicateTag::RequiredQualifiers)
    }

    /// Claim-level violation check. `revision` is whichever side (`old` or
    /// `new`) `claim` belongs to — only `DifferenceWithinRange` uses it, to
    /// find co-property sibling claims.
    pub fn violates(&self, claim: &Claim, revision: &Revision) -> Result<bool, CollaboratorError> {
        match self {
            Self::PropertyScope { allowed } => {
                let scope = if claim.is_qualifier {
                    Scope::Qualifier
                } else if claim.is_reference {
                    Scope::Reference
                } else {
                    Scope::Main
                };
                Ok(!allowed.contains(&scope))
            }
            Self::OneOf { values } => Ok(!in_values(claim, values)),
            Self::NoneOf { values } => Ok(in_values(claim, values)),
            Self::Format { regex } => {
                let text = claim.target.as_ref().map(Value::format_projection).unwrap_or("");
                Ok(!regex.is_match(text))
            }
            Self::ValueRequires { prop, values, entity_store, redirect_hop_limit } => {
                let Some(target_id) = claim.target.as_ref().and_then(Value::as_entity) else {
                    return Ok(false);
                };
                match resolve_target_entity(entity_store.as_ref(), target_id, *redirect_hop_limit) {
                    Err(e) if e.is_not_found() => Ok(true),
                    Err(e) => Err(e),
                    Ok(target_rev) => {
                        let claims = target_rev.claims_for(prop);
                        if claims.is_empty() {
                            return Ok(true);
                        }
                        match values {
                            None => Ok(false),
                            Some(vs) => Ok(claims.iter().all(|cl| !in_values(cl, vs))),
                        }
                    }
                }
            }
            Self::ValueType { relation, classes, sparql, cache } => {
                let Some(target_id) = claim.target.as_ref().and_then(Value::as_entity) else {
                    return Ok(false);
                };
                cache.get_or_try_insert_with(target_id.clone(), || {
                    let query = value_type_query(target_id, relation, classes);
                    sparql.ask(&query).map(|ok| !ok)
                })
            }
            Self::Symmetric { entity_store, redirect_hop_limit } => {
                let Some(target_id) = claim.target.as_ref().and_then(Value::as_entity) else {
                    return Ok(false);
                };
                match resolve_target_entity(entity_store.as_ref(), target_id, *redirect_hop_limit) {
                    Err(e) if e.is_not_found() => Ok(true),
                    Err(e) => Err(e),
                    Ok(target_rev) => Ok(!target_rev
                        .claims_for(&claim.property)
                        .iter()
                        .any(|cl| cl.target_equals(&claim.on_item))),
                }
            }
            Self::Inverse { prop, entity_store, redirect_hop_limit } => {
                let Some(target_id) = claim.target.as_ref().and_then(Value::as_entity) else {
                    return Ok(false);
                };
                match resolve_target_entity(entity_store.as_ref(), target_id, *redirect_hop_limit) {
                    Err(e) if e.is_not_found() => Ok(true),
                    Err(e) => Err(e),
                    Ok(target_rev) => Ok(!target_rev
                        .claims_for(prop)
                        .iter()
                        .any(|cl| cl.target_equals(&claim.on_item))),
                }
            }
            Self::CommonsLink { file_repo_base, namespace, http } => {
                let title = match &claim.target {
                    Some(Value::Page(p)) => {
                        let prefix = format!("{namespace}:");
                        if !p.title.starts_with(&prefix) {
                            return Ok(true);
                        }
                        p.title.clone()
                    }
                    Some(Value::Str(s)) => format!("{namespace}:{s}"),
                    _ => return Ok(true),
                };
                let url = format!("{file_repo_base}/wiki/{}", title.replace(' ', "_"));
                Ok(!http.get(&url)?.ok)
            }
            Self::Integer => Ok(claim.target.as_ref().and_then(Value::as_quantity).is_some_and(|q| !q.is_integer())),
            Self::NoBounds => Ok(claim.target.as_ref().and_then(Value::as_quantity).is_some_and(|q| q.has_bounds())),
            Self::QuantityRange { lower, upper } => {
                let Some(q) = claim.target.as_ref().and_then(Value::as_quantity) else {
                    return Ok(false);
                };
                if let Some(lo) = lower {
                    if &q.amount < lo {
                        return Ok(true);
                    }
                }
                if let Some(hi) = upper {
                    if &q.amount > hi {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::TimeRange { lower, upper } => {
                let Some(t) = claim.target.as_ref().and_then(Value::as_time) else {
                    return Ok(false);
                };
                if let Some(lo) = lower {
                    let prec = lo.precision.min(t.precision);
                    if t.truncated(prec) < lo.truncated(prec) {
                        return Ok(true);
                    }
                }
                if let Some(hi) = upper {
                    let prec = hi.precision.min(t.precision);
                    if t.truncated(prec) > hi.truncated(prec) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::DifferenceWithinRange { prop, lower, upper } => {
                let Some(t) = claim.target.as_ref().and_then(Value::as_time) else {
                    return Ok(false);
                };
                let unit = lower
                    .as_ref()
                    .and_then(|q| q.unit.as_ref())
                    .or_else(|| upper.as_ref().and_then(|q| q.unit.as_ref()))
                    .map(EntityId::as_str)
                    .unwrap_or(UNIT_DAY);
                let siblings = revision.claims_for(prop);
                if siblings.is_empty() {
                    return Ok(true);
                }
                for other in siblings {
                    if other.id == claim.id {
                        continue;
                    }
                    let Some(other_time) = other.target.as_ref().and_then(Value::as_time) else {
                        continue;
                    };
                    let Some(delta) = delta_in_unit(t, other_time, unit) else {
                        continue;
                    };
                    let within_lower = lower.as_ref().map_or(true, |lo| delta >= lo.amount);
                    let within_upper = upper.as_ref().map_or(true, |hi| delta <= hi.amount);
                    if within_lower && within_upper {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Units { units } => {
                let Some(q) = claim.target.as_ref().and_then(Value::as_quantity) else {
                    return Ok(false);
                };
                match &q.unit {
                    Some(u) => Ok(!units.contains(&MembershipValue::Entity(u.clone()))),
                    None => Ok(!units.contains(&MembershipValue::Literal("novalue"))),
                }
            }
            Self::Qualifiers { allowed } => Ok(claim.qualifiers.keys().any(|p| !allowed.contains(p))),
            Self::RequiredQualifiers { required } => {
                Ok(required.iter().any(|p| !claim.qualifiers.contains_key(p)))
            }
            Self::ValueExists { entity_store } => {
                let Some(target_id) = claim.target.as_ref().and_then(Value::as_entity) else {
                    return Ok(false);
                };
                match entity_store.load(target_id) {
                    Ok(_) => Ok(false),
                    Err(e) if e.is_not_found() => Ok(true),
                    Err(e) => Err(e),
                }
            }
            Self::NoLinksToDisambiguation { entity_store, redirect_hop_limit } => {
                let Some(target_id) = claim.target.as_ref().and_then(Value::as_entity) else {
                    return Ok(false);
                };
                match resolve_target_entity(entity_store.as_ref(), target_id, *redirect_hop_limit) {
                    Err(e) if e.is_not_found() => Ok(false),
                    Err(e) => Err(e),
                    Ok(target_rev) => Ok(target_rev.claims_for("P31").iter().any(|cl| {
                        DISAMBIGUATION_CLASSES
                            .iter()
                            .any(|dab| cl.target_equals(&EntityId::from(*dab)))
                    })),
                }
            }
            Self::NoSelfLink => {
                Ok(claim.target.as_ref().and_then(Value::as_entity).is_some_and(|id| id == &claim.on_item))
            }
            Self::SandboxProperty => Ok(true),
            Self::Error404 { entity_store, http } => {
                let Some(value_text) = claim.target.as_ref().map(substitution_text) else {
                    return Ok(false);
                };
                let property_id = EntityId::from(claim.property.as_str());
                let property_page = match entity_store.load(&property_id) {
                    Ok(rev) => rev,
                    Err(e) if e.is_not_found() => return Ok(false),
                    Err(e) => return Err(e),
                };
                let best = best_claims(property_page.claims_for("P1630"));
                let Some(formatter_claim) = best.first() else {
                    return Ok(false);
                };
                let Some(formatter) = formatter_claim.target.as_ref() else {
                    return Ok(false);
                };
                let url = formatter.format_projection().replace("$1", &value_text);
                Ok(!http.get(&url)?.ok)
            }

            Self::SubjectType { .. }
            | Self::ItemRequires { .. }
            | Self::ConflictsWith { .. }
            | Self::LabelInLanguage { .. }
            | Self::DescriptionInLanguage { .. } => {
                unreachable!("entity-level predicate dispatched via violates()")
            }
            Self::HasValidReference { .. } | Self::LargeChange => Ok(false),
        }
    }

    /// Entity-level satisfaction check.
    pub fn satisfied(&self, revision: &Revision) -> Result<bool, CollaboratorError> {
        match self {
            Self::SubjectType { relation, classes, sparql, cache } => {
                let mut check: Vec<EntityId> = Vec::new();
                for prop in relation {
                    for claim in revision.claims_for(prop) {
                        if let Some(id) = claim.target.as_ref().and_then(Value::as_entity) {
                            if !check.contains(id) {
                                check.push(id.clone());
                            }
                        }
                    }
                }
                if check.is_empty() {
                    return Ok(false);
                }
                if check.iter().any(|id| classes.contains(id)) {
                    return Ok(true);
                }

                let mut uncached = Vec::new();
                for base in &check {
                    for class in classes {
                        match cache.get(&(base.clone(), class.clone())) {
                            Some(true) => return Ok(true),
                            Some(false) => {}
                            None => uncached.push(base.clone()),
                        }
                    }
                }
                if uncached.is_empty() {
                    return Ok(false);
                }
                uncached.sort();
                uncached.dedup();

                let query = subject_type_query(&uncached);
                let rows = sparql.select(&query)?;
                let mut reached: std::collections::HashMap<EntityId, BTreeSet<EntityId>> =
                    std::collections::HashMap::new();
                for row in &rows {
                    if let (Some(base), Some(super_)) = (row.entity("base"), row.entity("super")) {
                        reached.entry(base.clone()).or_default().insert(super_.clone());
                    }
                }

                let mut any_hit = false;
                for base in &uncached {
                    let supers = reached.get(base);
                    for class in classes {
                        let hit = supers.is_some_and(|s| s.contains(class));
                        cache.put((base.clone(), class.clone()), hit);
                        any_hit |= hit;
                    }
                }
                Ok(any_hit)
            }
            Self::ItemRequires { prop, values } => {
                let claims = revision.claims_for(prop);
                if claims.is_empty() {
                    return Ok(false);
                }
                match values {
                    None => Ok(true),
                    Some(vs) => Ok(claims.iter().any(|cl| in_values(cl, vs))),
                }
            }
            Self::ConflictsWith { prop, values } => {
                let claims = revision.claims_for(prop);
                if claims.is_empty() {
                    return Ok(true);
                }
                match values {
                    None => Ok(false),
                    Some(vs) => Ok(!claims.iter().any(|cl| in_values(cl, vs))),
                }
            }
            Self::LabelInLanguage { langs } => {
                Ok(revision.labels.keys().any(|l| langs.contains(l)))
            }
            Self::DescriptionInLanguage { langs } => {
                Ok(revision.descriptions.keys().any(|l| langs.contains(l)))
            }
            _ => unreachable!("claim-level predicate dispatched via satisfied()"),
        }
    }

    fn count_valid_references(&self, claim: &Claim) -> i64 {
        let Self::HasValidReference { store } = self else { return 0 };
        let Some(store) = store.upgrade() else { return 0 };
        claim
            .sources
            .iter()
            .filter(|block| is_valid_reference(block, store.as_ref()))
            .count() as i64
    }

    pub fn score_for_addition(&self, ctx: &Context<'_>) -> Result<i64, CollaboratorError> {
        match self.tag() {
            PredicateTag::HasValidReference => {
                let Some(new_claim) = ctx.new_claim else { return Ok(0) };
                Ok(-self.count_valid_references(new_claim))
            }
            PredicateTag::LargeChange => Ok(0),
            _ => match self.kind() {
                PredicateKind::Claim => {
                    let Some(new_claim) = ctx.new_claim else { return Ok(0) };
                    Ok(self.violates(new_claim, ctx.new_rev)? as i64)
                }
                PredicateKind::Entity => Ok(!self.satisfied(ctx.new_rev)? as i64),
            },
        }
    }

    pub fn score_for_removal(&self, ctx: &Context<'_>) -> Result<i64, CollaboratorError> {
        match self.tag() {
            PredicateTag::HasValidReference => {
                let Some(old_claim) = ctx.old_claim else { return Ok(0) };
                Ok(self.count_valid_references(old_claim))
            }
            PredicateTag::LargeChange => Ok(0),
            _ => match self.kind() {
                PredicateKind::Claim => {
                    let Some(old_claim) = ctx.old_claim else { return Ok(0) };
                    Ok(-(self.violates(old_claim, ctx.old_rev)? as i64))
                }
                PredicateKind::Entity => Ok(-(!self.satisfied(ctx.old_rev)? as i64)),
            },
        }
    }

    pub fn score_for_update(&self, ctx: &Context<'_>) -> Result<i64, CollaboratorError> {
        match self.tag() {
            PredicateTag::HasValidReference => {
                let (Some(old_claim), Some(new_claim)) = (ctx.old_claim, ctx.new_claim) else {
                    return Ok(0);
                };
                let old_count = self.count_valid_references(old_claim);
                let new_count = self.count_valid_references(new_claim);
                if old_claim.cmp_key() != new_claim.cmp_key() && old_claim.sources == new_claim.sources
                {
                    Ok(old_count)
                } else {
                    Ok(old_count - new_count)
                }
            }
            PredicateTag::LargeChange => {
                let (Some(old_claim), Some(new_claim)) = (ctx.old_claim, ctx.new_claim) else {
                    return Ok(0);
                };
                let (Some(old_q), Some(new_q)) = (
                    old_claim.target.as_ref().and_then(Value::as_quantity),
                    new_claim.target.as_ref().and_then(Value::as_quantity),
                ) else {
                    return Ok(0);
                };
                if old_q.amount.is_zero() || new_q.amount.is_zero() {
                    return Ok(0);
                }
                let old_f = old_q.amount.abs().to_string().parse::<f64>().unwrap_or(0.0);
                let new_f = new_q.amount.abs().to_string().parse::<f64>().unwrap_or(0.0);
                if old_f <= 0.0 || new_f <= 0.0 {
                    return Ok(0);
                }
                let magnitude = (old_f.log10() - new_f.log10()).abs();
                Ok(magnitude.round() as i64)
            }
            _ => match self.kind() {
                PredicateKind::Claim => {
                    let (Some(old_claim), Some(new_claim)) = (ctx.old_claim, ctx.new_claim) else {
                        return Ok(0);
                    };
                    let new_v = self.violates(new_claim, ctx.new_rev)? as i64;
                    let old_v = self.violates(old_claim, ctx.old_rev)? as i64;
                    Ok(new_v - old_v)
                }
                PredicateKind::Entity => {
                    let new_v = !self.satisfied(ctx.new_rev)? as i64;
                    let old_v = !self.satisfied(ctx.old_rev)? as i64;
                    Ok(new_v - old_v)
                }
            },
        }
    }
}

fn is_valid_reference(block: &axiom_core::ReferenceBlock, source: &dyn ReferenceScopeSource) -> bool {
    block
        .properties()
        .any(|prop| !REFERENCE_METADATA_BLACKLIST.contains(&prop.as_str()) && source.reference_scope_allowed(prop))
}

/// Textual substitution for `Error404`'s `$1` formatter placeholder.
fn substitution_text(value: &Value) -> String {
    match value {
        Value::Entity(id) => id.as_str().to_string(),
        Value::Str(s) => s.clone(),
        Value::MonolingualText { text, .. } => text.clone(),
        Value::Quantity(q) => q.amount.to_string(),
        Value::Time(t) => format!("{:04}-{:02}-{:02}", t.year, t.month, t.day),
        Value::Page(p) => p.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::{Context, Quantity, Rank, ReferenceBlock, Revision, WbTime};
    use indexmap::IndexMap;
    use rust_decimal::Decimal;
    use rustc_hash::FxHashMap;

    fn claim(property: &str, target: Option<Value>) -> Claim {
        Claim {
            id: format!("Q1${property}"),
            on_item: EntityId::from("Q1"),
            property: property.to_string(),
            snak_type: if target.is_some() { axiom_core::SnakType::Value } else { axiom_core::SnakType::NoValue },
            target,
            rank: Rank::Normal,
            qualifiers: IndexMap::new(),
            sources: Vec::new(),
            is_qualifier: false,
            is_reference: false,
        }
    }

    fn revision_with(claims: Vec<Claim>) -> Revision {
        let mut map: IndexMap<String, Vec<Claim>> = IndexMap::new();
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

    fn quantity(amount: i64, unit: Option<&str>) -> Quantity {
        Quantity {
            amount: Decimal::from(amount),
            upper_bound: None,
            lower_bound: None,
            unit: unit.map(EntityId::from),
        }
    }

    fn time(year: i64, month: u8, day: u8, precision: u8) -> WbTime {
        WbTime { year, month, day, hour: 0, minute: 0, second: 0, precision, calendar: None }
    }

    // -- OneOf / NoneOf (spec §8 scenarios 1-2) --------------------------

    #[test]
    fn one_of_violates_when_value_outside_set() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q1"), MembershipValue::entity("Q2")]
            .into_iter()
            .collect();
        let pred = ConstraintPredicate::OneOf { values };
        let c = claim("P17", Some(Value::Entity(EntityId::from("Q9"))));
        let rev = revision_with(vec![c.clone()]);
        assert!(pred.violates(&c, &rev).unwrap());
    }

    #[test]
    fn one_of_satisfied_when_value_inside_set() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q1"), MembershipValue::entity("Q2")]
            .into_iter()
            .collect();
        let pred = ConstraintPredicate::OneOf { values };
        let c = claim("P17", Some(Value::Entity(EntityId::from("Q1"))));
        let rev = revision_with(vec![c.clone()]);
        assert!(!pred.violates(&c, &rev).unwrap());
    }

    #[test]
    fn none_of_is_the_inverse_of_one_of() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q1")].into_iter().collect();
        let pred = ConstraintPredicate::NoneOf { values };
        let blocked = claim("P17", Some(Value::Entity(EntityId::from("Q1"))));
        let allowed = claim("P17", Some(Value::Entity(EntityId::from("Q2"))));
        let rev = revision_with(vec![]);
        assert!(pred.violates(&blocked, &rev).unwrap());
        assert!(!pred.violates(&allowed, &rev).unwrap());
    }

    #[test]
    fn one_of_addition_scores_plus_one_via_context() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q1")].into_iter().collect();
        let pred = ConstraintPredicate::OneOf { values };
        let new_claim = claim("P17", Some(Value::Entity(EntityId::from("Q9"))));
        let old_rev = revision_with(vec![]);
        let new_rev = revision_with(vec![new_claim.clone()]);
        let ctx = Context::new(&old_rev, &new_rev, None, Some(&new_claim));
        assert_eq!(pred.score_for_addition(&ctx).unwrap(), 1);
    }

    #[test]
    fn one_of_removal_of_a_violating_claim_scores_minus_one() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q1")].into_iter().collect();
        let pred = ConstraintPredicate::OneOf { values };
        let old_claim = claim("P17", Some(Value::Entity(EntityId::from("Q9"))));
        let old_rev = revision_with(vec![old_claim.clone()]);
        let new_rev = revision_with(vec![]);
        let ctx = Context::new(&old_rev, &new_rev, Some(&old_claim), None);
        assert_eq!(pred.score_for_removal(&ctx).unwrap(), -1);
    }

    // -- Qualifiers (spec §8 scenario 3) ---------------------------------

    #[test]
    fn qualifiers_violates_on_disallowed_qualifier_property() {
        let allowed: BTreeSet<PropertyId> = ["P580".to_string()].into_iter().collect();
        let pred = ConstraintPredicate::Qualifiers { allowed };
        let mut c = claim("P39", Some(Value::Entity(EntityId::from("Q30185"))));
        c.qualifiers.insert("P582".to_string(), vec![claim("P582", None)]);
        let rev = revision_with(vec![]);
        assert!(pred.violates(&c, &rev).unwrap());
    }

    #[test]
    fn qualifiers_update_score_reflects_newly_added_bad_qualifier() {
        let allowed: BTreeSet<PropertyId> = ["P580".to_string()].into_iter().collect();
        let pred = ConstraintPredicate::Qualifiers { allowed };
        let old_claim = claim("P39", Some(Value::Entity(EntityId::from("Q30185"))));
        let mut new_claim = old_claim.clone();
        new_claim.qualifiers.insert("P582".to_string(), vec![claim("P582", None)]);
        let old_rev = revision_with(vec![old_claim.clone()]);
        let new_rev = revision_with(vec![new_claim.clone()]);
        let ctx = Context::new(&old_rev, &new_rev, Some(&old_claim), Some(&new_claim));
        assert_eq!(pred.score_for_update(&ctx).unwrap(), 1);
    }

    #[test]
    fn required_qualifiers_violates_when_missing() {
        let required: BTreeSet<PropertyId> = ["P580".to_string()].into_iter().collect();
        let pred = ConstraintPredicate::RequiredQualifiers { required };
        let c = claim("P39", Some(Value::Entity(EntityId::from("Q30185"))));
        let rev = revision_with(vec![]);
        assert!(pred.violates(&c, &rev).unwrap());
    }

    // -- TimeRange precision truncation (spec §8 scenario 4) -------------

    #[test]
    fn time_range_compares_at_the_coarser_of_the_two_precisions() {
        // Bound is year-precision 1990; claim is day-precision 1990-06-15 —
        // both truncate to the year 1990 for comparison, so neither bound
        // is crossed despite the claim being more precise.
        let pred = ConstraintPredicate::TimeRange {
            lower: Some(time(1990, 1, 1, 9)),
            upper: Some(time(2000, 1, 1, 9)),
        };
        let c = claim("P569", Some(Value::Time(time(1990, 6, 15, 11))));
        let rev = revision_with(vec![]);
        assert!(!pred.violates(&c, &rev).unwrap());
    }

    #[test]
    fn time_range_violates_below_lower_bound() {
        let pred = ConstraintPredicate::TimeRange { lower: Some(time(1990, 1, 1, 9)), upper: None };
        let c = claim("P569", Some(Value::Time(time(1980, 6, 15, 11))));
        let rev = revision_with(vec![]);
        assert!(pred.violates(&c, &rev).unwrap());
    }

    // -- DifferenceWithinRange "all" semantics ----------------------------

    #[test]
    fn difference_within_range_satisfied_if_any_sibling_is_in_range() {
        let pred = ConstraintPredicate::DifferenceWithinRange {
            prop: "P570".to_string(),
            lower: Some(quantity(0, Some("Q573"))),
            upper: Some(quantity(10, Some("Q573"))),
        };
        let this = claim("P570", Some(Value::Time(time(2000, 1, 10, 11))));
        let near = claim("P570", Some(Value::Time(time(2000, 1, 5, 11))));
        let far = claim("P570", Some(Value::Time(time(1990, 1, 1, 11))));
        let rev = revision_with(vec![this.clone(), near, far]);
        assert!(!pred.violates(&this, &rev).unwrap());
    }

    #[test]
    fn difference_within_range_violates_if_no_sibling_is_in_range() {
        let pred = ConstraintPredicate::DifferenceWithinRange {
            prop: "P570".to_string(),
            lower: Some(quantity(0, Some("Q573"))),
            upper: Some(quantity(10, Some("Q573"))),
        };
        let this = claim("P570", Some(Value::Time(time(2000, 1, 10, 11))));
        let far = claim("P570", Some(Value::Time(time(1990, 1, 1, 11))));
        let rev = revision_with(vec![this.clone(), far]);
        assert!(pred.violates(&this, &rev).unwrap());
    }

    #[test]
    fn difference_within_range_violates_with_no_siblings_at_all() {
        let pred = ConstraintPredicate::DifferenceWithinRange {
            prop: "P570".to_string(),
            lower: Some(quantity(0, Some("Q573"))),
            upper: Some(quantity(10, Some("Q573"))),
        };
        let this = claim("P570", Some(Value::Time(time(2000, 1, 10, 11))));
        let rev = revision_with(vec![this.clone()]);
        assert!(pred.violates(&this, &rev).unwrap());
    }

    // -- Quantity-valued predicates ---------------------------------------

    #[test]
    fn integer_violates_on_fractional_amount() {
        let pred = ConstraintPredicate::Integer;
        let whole = claim("P1082", Some(Value::Quantity(quantity(4, None))));
        let mut fractional = quantity(4, None);
        fractional.amount = Decimal::new(45, 1);
        let frac_claim = claim("P1082", Some(Value::Quantity(fractional)));
        let rev = revision_with(vec![]);
        assert!(!pred.violates(&whole, &rev).unwrap());
        assert!(pred.violates(&frac_claim, &rev).unwrap());
    }

    #[test]
    fn no_bounds_violates_when_bounds_present() {
        let pred = ConstraintPredicate::NoBounds;
        let mut bounded = quantity(4, None);
        bounded.upper_bound = Some(Decimal::from(5));
        let c = claim("P1082", Some(Value::Quantity(bounded)));
        let rev = revision_with(vec![]);
        assert!(pred.violates(&c, &rev).unwrap());
    }

    #[test]
    fn quantity_range_violates_outside_bounds() {
        let pred = ConstraintPredicate::QuantityRange {
            lower: Some(Decimal::from(0)),
            upper: Some(Decimal::from(100)),
        };
        let rev = revision_with(vec![]);
        let low = claim("P1082", Some(Value::Quantity(quantity(-1, None))));
        let high = claim("P1082", Some(Value::Quantity(quantity(101, None))));
        let ok = claim("P1082", Some(Value::Quantity(quantity(50, None))));
        assert!(pred.violates(&low, &rev).unwrap());
        assert!(pred.violates(&high, &rev).unwrap());
        assert!(!pred.violates(&ok, &rev).unwrap());
    }

    #[test]
    fn units_violates_on_unlisted_unit() {
        let units: BTreeSet<_> = [MembershipValue::entity("Q11573")].into_iter().collect();
        let pred = ConstraintPredicate::Units { units };
        let rev = revision_with(vec![]);
        let matching = claim("P2044", Some(Value::Quantity(quantity(4, Some("Q11573")))));
        let mismatching = claim("P2044", Some(Value::Quantity(quantity(4, Some("Q828224")))));
        assert!(!pred.violates(&matching, &rev).unwrap());
        assert!(pred.violates(&mismatching, &rev).unwrap());
    }

    // -- Format -------------------------------------------------------------

    #[test]
    fn format_violates_on_non_matching_string() {
        let pred = ConstraintPredicate::Format { regex: Regex::new(r"^(?:[0-9]+)$").unwrap() };
        let rev = revision_with(vec![]);
        let good = claim("P528", Some(Value::Str("12345".into())));
        let bad = claim("P528", Some(Value::Str("abc".into())));
        assert!(!pred.violates(&good, &rev).unwrap());
        assert!(pred.violates(&bad, &rev).unwrap());
    }

    // -- Scope / structural predicates --------------------------------------

    #[test]
    fn property_scope_violates_outside_allowed_scopes() {
        let allowed: BTreeSet<Scope> = [Scope::Main].into_iter().collect();
        let pred = ConstraintPredicate::PropertyScope { allowed };
        let mut qualifier_claim = claim("P580", None);
        qualifier_claim.is_qualifier = true;
        let rev = revision_with(vec![]);
        assert!(pred.violates(&qualifier_claim, &rev).unwrap());
        let main_claim = claim("P580", Some(Value::Str("x".into())));
        assert!(!pred.violates(&main_claim, &rev).unwrap());
    }

    #[test]
    fn no_self_link_violates_when_target_is_the_same_entity() {
        let pred = ConstraintPredicate::NoSelfLink;
        let rev = revision_with(vec![]);
        let self_link = claim("P1365", Some(Value::Entity(EntityId::from("Q1"))));
        let other_link = claim("P1365", Some(Value::Entity(EntityId::from("Q2"))));
        assert!(pred.violates(&self_link, &rev).unwrap());
        assert!(!pred.violates(&other_link, &rev).unwrap());
    }

    #[test]
    fn sandbox_property_always_violates() {
        let pred = ConstraintPredicate::SandboxProperty;
        let rev = revision_with(vec![]);
        let c = claim("P2469", Some(Value::Str("anything".into())));
        assert!(pred.violates(&c, &rev).unwrap());
    }

    // -- Entity-level predicates ---------------------------------------------

    #[test]
    fn item_requires_satisfied_when_matching_value_present() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q5")].into_iter().collect();
        let pred = ConstraintPredicate::ItemRequires { prop: "P31".to_string(), values: Some(values) };
        let with = revision_with(vec![claim("P31", Some(Value::Entity(EntityId::from("Q5"))))]);
        let without = revision_with(vec![]);
        assert!(pred.satisfied(&with).unwrap());
        assert!(!pred.satisfied(&without).unwrap());
    }

    #[test]
    fn conflicts_with_unsatisfied_when_conflicting_value_present() {
        let values: BTreeSet<_> = [MembershipValue::entity("Q5")].into_iter().collect();
        let pred = ConstraintPredicate::ConflictsWith { prop: "P31".to_string(), values: Some(values) };
        let clean = revision_with(vec![]);
        let conflicting = revision_with(vec![claim("P31", Some(Value::Entity(EntityId::from("Q5"))))]);
        assert!(pred.satisfied(&clean).unwrap());
        assert!(!pred.satisfied(&conflicting).unwrap());
    }

    #[test]
    fn label_in_language_checks_the_declared_language_set() {
        let langs: BTreeSet<String> = ["en".to_string()].into_iter().collect();
        let pred = ConstraintPredicate::LabelInLanguage { langs };
        let mut rev = revision_with(vec![]);
        assert!(!pred.satisfied(&rev).unwrap());
        rev.labels.insert("en".to_string(), "Example".to_string());
        assert!(pred.satisfied(&rev).unwrap());
    }

    // -- HasValidReference (scoring-only predicate) --------------------------

    struct AlwaysAllow;
    impl ReferenceScopeSource for AlwaysAllow {
        fn reference_scope_allowed(&self, _prop: &str) -> bool {
            true
        }
    }

    fn reference_block(props: &[&str]) -> ReferenceBlock {
        let mut snaks = IndexMap::new();
        for p in props {
            snaks.insert(p.to_string(), vec![claim(p, Some(Value::Str("x".into())))]);
        }
        ReferenceBlock { snaks }
    }

    #[test]
    fn has_valid_reference_counts_non_blacklisted_source_properties() {
        let source: Arc<dyn ReferenceScopeSource> = Arc::new(AlwaysAllow);
        let pred = ConstraintPredicate::HasValidReference { store: Arc::downgrade(&source) };

        let mut with_real_source = claim("P39", Some(Value::Entity(EntityId::from("Q30185"))));
        with_real_source.sources.push(reference_block(&["P854"]));

        let old_rev = revision_with(vec![]);
        let new_rev = revision_with(vec![with_real_source.clone()]);
        let ctx = Context::new(&old_rev, &new_rev, None, Some(&with_real_source));
        assert_eq!(pred.score_for_addition(&ctx).unwrap(), -1);
    }

    #[test]
    fn has_valid_reference_ignores_blacklisted_only_sources() {
        let source: Arc<dyn ReferenceScopeSource> = Arc::new(AlwaysAllow);
        let pred = ConstraintPredicate::HasValidReference { store: Arc::downgrade(&source) };

        let mut metadata_only = claim("P39", Some(Value::Entity(EntityId::from("Q30185"))));
        metadata_only.sources.push(reference_block(&["P143"]));

        let old_rev = revision_with(vec![]);
        let new_rev = revision_with(vec![metadata_only.clone()]);
        let ctx = Context::new(&old_rev, &new_rev, None, Some(&metadata_only));
        assert_eq!(pred.score_for_addition(&ctx).unwrap(), 0);
    }

    // -- LargeChange ----------------------------------------------------------

    #[test]
    fn large_change_scores_log10_magnitude_of_ratio() {
        let pred = ConstraintPredicate::LargeChange;
        let old_claim = claim("P1082", Some(Value::Quantity(quantity(100, None))));
        let new_claim = claim("P1082", Some(Value::Quantity(quantity(1000, None))));
        let old_rev = revision_with(vec![old_claim.clone()]);
        let new_rev = revision_with(vec![new_claim.clone()]);
        let ctx = Context::new(&old_rev, &new_rev, Some(&old_claim), Some(&new_claim));
        assert_eq!(pred.score_for_update(&ctx).unwrap(), 1);
    }

    #[test]
    fn large_change_scores_zero_for_same_order_of_magnitude() {
        let pred = ConstraintPredicate::LargeChange;
        let old_claim = claim("P1082", Some(Value::Quantity(quantity(100, None))));
        let new_claim = claim("P1082", Some(Value::Quantity(quantity(110, None))));
        let old_rev = revision_with(vec![old_claim.clone()]);
        let new_rev = revision_with(vec![new_claim.clone()]);
        let ctx = Context::new(&old_rev, &new_rev, Some(&old_claim), Some(&new_claim));
        assert_eq!(pred.score_for_update(&ctx).unwrap(), 0);
    }
}
