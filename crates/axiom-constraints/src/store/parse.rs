//! Parses a single `P2302` declaration claim into a [`Constraint`].
//!
//! Mirrors `evaluator.py::load_constraints`: dispatch on the declaration's
//! target Q-id, read parameters off its qualifiers, construct the matching
//! [`ConstraintPredicate`] variant.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use axiom_core::errors::{ConstraintError, ErrorCode};
use axiom_core::{Claim, EntityId, EntityStore, HttpClient, PropertyId, Scope, SnakType, SparqlClient, Status, Value};
use axiom_cache::{SubjectTypeCache, ValueTypeCache};

use crate::constraint::Constraint;
use crate::predicate::{ConstraintPredicate, ReferenceScopeSource};
use crate::store::constraint_items::{
    constraint_scope_for, constraint_type, property_scope_for, qualifier, relation_for, status_for,
};

/// Collaborators and tunables every parsed predicate variant needs a handle
/// to. Lives only for the duration of a `load_constraints` call.
pub struct ParseContext {
    pub entity_store: Arc<dyn EntityStore>,
    pub sparql: Arc<dyn SparqlClient>,
    pub http: Arc<dyn HttpClient>,
    pub redirect_hop_limit: u32,
    pub value_type_cache_capacity: u64,
    pub subject_type_cache: Arc<SubjectTypeCache>,
    pub reference_scope_source: Weak<dyn ReferenceScopeSource>,
}

fn qual<'a>(claim: &'a Claim, prop: &str) -> &'a [Claim] {
    claim.qualifiers.get(prop).map(Vec::as_slice).unwrap_or(&[])
}

fn membership_values(claim: &Claim, prop: &str) -> Option<BTreeSet<crate::membership::MembershipValue>> {
    use crate::membership::MembershipValue;
    let snaks = qual(claim, prop);
    if snaks.is_empty() {
        return None;
    }
    Some(
        snaks
            .iter()
            .filter_map(|s| match s.snak_type {
                SnakType::NoValue => Some(MembershipValue::Literal("novalue")),
                SnakType::SomeValue => Some(MembershipValue::Literal("somevalue")),
                SnakType::Value => s
                    .target
                    .as_ref()
                    .and_then(Value::as_entity)
                    .map(|id| MembershipValue::Entity(id.clone())),
            })
            .collect(),
    )
}

fn single_entity(claim: &Claim, prop: &str) -> Option<EntityId> {
    qual(claim, prop).first().and_then(|s| s.target.as_ref()).and_then(Value::as_entity).cloned()
}

fn entities(claim: &Claim, prop: &str) -> Vec<EntityId> {
    qual(claim, prop)
        .iter()
        .filter_map(|s| s.target.as_ref().and_then(Value::as_entity).cloned())
        .collect()
}

fn relation(claim: &Claim) -> Vec<PropertyId> {
    let chosen: Vec<PropertyId> = qual(claim, qualifier::RELATION)
        .iter()
        .filter_map(|s| s.target.as_ref().and_then(Value::as_entity))
        .filter_map(|id| relation_for(id.as_str()))
        .flat_map(|props| props.iter().map(|p| p.to_string()))
        .collect();
    if chosen.is_empty() {
        vec!["P31".to_string(), "P279".to_string()]
    } else {
        chosen
    }
}

fn time_bound(claim: &Claim, prop: &str) -> Option<axiom_core::WbTime> {
    let snak = qual(claim, prop).first()?;
    match snak.snak_type {
        SnakType::Value => snak.target.as_ref().and_then(Value::as_time).cloned(),
        // novalue/somevalue mean an open-ended bound ("no minimum"/"no
        // maximum", or "up to now") — approximated here as unbounded since
        // "now" has no fixed value at parse time.
        SnakType::NoValue | SnakType::SomeValue => None,
    }
}

fn quantity_bound(claim: &Claim, prop: &str) -> Option<rust_decimal::Decimal> {
    qual(claim, prop).first().and_then(|s| s.target.as_ref()).and_then(Value::as_quantity).map(|q| q.amount)
}

fn quantity_value(claim: &Claim, prop: &str) -> Option<axiom_core::Quantity> {
    qual(claim, prop).first().and_then(|s| s.target.as_ref()).and_then(Value::as_quantity).cloned()
}

fn regex_pattern(claim: &Claim) -> Option<String> {
    qual(claim, qualifier::PATTERN)
        .first()
        .and_then(|s| s.target.as_ref())
        .map(Value::format_projection)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn languages(claim: &Claim) -> BTreeSet<String> {
    qual(claim, qualifier::LANGUAGE)
        .iter()
        .filter_map(|s| s.target.as_ref())
        .map(Value::format_projection)
        .map(str::to_string)
        .collect()
}

/// The raw `P2307` namespace prefix, if a declaration gave one at all.
fn namespace_declaration(claim: &Claim) -> Option<String> {
    qual(claim, qualifier::NAMESPACE)
        .first()
        .and_then(|s| s.target.as_ref())
        .map(Value::format_projection)
        .map(str::to_string)
}

fn scopes_from(claim: &Claim, prop: &str, lookup: impl Fn(&str) -> Option<Scope>) -> BTreeSet<Scope> {
    let set: BTreeSet<Scope> = qual(claim, prop)
        .iter()
        .filter_map(|s| s.target.as_ref().and_then(Value::as_entity))
        .filter_map(|id| lookup(id.as_str()))
        .collect();
    if set.is_empty() {
        Scope::all()
    } else {
        set
    }
}

fn status(claim: &Claim) -> Status {
    qual(claim, qualifier::CONSTRAINT_STATUS)
        .first()
        .and_then(|s| s.target.as_ref().and_then(Value::as_entity))
        .and_then(|id| status_for(id.as_str()))
        .unwrap_or_default()
}

/// Build the [`Constraint`] a single `P2302` declaration claim describes, or
/// `None` if its target Q-id names no recognized constraint type (forward
/// compatibility: unrecognized declarations are silently ignored, matching
/// the source's behavior of only dispatching on a known set of types).
pub fn parse_constraint(prop: &PropertyId, claim: &Claim, ctx: &ParseContext) -> Option<Constraint> {
    if claim.is_deprecated() {
        return None;
    }
    let target = claim.target.as_ref()?.as_entity()?;
    let predicate = build_predicate(target.as_str(), claim, ctx)?;
    Some(Constraint::new(
        prop.clone(),
        Some(claim.id.clone()),
        predicate,
        status(claim),
        scopes_from(claim, qualifier::CONSTRAINT_SCOPE, constraint_scope_for),
    ))
}

fn build_predicate(type_id: &str, claim: &Claim, ctx: &ParseContext) -> Option<ConstraintPredicate> {
    use constraint_type as ct;
    Some(match type_id {
        ct::PROPERTY_SCOPE => {
            ConstraintPredicate::PropertyScope { allowed: scopes_from(claim, qualifier::PROPERTY_SCOPE, property_scope_for) }
        }
        ct::ONE_OF => ConstraintPredicate::OneOf { values: membership_values(claim, qualifier::VALUES)? },
        ct::NONE_OF => ConstraintPredicate::NoneOf { values: membership_values(claim, qualifier::VALUES)? },
        ct::FORMAT => {
            let pattern = regex_pattern(claim)?;
            let anchored = format!("^(?:{pattern})$");
            match regex::Regex::new(&anchored) {
                Ok(regex) => ConstraintPredicate::Format { regex },
                Err(_) => {
                    let err = ConstraintError::InvalidRegex(pattern);
                    tracing::warn!(claim_id = claim.id.as_str(), code = err.error_code(), "{err}");
                    return None;
                }
            }
        }
        ct::ITEM_REQUIRES => ConstraintPredicate::ItemRequires {
            prop: single_entity(claim, qualifier::RELATED_PROPERTY)?.as_str().to_string(),
            values: membership_values(claim, qualifier::VALUES),
        },
        ct::VALUE_REQUIRES => ConstraintPredicate::ValueRequires {
            prop: single_entity(claim, qualifier::RELATED_PROPERTY)?.as_str().to_string(),
            values: membership_values(claim, qualifier::VALUES),
            entity_store: ctx.entity_store.clone(),
            redirect_hop_limit: ctx.redirect_hop_limit,
        },
        ct::CONFLICTS_WITH => ConstraintPredicate::ConflictsWith {
            prop: single_entity(claim, qualifier::RELATED_PROPERTY)?.as_str().to_string(),
            values: membership_values(claim, qualifier::VALUES),
        },
        ct::LABEL_IN_LANGUAGE => ConstraintPredicate::LabelInLanguage { langs: languages(claim) },
        ct::DESCRIPTION_IN_LANGUAGE => ConstraintPredicate::DescriptionInLanguage { langs: languages(claim) },
        ct::SUBJECT_TYPE => ConstraintPredicate::SubjectType {
            relation: relation(claim),
            classes: entities(claim, qualifier::CLASSES),
            sparql: ctx.sparql.clone(),
            cache: ctx.subject_type_cache.clone(),
        },
        ct::VALUE_TYPE => ConstraintPredicate::ValueType {
            relation: relation(claim),
            classes: entities(claim, qualifier::CLASSES),
            sparql: ctx.sparql.clone(),
            cache: Arc::new(ValueTypeCache::new(ctx.value_type_cache_capacity)),
        },
        ct::SYMMETRIC => ConstraintPredicate::Symmetric {
            entity_store: ctx.entity_store.clone(),
            redirect_hop_limit: ctx.redirect_hop_limit,
        },
        ct::INVERSE => ConstraintPredicate::Inverse {
            prop: single_entity(claim, qualifier::RELATED_PROPERTY)?.as_str().to_string(),
            entity_store: ctx.entity_store.clone(),
            redirect_hop_limit: ctx.redirect_hop_limit,
        },
        ct::COMMONS_LINK => {
            let ns = match namespace_declaration(claim) {
                None => "File".to_string(),
                Some(raw) if raw.is_empty() || raw.contains(':') => {
                    let err = ConstraintError::InvalidNamespace(raw);
                    tracing::warn!(claim_id = claim.id.as_str(), code = err.error_code(), "{err}");
                    return None;
                }
                Some(raw) => raw,
            };
            ConstraintPredicate::CommonsLink {
                file_repo_base: "https://commons.wikimedia.org".to_string(),
                namespace: ns,
                http: ctx.http.clone(),
            }
        }
        ct::INTEGER => ConstraintPredicate::Integer,
        ct::NO_BOUNDS => ConstraintPredicate::NoBounds,
        ct::QUANTITY_RANGE => ConstraintPredicate::QuantityRange {
            lower: quantity_bound(claim, qualifier::MIN_QUANTITY),
            upper: quantity_bound(claim, qualifier::MAX_QUANTITY),
        },
        ct::TIME_RANGE => ConstraintPredicate::TimeRange {
            lower: time_bound(claim, qualifier::MIN_DATE),
            upper: time_bound(claim, qualifier::MAX_DATE),
        },
        ct::DIFFERENCE_WITHIN_RANGE => ConstraintPredicate::DifferenceWithinRange {
            prop: single_entity(claim, qualifier::RELATED_PROPERTY)?.as_str().to_string(),
            lower: quantity_value(claim, qualifier::MIN_QUANTITY),
            upper: quantity_value(claim, qualifier::MAX_QUANTITY),
        },
        ct::UNITS => ConstraintPredicate::Units { units: membership_values(claim, qualifier::VALUES)? },
        ct::QUALIFIERS => ConstraintPredicate::Qualifiers {
            allowed: entities(claim, qualifier::RELATED_PROPERTY).into_iter().map(|e| e.as_str().to_string()).collect(),
        },
        ct::REQUIRED_QUALIFIERS => ConstraintPredicate::RequiredQualifiers {
            required: entities(claim, qualifier::RELATED_PROPERTY).into_iter().map(|e| e.as_str().to_string()).collect(),
        },
        ct::VALUE_EXISTS => ConstraintPredicate::ValueExists { entity_store: ctx.entity_store.clone() },
        ct::SANDBOX_PROPERTY => ConstraintPredicate::SandboxProperty,
        ct::ERROR_404 => ConstraintPredicate::Error404 { entity_store: ctx.entity_store.clone(), http: ctx.http.clone() },
        _ => return None,
    })
}

/// The constraints synthesized regardless of any `P2302` declaration: every
/// property gets `HasValidReference`; item-typed and quantity-typed
/// properties get the extras `evaluator.py` hard-codes by datatype.
pub fn synthesized_constraints(prop: &PropertyId, datatype: PropertyDatatype, ctx: &ParseContext) -> Vec<Constraint> {
    let mut out = vec![Constraint::new(
        prop.clone(),
        None,
        ConstraintPredicate::HasValidReference { store: ctx.reference_scope_source.clone() },
        Status::Regular,
        Scope::all(),
    )];
    match datatype {
        PropertyDatatype::WikibaseItem => {
            out.push(Constraint::new(
                prop.clone(),
                None,
                ConstraintPredicate::NoLinksToDisambiguation {
                    entity_store: ctx.entity_store.clone(),
                    redirect_hop_limit: ctx.redirect_hop_limit,
                },
                Status::Mandatory,
                [Scope::Main].into_iter().collect(),
            ));
            out.push(Constraint::new(
                prop.clone(),
                None,
                ConstraintPredicate::NoSelfLink,
                Status::Mandatory,
                Scope::all(),
            ));
        }
        PropertyDatatype::Quantity => {
            out.push(Constraint::new(
                prop.clone(),
                None,
                ConstraintPredicate::LargeChange,
                Status::Suggestion,
                Scope::all(),
            ));
        }
        PropertyDatatype::Other => {}
    }
    out
}

/// The property datatypes that gate which constraints
/// [`synthesized_constraints`] adds. A host's `EntityStore` has no uniform
/// way to expose a property's declared Wikibase datatype, so callers
/// (`ConstraintsStore::load_constraints`) pass this in directly rather than
/// deriving it from loaded claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyDatatype {
    WikibaseItem,
    Quantity,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::{CollaboratorError, HttpResponse, Rank, Revision, SparqlRow};
    use indexmap::IndexMap;
    use std::sync::Weak;

    struct NullStore;
    impl EntityStore for NullStore {
        fn load(&self, id: &EntityId) -> Result<Revision, CollaboratorError> {
            Err(CollaboratorError::NotFound(id.clone()))
        }
        fn load_old_revision(&self, id: &EntityId, _revision_id: u64) -> Result<Revision, CollaboratorError> {
            Err(CollaboratorError::NotFound(id.clone()))
        }
    }

    struct NullSparql;
    impl SparqlClient for NullSparql {
        fn ask(&self, _query: &str) -> Result<bool, CollaboratorError> {
            Ok(false)
        }
        fn select(&self, _query: &str) -> Result<Vec<SparqlRow>, CollaboratorError> {
            Ok(Vec::new())
        }
    }

    struct NullHttp;
    impl HttpClient for NullHttp {
        fn get(&self, _url: &str) -> Result<HttpResponse, CollaboratorError> {
            Ok(HttpResponse { ok: false, status: 0 })
        }
    }

    fn ctx() -> ParseContext {
        ParseContext {
            entity_store: Arc::new(NullStore),
            sparql: Arc::new(NullSparql),
            http: Arc::new(NullHttp),
            redirect_hop_limit: 10,
            value_type_cache_capacity: 100,
            subject_type_cache: Arc::new(SubjectTypeCache::new(100)),
            reference_scope_source: Weak::<NullRefSource>::new(),
        }
    }

    struct NullRefSource;
    impl crate::predicate::ReferenceScopeSource for NullRefSource {
        fn reference_scope_allowed(&self, _prop: &str) -> bool {
            true
        }
    }

    fn qualifier_snak(prop: &str, target: Option<Value>) -> Claim {
        Claim {
            id: format!("q${prop}"),
            on_item: EntityId::from("P17"),
            property: prop.to_string(),
            snak_type: if target.is_some() { SnakType::Value } else { SnakType::NoValue },
            target,
            rank: Rank::Normal,
            qualifiers: IndexMap::new(),
            sources: Vec::new(),
            is_qualifier: true,
            is_reference: false,
        }
    }

    fn declaration(target: &str, quals: Vec<Claim>) -> Claim {
        let mut qualifiers: IndexMap<String, Vec<Claim>> = IndexMap::new();
        for q in quals {
            qualifiers.entry(q.property.clone()).or_default().push(q);
        }
        Claim {
            id: "P17$decl1".to_string(),
            on_item: EntityId::from("P17"),
            property: CONSTRAINT_STATEMENT.to_string(),
            snak_type: SnakType::Value,
            target: Some(Value::Entity(EntityId::from(target))),
            rank: Rank::Normal,
            qualifiers,
            sources: Vec::new(),
            is_qualifier: false,
            is_reference: false,
        }
    }

    #[test]
    fn one_of_declaration_parses_its_qualifier_values() {
        use crate::store::constraint_items::constraint_type::ONE_OF;
        let decl = declaration(
            ONE_OF,
            vec![
                qualifier_snak(qualifier::VALUES, Some(Value::Entity(EntityId::from("Q1")))),
                qualifier_snak(qualifier::VALUES, Some(Value::Entity(EntityId::from("Q2")))),
            ],
        );
        let prop = "P17".to_string();
        let c = parse_constraint(&prop, &decl, &ctx()).expect("one-of should parse");
        assert_eq!(c.property, "P17");
        assert_eq!(c.status, Status::default());
        match c.predicate {
            ConstraintPredicate::OneOf { values } => assert_eq!(values.len(), 2),
            other => panic!("expected OneOf, got {other:?}"),
        }
    }

    #[test]
    fn one_of_declaration_with_no_values_qualifier_fails_to_parse() {
        use crate::store::constraint_items::constraint_type::ONE_OF;
        let decl = declaration(ONE_OF, vec![]);
        let prop = "P17".to_string();
        assert!(parse_constraint(&prop, &decl, &ctx()).is_none());
    }

    #[test]
    fn status_qualifier_maps_to_mandatory() {
        use crate::store::constraint_items::constraint_type::ONE_OF;
        let decl = declaration(
            ONE_OF,
            vec![
                qualifier_snak(qualifier::VALUES, Some(Value::Entity(EntityId::from("Q1")))),
                qualifier_snak(qualifier::CONSTRAINT_STATUS, Some(Value::Entity(EntityId::from("Q21502408")))),
            ],
        );
        let prop = "P17".to_string();
        let c = parse_constraint(&prop, &decl, &ctx()).unwrap();
        assert_eq!(c.status, Status::Mandatory);
    }

    #[test]
    fn property_scope_qualifier_narrows_allowed_scopes() {
        use crate::store::constraint_items::constraint_type::PROPERTY_SCOPE;
        let decl = declaration(
            PROPERTY_SCOPE,
            vec![qualifier_snak(qualifier::PROPERTY_SCOPE, Some(Value::Entity(EntityId::from("Q54828448"))))],
        );
        let prop = "P17".to_string();
        let c = parse_constraint(&prop, &decl, &ctx()).unwrap();
        match c.predicate {
            ConstraintPredicate::PropertyScope { allowed } => {
                assert_eq!(allowed, [Scope::Main].into_iter().collect())
            }
            other => panic!("expected PropertyScope, got {other:?}"),
        }
    }

    #[test]
    fn deprecated_declaration_is_ignored() {
        use crate::store::constraint_items::constraint_type::ONE_OF;
        let mut decl = declaration(ONE_OF, vec![qualifier_snak(qualifier::VALUES, Some(Value::Entity(EntityId::from("Q1"))))]);
        decl.rank = Rank::Deprecated;
        let prop = "P17".to_string();
        assert!(parse_constraint(&prop, &decl, &ctx()).is_none());
    }

    #[test]
    fn unrecognized_constraint_type_is_ignored() {
        let decl = declaration("Q999999999", vec![]);
        let prop = "P17".to_string();
        assert!(parse_constraint(&prop, &decl, &ctx()).is_none());
    }

    #[test]
    fn synthesized_constraints_add_item_specific_extras() {
        let prop = "P17".to_string();
        let out = synthesized_constraints(&prop, PropertyDatatype::WikibaseItem, &ctx());
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0].predicate, ConstraintPredicate::HasValidReference { .. }));
        assert!(matches!(out[1].predicate, ConstraintPredicate::NoLinksToDisambiguation { .. }));
        assert!(matches!(out[2].predicate, ConstraintPredicate::NoSelfLink));
    }

    #[test]
    fn synthesized_constraints_add_quantity_specific_extras() {
        let prop = "P1082".to_string();
        let out = synthesized_constraints(&prop, PropertyDatatype::Quantity, &ctx());
        assert_eq!(out.len(), 2);
        assert!(matches!(out[1].predicate, ConstraintPredicate::LargeChange));
    }

    #[test]
    fn synthesized_constraints_other_datatype_only_gets_reference_check() {
        let prop = "P31".to_string();
        let out = synthesized_constraints(&prop, PropertyDatatype::Other, &ctx());
        assert_eq!(out.len(), 1);
    }
}
