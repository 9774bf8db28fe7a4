//! Item and property ids used by `P2302` declarations: which Q-id on the
//! target side names which predicate, and which P-id qualifiers carry each
//! predicate's parameters. Mirrors `evaluator.py::load_constraints`'s
//! dispatch table and qualifier reads.

/// Qualifier (parameter) property ids, shared across constraint types.
pub mod qualifier {
    pub const VALUES: &str = "P2305";
    pub const RELATED_PROPERTY: &str = "P2306";
    pub const NAMESPACE: &str = "P2307";
    pub const CLASSES: &str = "P2308";
    pub const RELATION: &str = "P2309";
    pub const MIN_DATE: &str = "P2310";
    pub const MAX_DATE: &str = "P2311";
    pub const MIN_QUANTITY: &str = "P2312";
    pub const MAX_QUANTITY: &str = "P2313";
    pub const PATTERN: &str = "P1793";
    pub const LANGUAGE: &str = "P424";
    pub const PROPERTY_SCOPE: &str = "P5314";
    pub const CONSTRAINT_SCOPE: &str = "P4680";
    pub const CONSTRAINT_STATUS: &str = "P2316";
    pub const SEPARATOR: &str = "P4155";
}

/// Declaration property/context ids outside the `P2302` qualifier set.
pub const CONSTRAINT_STATEMENT: &str = "P2302";
pub const FORMATTER_URL: &str = "P1630";

/// Target-side Q-ids naming each constraint type, as used in dispatch.
pub mod constraint_type {
    pub const PROPERTY_SCOPE: &str = "Q53869507";
    pub const ONE_OF: &str = "Q21510859";
    pub const NONE_OF: &str = "Q52558054";
    pub const FORMAT: &str = "Q21502404";
    pub const ITEM_REQUIRES: &str = "Q21503247";
    pub const VALUE_REQUIRES: &str = "Q21510864";
    pub const CONFLICTS_WITH: &str = "Q21502838";
    pub const LABEL_IN_LANGUAGE: &str = "Q108139345";
    pub const DESCRIPTION_IN_LANGUAGE: &str = "Q111204896";
    pub const SUBJECT_TYPE: &str = "Q21503250";
    pub const VALUE_TYPE: &str = "Q21510865";
    pub const SYMMETRIC: &str = "Q21510862";
    pub const INVERSE: &str = "Q21510855";
    pub const COMMONS_LINK: &str = "Q21510852";
    pub const INTEGER: &str = "Q52848401";
    pub const NO_BOUNDS: &str = "Q51723761";
    pub const QUANTITY_RANGE: &str = "Q21510860";
    pub const TIME_RANGE: &str = "Q21510866";
    pub const DIFFERENCE_WITHIN_RANGE: &str = "Q21510854";
    pub const UNITS: &str = "Q21514353";
    pub const QUALIFIERS: &str = "Q21510851";
    pub const REQUIRED_QUALIFIERS: &str = "Q21510856";
    pub const VALUE_EXISTS: &str = "Q21504325";
    pub const SANDBOX_PROPERTY: &str = "Q15720608";
    pub const ERROR_404: &str = "Q52004125";
}

/// `P2309` relation-choice Q-ids, mapped to the `wdt:` properties they walk.
/// Matches `evaluator.py`'s `val_to_relation` table exactly.
pub fn relation_for(id: &str) -> Option<&'static [&'static str]> {
    match id {
        "Q21503252" => Some(&["P31"]),
        "Q21514624" => Some(&["P279"]),
        "Q30208840" => Some(&["P31", "P279"]),
        _ => None,
    }
}

/// `P5314` (allowed-scope) choice Q-ids.
pub fn property_scope_for(id: &str) -> Option<axiom_core::Scope> {
    match id {
        "Q54828448" => Some(axiom_core::Scope::Main),
        "Q54828449" => Some(axiom_core::Scope::Qualifier),
        "Q54828450" => Some(axiom_core::Scope::Reference),
        _ => None,
    }
}

/// `P4680` (constraint-scope) choice Q-ids. A distinct set from
/// [`property_scope_for`]'s — Wikidata uses different items for "this
/// property is only usable on a main/qualifier/reference snak" versus "this
/// constraint only applies when checking a main/qualifier/reference snak".
pub fn constraint_scope_for(id: &str) -> Option<axiom_core::Scope> {
    match id {
        "Q46466787" => Some(axiom_core::Scope::Main),
        "Q46466783" => Some(axiom_core::Scope::Qualifier),
        "Q46466805" => Some(axiom_core::Scope::Reference),
        _ => None,
    }
}

/// `P2316` severity-choice Q-ids.
pub fn status_for(id: &str) -> Option<axiom_core::Status> {
    match id {
        "Q21502408" => Some(axiom_core::Status::Mandatory),
        "Q62026391" => Some(axiom_core::Status::Suggestion),
        _ => None,
    }
}
