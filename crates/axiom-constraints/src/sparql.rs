//! SPARQL query templates emitted by the class/subclass-walking predicates.
//! These strings are part of the external contract (spec §6): hosts wiring
//! a real `SparqlClient` depend on this exact shape.

use axiom_core::{EntityId, PropertyId};

fn wd_values(ids: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    ids.into_iter()
        .map(|id| format!("wd:{}", id.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `SubjectType`'s batch closure query: for each `base` in `bases`, which
/// superclasses (`wdt:P279+`) it reaches.
pub fn subject_type_query(bases: &[EntityId]) -> String {
    format!(
        "SELECT REDUCED ?base ?super {{ VALUES ?base {{ {} }} . ?base wdt:P279+ ?super }}",
        wd_values(bases.iter().map(EntityId::as_str))
    )
}

/// `ValueType`'s membership `ASK` query for a single resolved target id.
/// The relation-dependent prefix mirrors the source exactly: a bare
/// `wdt:P279*` walk when `relation == ["P279"]`, otherwise `wdt:P31/` (or
/// `wdt:P31?/` when `P279` is also in `relation`) prepended.
pub fn value_type_query(target: &EntityId, relation: &[PropertyId], classes: &[EntityId]) -> String {
    let mut pattern = format!(
        "ASK {{ VALUES ?class {{ {} }} . wd:{} ",
        wd_values(classes.iter().map(EntityId::as_str)),
        target.as_str()
    );
    if relation != ["P279"] {
        pattern.push_str("wdt:P31");
        if relation.iter().any(|p| p == "P279") {
            pattern.push('?');
        }
        pattern.push('/');
    }
    pattern.push_str("wdt:P279* ?class }");
    pattern
}

/// Item-constraint bulk-discovery query for predicates without a `changed`
/// dependency (spec §4.2): which of `candidates` declare a `P2302`
/// constraint of the given Q-id.
pub fn discovery_query_unconditional(candidates: &[PropertyId], constraint_item: &str) -> String {
    format!(
        "SELECT DISTINCT ?prop {{ VALUES ?prop {{ {} }} . ?prop wdt:P2302 wd:{} }}",
        wd_values(candidates.iter().map(String::as_str)),
        constraint_item
    )
}

/// Item-constraint bulk-discovery query for predicates gated on a `changed`
/// property set (e.g. `SubjectType`, which only matters when `P31`/`P279`
/// moved): which of `candidates` declare the constraint with a `P2306`
/// (related-property) qualifier naming one of `changed`.
pub fn discovery_query_conditional(
    candidates: &[PropertyId],
    changed: &[PropertyId],
    constraint_item: &str,
) -> String {
    format!(
        "SELECT DISTINCT ?prop {{ VALUES ?prop {{ {} }} . VALUES ?changed {{ {} }} . \
         ?prop p:P2302 [ ps:P2302 wd:{}; pq:P2306 ?changed ] }}",
        wd_values(candidates.iter().map(String::as_str)),
        wd_values(changed.iter().map(String::as_str)),
        constraint_item
    )
}
