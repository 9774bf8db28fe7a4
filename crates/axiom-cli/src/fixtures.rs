//! A disk-backed, read-only stand-in for the Wikibase client collaborators
//! the core requires (spec §6: `EntityStore`/`SparqlClient`/`HttpClient`).
//!
//! Nothing here is part of the engine: it exists so the workspace ships a
//! runnable front end, per `SPEC_FULL.md`'s `axiom-cli` note. A real host
//! wires the same traits to an actual MediaWiki/Wikidata client and a live
//! SPARQL endpoint.

use std::collections::HashMap;

use axiom_constraints::PropertyDatatype;
use axiom_core::{CollaboratorError, EntityId, EntityStore, HttpClient, HttpResponse, Revision, SparqlClient, SparqlRow};

/// A fixed set of entity/property-page revisions loaded once from disk.
/// `load_old_revision` ignores the requested revision id and returns
/// whatever snapshot is on file for that entity — this CLI only ever deals
/// with the single "current" snapshot a fixture file captures.
pub struct InMemoryEntityStore {
    revisions: HashMap<String, Revision>,
    redirects: HashMap<String, String>,
}

impl InMemoryEntityStore {
    pub fn new(revisions: Vec<Revision>, redirects: HashMap<String, String>) -> Self {
        let revisions = revisions.into_iter().map(|r| (r.entity_id.as_str().to_string(), r)).collect();
        Self { revisions, redirects }
    }
}

impl EntityStore for InMemoryEntityStore {
    fn load(&self, id: &EntityId) -> Result<Revision, CollaboratorError> {
        self.revisions
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(id.clone()))
    }

    fn load_old_revision(&self, id: &EntityId, _revision_id: u64) -> Result<Revision, CollaboratorError> {
        self.load(id)
    }

    fn redirect_target(&self, id: &EntityId) -> Result<Option<EntityId>, CollaboratorError> {
        Ok(self.redirects.get(id.as_str()).map(|t| EntityId::new(t.clone())))
    }
}

/// No network access from a fixture run: every `ask`/`select` reports "no
/// match" rather than reaching out to a live query service. `SubjectType`,
/// `ValueType`, `ItemRequires`-style class checks and bulk item-constraint
/// discovery therefore always take their empty-result branch; this is
/// sufficient to exercise the diff/store/scoring pipeline end to end but
/// understates constraints whose truth genuinely depends on the knowledge
/// base graph.
pub struct OfflineSparql;

impl SparqlClient for OfflineSparql {
    fn ask(&self, _query: &str) -> Result<bool, CollaboratorError> {
        Ok(false)
    }

    fn select(&self, _query: &str) -> Result<Vec<SparqlRow>, CollaboratorError> {
        Ok(Vec::new())
    }
}

/// No network access from a fixture run: `Error404`'s formatter-URL probe
/// always reports "unreachable".
pub struct OfflineHttp;

impl HttpClient for OfflineHttp {
    fn get(&self, _url: &str) -> Result<HttpResponse, CollaboratorError> {
        Ok(HttpResponse { ok: false, status: 0 })
    }
}

/// Datatype fixture: a flat `property_id -> "item" | "quantity" | "other"`
/// map, loaded once alongside the entity snapshots. Only the datatypes
/// `synthesized_constraints` (spec §4.2) branches on are representable;
/// anything else collapses to `Other`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct DatatypeFixture(HashMap<String, String>);

impl DatatypeFixture {
    pub fn datatype_of(&self, prop: &str) -> PropertyDatatype {
        match self.0.get(prop).map(String::as_str) {
            Some("item") => PropertyDatatype::WikibaseItem,
            Some("quantity") => PropertyDatatype::Quantity,
            _ => PropertyDatatype::Other,
        }
    }
}

impl axiom_eval::PropertyDatatypes for DatatypeFixture {
    fn datatype_of(&self, prop: &str) -> PropertyDatatype {
        DatatypeFixture::datatype_of(self, prop)
    }
}
