//! Contracts for the collaborators the engine borrows from its host:
//! revision storage, SPARQL queries, raw HTTP fetches, and user-registration
//! lookups. Mirrors the `drift-core` trait-plus-`Arc`-blanket-impl pattern so
//! hosts can pass around a single shared handle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::CollaboratorError;
use crate::ids::EntityId;
use crate::entity::Revision;

/// Loads entity revisions by id. The only collaborator every predicate
/// ultimately depends on, directly or (via `SubjectType`/`ValueType`'s
/// cached base/class walks) transitively.
pub trait EntityStore: Send + Sync {
    /// Load the current revision of `id`.
    fn load(&self, id: &EntityId) -> Result<Revision, CollaboratorError>;

    /// Load a specific historical revision of `id`. Used when resolving the
    /// "old" side of a diff that was computed against a revision other than
    /// the current one.
    fn load_old_revision(&self, id: &EntityId, revision_id: u64) -> Result<Revision, CollaboratorError>;

    /// If `id` is currently a redirect, the id it points to; `None` if `id`
    /// is not a redirect (or does not exist — callers distinguish via
    /// `load`'s `NotFound`). `resolve_target_entity`-style predicates
    /// (`ValueRequires`, `Symmetric`, `Inverse`, ...) repeatedly call this
    /// until it returns `None`, capped by `EngineConfig::redirect_hop_limit`.
    fn redirect_target(&self, id: &EntityId) -> Result<Option<EntityId>, CollaboratorError> {
        let _ = id;
        Ok(None)
    }
}

impl<T: EntityStore + ?Sized> EntityStore for Arc<T> {
    fn load(&self, id: &EntityId) -> Result<Revision, CollaboratorError> {
        (**self).load(id)
    }

    fn load_old_revision(&self, id: &EntityId, revision_id: u64) -> Result<Revision, CollaboratorError> {
        (**self).load_old_revision(id, revision_id)
    }

    fn redirect_target(&self, id: &EntityId) -> Result<Option<EntityId>, CollaboratorError> {
        (**self).redirect_target(id)
    }
}

/// A single SPARQL query-solution binding, e.g. `{"item": Entity(Q42)}`.
#[derive(Debug, Clone, Default)]
pub struct SparqlRow(pub HashMap<String, SparqlValue>);

impl SparqlRow {
    pub fn entity(&self, var: &str) -> Option<&EntityId> {
        match self.0.get(var) {
            Some(SparqlValue::Entity(id)) => Some(id),
            _ => None,
        }
    }

    pub fn literal(&self, var: &str) -> Option<&str> {
        match self.0.get(var) {
            Some(SparqlValue::Literal(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// One bound SPARQL value. Collapsed to the two shapes the predicate family
/// actually inspects; anything else the backend returns is dropped during
/// binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparqlValue {
    Entity(EntityId),
    Literal(String),
}

/// Runs SPARQL queries against the backing knowledge base (Wikidata's query
/// service, in production). Used by `ValueRequires`/`ItemRequires` for
/// tree-closure membership checks and by `ConstraintsStore::get_item_constraints`
/// for batch discovery of which properties carry constraint declarations.
pub trait SparqlClient: Send + Sync {
    fn ask(&self, query: &str) -> Result<bool, CollaboratorError>;

    fn select(&self, query: &str) -> Result<Vec<SparqlRow>, CollaboratorError>;

    /// Convenience wrapper over `select` for the common case of projecting a
    /// single entity-valued variable.
    fn select_entities(&self, query: &str, var: &str) -> Result<Vec<EntityId>, CollaboratorError> {
        Ok(self
            .select(query)?
            .into_iter()
            .filter_map(|row| row.entity(var).cloned())
            .collect())
    }
}

impl<T: SparqlClient + ?Sized> SparqlClient for Arc<T> {
    fn ask(&self, query: &str) -> Result<bool, CollaboratorError> {
        (**self).ask(query)
    }

    fn select(&self, query: &str) -> Result<Vec<SparqlRow>, CollaboratorError> {
        (**self).select(query)
    }
}

/// Response from a plain HTTP fetch. Only the status is inspected today
/// (`Error404`'s existence probe); the body is kept for collaborators that
/// want to extend it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub ok: bool,
    pub status: u16,
}

/// Raw HTTP access, used only by `Error404` to probe whether an external URL
/// still resolves.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, CollaboratorError>;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(&self, url: &str) -> Result<HttpResponse, CollaboratorError> {
        (**self).get(url)
    }
}

/// Looks up editor registration/autoconfirmed status, used by
/// `SandboxProperty` to decide whether an edit to a sandbox-only property is
/// exempt from its usual violation.
pub trait UserDirectory: Send + Sync {
    fn is_registered_and_autoconfirmed(&self, username: &str) -> bool;
}

impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    fn is_registered_and_autoconfirmed(&self, username: &str) -> bool {
        (**self).is_registered_and_autoconfirmed(username)
    }
}
