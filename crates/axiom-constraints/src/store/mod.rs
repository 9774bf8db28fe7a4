//! The per-property constraint store: parses and caches each property's
//! `P2302` declarations, synthesizes the always-on predicates, and answers
//! bulk "which of these properties declare constraint X" discovery queries.

pub mod constraint_items;
pub mod discovery;
pub mod parse;

use std::sync::{Arc, RwLock, Weak};

use axiom_core::{EngineConfig, EntityId, EntityStore, HttpClient, PropertyId, Scope, SparqlClient};
use axiom_cache::SubjectTypeCache;
use rustc_hash::FxHashMap;

use crate::constraint::Constraint;
use crate::predicate::{ConstraintPredicate, ReferenceScopeSource};
use crate::store::parse::{parse_constraint, synthesized_constraints, ParseContext, PropertyDatatype};

pub use parse::PropertyDatatype as Datatype;

/// Failures surfaced while loading or parsing a property's constraints.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Collaborator(#[from] axiom_core::CollaboratorError),
}

/// Owns the per-property constraint cache and the collaborators every
/// parsed predicate borrows through. Held behind an `Arc` so its
/// [`ReferenceScopeSource`] self-handle (needed by `HasValidReference`) can
/// be a [`Weak`] reference rather than a true cycle.
pub struct ConstraintsStore {
    entity_store: Arc<dyn EntityStore>,
    sparql: Arc<dyn SparqlClient>,
    http: Arc<dyn HttpClient>,
    config: EngineConfig,
    cache: RwLock<FxHashMap<PropertyId, Arc<Vec<Constraint>>>>,
    subject_type_cache: Arc<SubjectTypeCache>,
    self_handle: Weak<ConstraintsStore>,
}

impl ConstraintsStore {
    pub fn new(
        entity_store: Arc<dyn EntityStore>,
        sparql: Arc<dyn SparqlClient>,
        http: Arc<dyn HttpClient>,
        config: EngineConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            subject_type_cache: Arc::new(SubjectTypeCache::new(config.effective_subject_type_cache_capacity())),
            entity_store,
            sparql,
            http,
            config,
            cache: RwLock::new(FxHashMap::default()),
            self_handle: weak.clone(),
        })
    }

    fn parse_ctx(&self) -> ParseContext {
        ParseContext {
            entity_store: self.entity_store.clone(),
            sparql: self.sparql.clone(),
            http: self.http.clone(),
            redirect_hop_limit: self.config.effective_redirect_hop_limit(),
            value_type_cache_capacity: self.config.effective_value_type_cache_capacity(),
            subject_type_cache: self.subject_type_cache.clone(),
            reference_scope_source: self.self_handle.clone(),
        }
    }

    /// The constraints declared (or synthesized) for `prop`, loading and
    /// caching them on first access. `datatype` only affects which
    /// synthesized extras are added (spec §4.2); it is ignored on a cache
    /// hit, so callers that need it current after a datatype change should
    /// `purge` first.
    pub fn get_constraints(&self, prop: &str, datatype: PropertyDatatype) -> Result<Arc<Vec<Constraint>>, StoreError> {
        if let Some(hit) = self.cache.read().expect("constraint cache lock poisoned").get(prop) {
            return Ok(hit.clone());
        }
        let loaded = Arc::new(self.load_constraints(prop, datatype)?);
        self.cache
            .write()
            .expect("constraint cache lock poisoned")
            .insert(prop.to_string(), loaded.clone());
        Ok(loaded)
    }

    fn load_constraints(&self, prop: &str, datatype: PropertyDatatype) -> Result<Vec<Constraint>, StoreError> {
        let property_page = self.entity_store.load(&EntityId::from(prop))?;
        let ctx = self.parse_ctx();
        let declarations = property_page.claims_for(constraint_items::CONSTRAINT_STATEMENT);
        let mut out: Vec<Constraint> = Vec::with_capacity(declarations.len());
        for claim in declarations {
            match parse_constraint(&prop.to_string(), claim, &ctx) {
                Some(c) => out.push(c),
                None if claim.is_deprecated() => {}
                None => tracing::warn!(property = prop, claim_id = claim.id.as_str(), "skipped unrecognized or malformed P2302 declaration"),
            }
        }
        let declared_count = out.len();
        out.extend(synthesized_constraints(&prop.to_string(), datatype, &ctx));
        tracing::debug!(property = prop, declared = declared_count, total = out.len(), "loaded constraints for property");
        Ok(out)
    }

    /// Drop `prop`'s cached constraints, forcing the next `get_constraints`
    /// call to reload and reparse them.
    pub fn purge(&self, prop: &str) {
        self.cache.write().expect("constraint cache lock poisoned").remove(prop);
    }
}

impl ReferenceScopeSource for ConstraintsStore {
    fn reference_scope_allowed(&self, prop: &str) -> bool {
        let constraints = match self.get_constraints(prop, PropertyDatatype::Other) {
            Ok(c) => c,
            Err(_) => return true,
        };
        constraints.iter().all(|c| match &c.predicate {
            ConstraintPredicate::PropertyScope { allowed } => allowed.contains(&Scope::Reference),
            _ => true,
        })
    }
}
