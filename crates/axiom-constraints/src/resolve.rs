//! Redirect-following entity resolution, shared by every predicate that
//! dereferences a claim's entity-typed target (`ValueRequires`, `Symmetric`,
//! `Inverse`, `NoLinksToDisambiguation`, `ValueExists`, `Error404`'s
//! property-page lookup).

use axiom_core::{CollaboratorError, EntityId, EntityStore, Revision};

/// Follow `id`'s redirect chain (via `EntityStore::redirect_target`) until it
/// resolves to a non-redirect, then load and return that revision.
///
/// The source (`original_source/utils.py::resolve_target_entity`) loops
/// unconditionally; per §9's design note this implementation caps the chain
/// at `hop_limit` hops and reports a cycle rather than looping forever.
pub fn resolve_target_entity(
    store: &dyn EntityStore,
    id: &EntityId,
    hop_limit: u32,
) -> Result<Revision, CollaboratorError> {
    let mut current = id.clone();
    for _ in 0..hop_limit {
        match store.redirect_target(&current)? {
            Some(next) => current = next,
            None => return store.load(&current),
        }
    }
    Err(CollaboratorError::RedirectCycle {
        start: id.clone(),
        hops: hop_limit,
    })
}
