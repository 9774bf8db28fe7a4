//! Errors raised by the external collaborators the engine consumes
//! (entity store, SPARQL client, HTTP client).

use super::error_code::{self, ErrorCode};
use crate::ids::EntityId;

/// Failure surfaced by an `EntityStore`, `SparqlClient` or `HttpClient`
/// implementation.
///
/// `NotFound` is the one variant predicates are expected to catch and turn
/// into a violation (per §7 of the design: "target-not-found... treated as a
/// violation by predicates that require the target to exist"). Every other
/// variant is transient/structural and propagates out of `evaluate_change`
/// as a hard error — no partial `Result` is produced.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    #[error("redirect chain exceeded {hops} hops starting from {start}")]
    RedirectCycle { start: EntityId, hops: u32 },

    #[error("transient collaborator failure: {0}")]
    Transient(String),

    #[error("key missing from revision data: {0}")]
    MissingKey(String),
}

impl ErrorCode for CollaboratorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => error_code::ENTITY_NOT_FOUND,
            Self::RedirectCycle { .. } => error_code::REDIRECT_CYCLE,
            Self::Transient(_) => error_code::TRANSIENT_FAILURE,
            Self::MissingKey(_) => error_code::MISSING_KEY,
        }
    }
}

impl CollaboratorError {
    /// Whether this failure should be treated as "the target does not
    /// exist" by predicates that require target existence, rather than
    /// propagated as a hard error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
