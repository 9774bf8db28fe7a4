//! Errors from parsing property-definition statements into constraints.
//!
//! Per §7, structural errors here are never fatal to a property's load: the
//! store logs and skips the offending declaration and continues. This type
//! exists for that logging, not for propagation — `ConstraintsStore::load`
//! itself never returns `Err`.

use super::error_code::{self, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("invalid regex in P1793 declaration: {0}")]
    InvalidRegex(String),

    #[error("invalid Commons namespace prefix: {0}")]
    InvalidNamespace(String),

    #[error("claim {claim_id} on {on_item} does not belong to its enclosing revision")]
    IntegrityViolation { on_item: String, claim_id: String },
}

impl ErrorCode for ConstraintError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRegex(_) => error_code::INVALID_REGEX,
            Self::InvalidNamespace(_) => error_code::INVALID_NAMESPACE,
            Self::IntegrityViolation { .. } => error_code::INTEGRITY_VIOLATION,
        }
    }
}
