//! Error types shared across the workspace.

pub mod collaborator_error;
pub mod constraint_error;
pub mod error_code;

pub use collaborator_error::CollaboratorError;
pub use constraint_error::ConstraintError;
pub use error_code::ErrorCode;
