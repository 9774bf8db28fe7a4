//! A stable, machine-readable code per error variant, independent of the
//! (human-facing, interpolated) `Display` message.

pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const ENTITY_NOT_FOUND: &str = "COLLAB_ENTITY_NOT_FOUND";
pub const TRANSIENT_FAILURE: &str = "COLLAB_TRANSIENT_FAILURE";
pub const MISSING_KEY: &str = "COLLAB_MISSING_KEY";
pub const REDIRECT_CYCLE: &str = "COLLAB_REDIRECT_CYCLE";

pub const INVALID_REGEX: &str = "CONSTRAINT_INVALID_REGEX";
pub const INVALID_NAMESPACE: &str = "CONSTRAINT_INVALID_NAMESPACE";
pub const INTEGRITY_VIOLATION: &str = "CONSTRAINT_INTEGRITY_VIOLATION";
