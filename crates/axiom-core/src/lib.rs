//! # axiom-core
//!
//! Foundation crate for the axiom constraint engine.
//! Defines the entity/claim/value model, scope and status types, errors,
//! config, collaborator traits, and logging setup. Every other crate in
//! the workspace depends on this one.

pub mod config;
pub mod context;
pub mod entity;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod rank;
pub mod scope;
pub mod status;
pub mod traits;
pub mod value;

pub use config::EngineConfig;
pub use context::Context;
pub use entity::{same_as, Claim, ReferenceBlock, Revision, SnakType};
pub use errors::{CollaboratorError, ConstraintError};
pub use ids::{EntityId, PropertyId};
pub use rank::Rank;
pub use scope::Scope;
pub use status::Status;
pub use traits::{EntityStore, HttpClient, HttpResponse, SparqlClient, SparqlRow, SparqlValue, UserDirectory};
pub use value::{Quantity, Value, WbTime};
