//! Traits for the external collaborators the core consumes. The core never
//! performs I/O itself; every network-touching operation goes through one
//! of these.

pub mod collaborators;

pub use collaborators::{
    EntityStore, HttpClient, HttpResponse, SparqlClient, SparqlRow, SparqlValue, UserDirectory,
};
