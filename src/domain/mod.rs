//! Domain layer for the fleetprint engine
//!
//! Fingerprint and snapshot models, the aspect/classifier/git ports and the
//! error taxonomy. Nothing here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
