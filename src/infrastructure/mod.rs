//! Infrastructure layer module
//!
//! Adapters behind the domain ports and the process-level plumbing:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - HTTP classifier client (reqwest)
//! - Git CLI backend
//! - Local checkout loading
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod classifier;
pub mod config;
pub mod git;
pub mod logging;
pub mod workspace;
