//! HTTP client for the East pipeline deployer.

pub mod client;

pub use client::HttpClassifier;
