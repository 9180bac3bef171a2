pub mod aspect_registry;
pub mod aspects;
pub mod convergence_engine;
pub mod drift;
pub mod extraction_pipeline;
pub mod rebase_policy;

pub use aspect_registry::AspectRegistry;
pub use aspects::builtin_aspects;
pub use convergence_engine::ConvergenceEngine;
pub use drift::{DriftEntry, DriftReport, DriftStatus};
pub use extraction_pipeline::{AspectFailure, ExtractionPipeline, ExtractionReport};
pub use rebase_policy::RebasePolicy;
