//! Ports (interfaces) between the engine and its collaborators.

pub mod aspect;
pub mod classifier;
pub mod git;

pub use aspect::{ApplyContext, Aspect, AspectDetails, ExtractionContext};
pub use classifier::{ClassifierError, RemoteClassifier};
pub use git::{GitBackend, MergeAttempt, RebaseAttempt};
