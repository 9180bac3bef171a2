//! Convergence engine: rewrite a repository toward a target fingerprint.
//!
//! Dispatches to the aspect that owns the target's fingerprint type. Every
//! path returns an [`ApplyOutcome`]; nothing here is an error to the caller,
//! so a fleet-wide convergence run keeps going past any one repository.

use super::aspect_registry::AspectRegistry;
use crate::domain::models::{ApplyOutcome, ApplyParameters, RepoSnapshot, SkipReason};
use crate::domain::ports::ApplyContext;

pub struct ConvergenceEngine {
    registry: AspectRegistry,
}

impl ConvergenceEngine {
    pub const fn new(registry: AspectRegistry) -> Self {
        Self { registry }
    }

    pub const fn registry(&self) -> &AspectRegistry {
        &self.registry
    }

    pub async fn apply(
        &self,
        snapshot: RepoSnapshot,
        params: &ApplyParameters,
        ctx: &ApplyContext,
    ) -> ApplyOutcome {
        let Some(target) = params.fp.as_ref() else {
            ctx.span.in_scope(|| {
                tracing::error!(project = %snapshot.id, "no target fingerprint in apply parameters");
            });
            return ApplyOutcome::Skipped {
                snapshot,
                reason: SkipReason::MissingTarget,
            };
        };

        let Some(aspect) = self.registry.owner_of(&target.fingerprint_type) else {
            ctx.span.in_scope(|| {
                tracing::warn!(
                    project = %snapshot.id,
                    fingerprint_type = %target.fingerprint_type,
                    "no registered aspect owns this fingerprint type"
                );
            });
            return ApplyOutcome::Skipped {
                snapshot,
                reason: SkipReason::UnknownAspect,
            };
        };

        if !aspect.supports_apply() {
            ctx.span.in_scope(|| {
                tracing::info!(project = %snapshot.id, aspect = aspect.name(), "aspect is read-only; skipping apply");
            });
            return ApplyOutcome::Skipped {
                snapshot,
                reason: SkipReason::ReadOnlyAspect,
            };
        }

        match aspect.apply(&snapshot, target, ctx).await {
            Ok(outcome) => {
                ctx.span.in_scope(|| {
                    tracing::info!(
                        project = %snapshot.id,
                        aspect = aspect.name(),
                        fingerprint = %target.name,
                        status = outcome.status(),
                        "apply finished"
                    );
                });
                outcome
            }
            Err(err) => {
                ctx.span.in_scope(|| {
                    tracing::error!(project = %snapshot.id, aspect = aspect.name(), error = %err, "apply failed");
                });
                ApplyOutcome::Failed {
                    snapshot,
                    error: err.to_string(),
                }
            }
        }
    }
}
