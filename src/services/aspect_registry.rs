//! Typed aspect registry.
//!
//! Built once at startup and shared read-only. Order is registration order
//! and is what reports and the CLI display; lookups are by aspect name,
//! which is also the `type` of the fingerprints the aspect emits.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::Aspect;

#[derive(Clone, Default)]
pub struct AspectRegistry {
    aspects: Vec<Arc<dyn Aspect>>,
}

impl AspectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `aspects`, rejecting duplicate names.
    pub fn from_aspects(aspects: Vec<Arc<dyn Aspect>>) -> DomainResult<Self> {
        let mut registry = Self::new();
        for aspect in aspects {
            registry.register(aspect)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, aspect: Arc<dyn Aspect>) -> DomainResult<()> {
        if self.get(aspect.name()).is_some() {
            return Err(DomainError::DuplicateAspect(aspect.name().to_string()));
        }
        self.aspects.push(aspect);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Aspect>> {
        self.aspects.iter().find(|a| a.name() == name)
    }

    /// Aspect that owns fingerprints of `fingerprint_type`.
    pub fn owner_of(&self, fingerprint_type: &str) -> Option<&Arc<dyn Aspect>> {
        self.get(fingerprint_type)
    }

    /// A registry restricted to `names`; an empty list keeps everything.
    ///
    /// Unknown names are an error so a typo in configuration does not
    /// silently disable an aspect.
    pub fn only(&self, names: &[String]) -> DomainResult<Self> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(DomainError::AspectNotFound(unknown.clone()));
        }
        Ok(Self {
            aspects: self
                .aspects
                .iter()
                .filter(|a| names.iter().any(|n| n == a.name()))
                .cloned()
                .collect(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Aspect>> {
        self.aspects.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.aspects.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }
}

impl std::fmt::Debug for AspectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
