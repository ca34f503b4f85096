//! Runs every registered capability against a project.

use std::path::Path;

use crate::artifact::ArtifactKind;
use crate::capability::{builtin_capabilities, Capability};
use crate::error::{Result, ShipkitError};

/// Ordered set of capabilities; registration order is the tie-break used
/// when several capabilities match.
#[derive(Default)]
pub struct DetectionRunner {
    capabilities: Vec<Box<dyn Capability>>,
}

impl DetectionRunner {
    /// Create a runner with no capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with the built-in capabilities.
    pub fn builtin() -> Self {
        Self {
            capabilities: builtin_capabilities(),
        }
    }

    pub fn register(&mut self, capability: Box<dyn Capability>) {
        self.capabilities.push(capability);
    }

    /// Add a capability, returning `self` for chaining.
    pub fn with(mut self, capability: Box<dyn Capability>) -> Self {
        self.register(capability);
        self
    }

    /// Registered capability names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// Every capability that recognises the project, in registration order.
    pub fn detect(self, project_root: &Path) -> Vec<Box<dyn Capability>> {
        let candidates: Vec<_> = self
            .capabilities
            .into_iter()
            .filter(|capability| capability.detect(project_root))
            .collect();

        tracing::debug!(
            "Detected candidates: {:?}",
            candidates.iter().map(|c| c.name()).collect::<Vec<_>>()
        );
        candidates
    }

    /// The `service.yml` capability, which is the only valid source for
    /// orchestration manifests.
    pub fn detect_descriptor(self, project_root: &Path) -> Result<Box<dyn Capability>> {
        let descriptor_name = ArtifactKind::ServiceDescriptor.file_name();
        self.capabilities
            .into_iter()
            .find(|c| c.name() == descriptor_name && c.detect(project_root))
            .ok_or_else(|| ShipkitError::NoServiceDescriptorFound {
                path: project_root.to_path_buf(),
            })
    }
}
