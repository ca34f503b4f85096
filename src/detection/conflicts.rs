//! Destination checks that run before any artifact is written.

use std::path::Path;

use crate::artifact::{ArtifactKind, ArtifactSet};
use crate::capability::Capability;
use crate::error::{Result, ShipkitError};

/// Refuses to overwrite existing artifacts unless explicitly allowed.
#[derive(Debug, Clone, Copy)]
pub struct ConflictGuard {
    allow_overwrite: bool,
}

impl ConflictGuard {
    pub fn new(allow_overwrite: bool) -> Self {
        Self { allow_overwrite }
    }

    /// Check every requested artifact.
    pub fn check(
        &self,
        project_root: &Path,
        artifacts: &ArtifactSet,
        capability: &dyn Capability,
    ) -> Result<()> {
        for kind in artifacts.iter() {
            self.check_one(project_root, kind, capability)?;
        }
        Ok(())
    }

    /// Check a single artifact. Files the capability owns natively are
    /// never conflicts.
    pub fn check_one(
        &self,
        project_root: &Path,
        kind: ArtifactKind,
        capability: &dyn Capability,
    ) -> Result<()> {
        if self.allow_overwrite || capability.owns(kind) {
            return Ok(());
        }

        if kind.path_in(project_root).exists() {
            return Err(ShipkitError::ArtifactExists {
                file: kind.file_name().to_string(),
            });
        }

        Ok(())
    }
}
