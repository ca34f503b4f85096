//! Capability modules.
//!
//! A capability recognises one ecosystem (a language, a framework, or an
//! existing deployment format) and knows how to render that ecosystem's
//! artifacts. The orchestration pipeline only talks to capabilities through
//! the [`Capability`] trait.
//!
//! # Built-in capabilities
//!
//! - [`MarkerCapability`] - language stacks recognised by marker files
//! - [`ComposeCapability`] - projects that already ship a `docker-compose.yml`
//! - [`DescriptorCapability`] - projects that already ship a `service.yml`

pub mod bundle;
pub mod compose;
pub mod descriptor;
pub mod kube;
pub mod marker;
pub mod template;

pub use compose::ComposeCapability;
pub use descriptor::{DescriptorCapability, ServiceDescriptor, ServiceDefinition};
pub use marker::{MarkerCapability, MarkerSpec};
pub use template::{render, render_file, TemplateVars};

use anyhow::{bail, Result};
use std::path::Path;

use crate::artifact::ArtifactKind;

/// Inputs to a capability's analysis step.
#[derive(Debug, Clone)]
pub struct AnalyzeContext<'a> {
    pub project_path: &'a Path,
    pub environment: &'a str,
    pub interactive: bool,
    pub git_repo: &'a str,
    pub git_branch: &'a str,
}

/// State a capability fills in while analyzing a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detected {
    pub language_version: String,
    pub supported_language_versions: Vec<String>,
    pub framework: String,
    pub framework_version: String,
    pub databases: Vec<String>,
    pub start_commands: Vec<String>,
    pub build_commands: Vec<String>,
    pub deploy_commands: Vec<String>,
    /// Non-fatal advisories collected along the way.
    pub messages: Vec<String>,
}

impl Detected {
    /// Record a database once.
    pub fn add_database(&mut self, name: &str) {
        if !self.databases.iter().any(|d| d == name) {
            self.databases.push(name.to_string());
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

/// Contract between the orchestration pipeline and an ecosystem module.
pub trait Capability {
    /// Canonical name; also the image name used for registry enrichment.
    fn name(&self) -> &str;

    /// Whether this capability recognises the project.
    fn detect(&self, project_root: &Path) -> bool;

    /// Artifact kinds this capability already owns in the project, which
    /// are therefore exempt from the overwrite guard.
    fn native_artifacts(&self) -> &[ArtifactKind] {
        &[]
    }

    /// Whether an existing file for `kind` belongs to this capability.
    fn owns(&self, kind: ArtifactKind) -> bool {
        self.native_artifacts().contains(&kind) || self.name() == kind.file_name()
    }

    /// Image whose tags narrow the supported versions, if any.
    fn registry_image(&self) -> Option<String> {
        Some(format!("library/{}", self.name()))
    }

    /// Replace the advertised supported versions.
    fn set_supported_language_versions(&mut self, versions: Vec<String>);

    /// Inspect the project and fill in the detected state.
    fn analyze(&mut self, ctx: &AnalyzeContext<'_>) -> Result<()>;

    /// Write the `Dockerfile`.
    fn write_container_build_file(
        &mut self,
        template_dir: &Path,
        project_path: &Path,
        interactive: bool,
    ) -> Result<()>;

    /// Write `service.yml`.
    fn write_service_descriptor(
        &mut self,
        template_dir: &Path,
        project_path: &Path,
        interactive: bool,
    ) -> Result<()>;

    /// Write `kubernetes.yml`.
    fn write_orchestration_manifest(&mut self, project_path: &Path, interactive: bool) -> Result<()> {
        let _ = (project_path, interactive);
        bail!(
            "{} cannot generate {}; generate it from an existing {}",
            self.name(),
            ArtifactKind::OrchestrationManifest,
            ArtifactKind::ServiceDescriptor
        )
    }

    /// Write `starter.bundle`.
    fn create_deployment_bundle(
        &mut self,
        project_path: &Path,
        template_dir: &Path,
        branch: &str,
    ) -> Result<()> {
        bundle::write_bundle(project_path, template_dir, branch)?;
        Ok(())
    }

    /// Everything detected so far.
    fn detected(&self) -> &Detected;
}

/// The default capability set, in registration order.
pub fn builtin_capabilities() -> Vec<Box<dyn Capability>> {
    let mut capabilities: Vec<Box<dyn Capability>> = vec![
        Box::new(DescriptorCapability::new()),
        Box::new(ComposeCapability::new()),
    ];
    capabilities.extend(
        marker::builtin_specs()
            .into_iter()
            .map(|spec| Box::new(MarkerCapability::new(spec)) as Box<dyn Capability>),
    );
    capabilities
}
