//! Entry point shared by the CLI and the daemon.

use std::path::{Path, PathBuf};

use super::generate::generate;
use super::result::AnalysisResult;
use crate::artifact::ArtifactKind;
use crate::detection::{choose, ConflictGuard, DetectionRunner};
use crate::error::{Result, ShipkitError};
use crate::registry::{enrich, RegistryClient, DEFAULT_REGISTRY};
use crate::request::AnalysisRequest;
use crate::templates::{default_cache_dir, TemplateManager, DEFAULT_MANIFEST_URL};
use crate::ui::UserInterface;

/// Long-lived settings for running analyses.
///
/// Holds only where templates and registry data come from; everything
/// specific to one run lives in the [`AnalysisRequest`].
#[derive(Debug, Clone)]
pub struct Orchestrator {
    cache_dir: PathBuf,
    manifest_url: String,
    registry_endpoint: String,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl Orchestrator {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            registry_endpoint: DEFAULT_REGISTRY.to_string(),
        }
    }

    /// Override the manifest URL. `{branch}` is replaced per request.
    pub fn with_manifest_url(mut self, pattern: impl Into<String>) -> Self {
        self.manifest_url = pattern.into();
        self
    }

    pub fn with_registry(mut self, endpoint: impl Into<String>) -> Self {
        self.registry_endpoint = endpoint.into();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn registry_endpoint(&self) -> &str {
        &self.registry_endpoint
    }

    /// Run one analysis with the built-in capabilities.
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        ui: &mut dyn UserInterface,
    ) -> Result<AnalysisResult> {
        self.analyze_with(request, DetectionRunner::builtin(), ui)
    }

    /// Run one analysis with an explicit capability set.
    pub fn analyze_with(
        &self,
        request: &AnalysisRequest,
        runner: DetectionRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<AnalysisResult> {
        let project = request.project_path();
        if !project.is_dir() {
            return Err(ShipkitError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Project path {} does not exist", project.display()),
            )));
        }

        let templates = TemplateManager::for_branch(
            &self.cache_dir,
            &self.manifest_url,
            &request.template_branch,
        )
        .locate(&request.template_source)?;

        let mut capability = if request.wants(ArtifactKind::OrchestrationManifest) {
            runner.detect_descriptor(project)?
        } else {
            choose(runner.detect(project), request.unattended, project, ui)?
        };
        tracing::info!("Using {} for {}", capability.name(), project.display());

        let guard = ConflictGuard::new(request.allow_overwrite);
        guard.check(project, &request.artifacts, capability.as_ref())?;

        if request.use_registry {
            let client = RegistryClient::new(self.registry_endpoint.as_str());
            enrich(capability.as_mut(), &client)?;
        }

        generate(capability.as_mut(), request, &templates.dir, &guard)?;

        Ok(AnalysisResult::from_capability(capability.as_ref()))
    }
}
