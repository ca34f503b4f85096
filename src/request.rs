//! The per-invocation analysis request.
//!
//! An [`AnalysisRequest`] is built once by the CLI or the daemon and passed
//! by reference through every pipeline stage. Nothing downstream reads
//! process-wide state.

use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactKind, ArtifactSet};

/// Default template branch in the remote repository.
pub const DEFAULT_BRANCH: &str = "master";

/// Default deployment environment name.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Where templates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Fetch the manifest and keep the local cache up to date.
    Remote,
    /// Trusted local directory; no network activity.
    Local(PathBuf),
}

/// Everything one analysis needs to know.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub project_path: PathBuf,
    pub environment: String,
    pub unattended: bool,
    pub allow_overwrite: bool,
    pub artifacts: ArtifactSet,
    pub use_registry: bool,
    pub template_source: TemplateSource,
    /// Branch used for the remote manifest URL and recorded in bundles.
    pub template_branch: String,
    /// Repository hints handed to the capability's analysis step.
    pub git_repo: String,
    pub git_branch: String,
}

impl AnalysisRequest {
    /// Create a request for a project with default settings.
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            unattended: false,
            allow_overwrite: false,
            artifacts: ArtifactSet::new(),
            use_registry: false,
            template_source: TemplateSource::Remote,
            template_branch: DEFAULT_BRANCH.to_string(),
            git_repo: String::new(),
            git_branch: String::new(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn unattended(mut self, unattended: bool) -> Self {
        self.unattended = unattended;
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn with_artifacts(mut self, artifacts: ArtifactSet) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn use_registry(mut self, enabled: bool) -> Self {
        self.use_registry = enabled;
        self
    }

    pub fn with_templates(mut self, source: TemplateSource) -> Self {
        self.template_source = source;
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.template_branch = branch.into();
        self
    }

    pub fn with_git(mut self, repo: impl Into<String>, branch: impl Into<String>) -> Self {
        self.git_repo = repo.into();
        self.git_branch = branch.into();
        self
    }

    /// Whether capabilities may prompt the user.
    pub fn interactive(&self) -> bool {
        !self.unattended
    }

    /// Whether the given artifact was requested.
    pub fn wants(&self, kind: ArtifactKind) -> bool {
        self.artifacts.contains(kind)
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}
