//! Artifact kinds and the generator selection.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the files shipkit can generate.
///
/// Variants are declared in generation order, so iterating an
/// [`ArtifactSet`] visits them in the order the pipeline renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// `Dockerfile`
    ContainerBuildFile,
    /// `service.yml`
    ServiceDescriptor,
    /// `kubernetes.yml`
    OrchestrationManifest,
    /// `starter.bundle`
    DeploymentBundle,
}

impl ArtifactKind {
    /// All kinds, in generation order.
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::ContainerBuildFile,
        ArtifactKind::ServiceDescriptor,
        ArtifactKind::OrchestrationManifest,
        ArtifactKind::DeploymentBundle,
    ];

    /// Canonical file name, relative to the project root.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::ContainerBuildFile => "Dockerfile",
            Self::ServiceDescriptor => "service.yml",
            Self::OrchestrationManifest => "kubernetes.yml",
            Self::DeploymentBundle => "starter.bundle",
        }
    }

    /// Token used by the `--generator` flag.
    pub fn generator_token(&self) -> &'static str {
        match self {
            Self::ContainerBuildFile => "dockerfile",
            Self::ServiceDescriptor => "service",
            Self::OrchestrationManifest => "kube",
            Self::DeploymentBundle => "skycap",
        }
    }

    /// Destination path of this artifact inside a project.
    pub fn path_in(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.file_name())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dockerfile" => Ok(Self::ContainerBuildFile),
            "service" | "service.yml" => Ok(Self::ServiceDescriptor),
            "kube" | "kubernetes" => Ok(Self::OrchestrationManifest),
            "skycap" | "bundle" => Ok(Self::DeploymentBundle),
            other => Err(format!(
                "unknown generator '{}' (expected dockerfile, service, kube or skycap)",
                other
            )),
        }
    }
}

/// The set of artifacts requested for one analysis.
///
/// The container build file is always part of the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ArtifactKind>")]
pub struct ArtifactSet(BTreeSet<ArtifactKind>);

impl ArtifactSet {
    /// A set containing only the container build file.
    pub fn new() -> Self {
        Self(BTreeSet::from([ArtifactKind::ContainerBuildFile]))
    }

    /// Build a set from the given kinds (plus the container build file).
    pub fn from_kinds(kinds: impl IntoIterator<Item = ArtifactKind>) -> Self {
        let mut set = Self::new();
        set.0.extend(kinds);
        set
    }

    /// Parse a comma-separated generator list such as `dockerfile,service`.
    pub fn parse_generator(list: &str) -> Result<Self, String> {
        let kinds = list
            .split(',')
            .filter(|token| !token.trim().is_empty())
            .map(ArtifactKind::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_kinds(kinds))
    }

    /// Add a kind to the set.
    pub fn insert(&mut self, kind: ArtifactKind) {
        self.0.insert(kind);
    }

    /// Whether the kind was requested.
    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.0.contains(&kind)
    }

    /// Iterate in generation order.
    pub fn iter(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ArtifactSet {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<ArtifactKind>> for ArtifactSet {
    fn from(kinds: Vec<ArtifactKind>) -> Self {
        Self::from_kinds(kinds)
    }
}

impl FromStr for ArtifactSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_generator(s)
    }
}
