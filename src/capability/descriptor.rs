//! Projects that already ship a `service.yml`.
//!
//! The descriptor is imported as-is. It is never re-rendered, and it is the
//! only source shipkit accepts for generating `kubernetes.yml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use super::{kube, AnalyzeContext, Capability, Detected};
use crate::artifact::ArtifactKind;

/// Parsed `service.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub databases: Vec<String>,
}

/// One service in a `service.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,
}

/// A port entry, written either as a bare number or as
/// `container[:http[:https]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(n) => write!(f, "{}", n),
            PortValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A port entry split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container: u16,
    pub http: Option<u16>,
    pub https: Option<u16>,
}

impl PortMapping {
    pub fn parse(value: &PortValue) -> Result<Self> {
        let text = value.to_string();
        let mut parts = text.split(':').map(|p| p.trim());

        let parse_part = |part: &str| -> Result<u16> {
            part.parse::<u16>()
                .with_context(|| format!("Invalid port '{}' in '{}'", part, text))
        };

        let container = parse_part(parts.next().unwrap_or_default())?;
        let http = match parts.next() {
            Some(p) if !p.is_empty() => Some(parse_part(p)?),
            _ => None,
        };
        let https = match parts.next() {
            Some(p) if !p.is_empty() => Some(parse_part(p)?),
            _ => None,
        };

        Ok(Self {
            container,
            http,
            https,
        })
    }
}

impl ServiceDescriptor {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Capability for projects with an existing `service.yml`.
#[derive(Debug, Clone, Default)]
pub struct DescriptorCapability {
    descriptor: Option<ServiceDescriptor>,
    detected: Detected,
}

impl DescriptorCapability {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&mut self, project_path: &Path) -> Result<&ServiceDescriptor> {
        if self.descriptor.is_none() {
            let path = ArtifactKind::ServiceDescriptor.path_in(project_path);
            self.descriptor = Some(ServiceDescriptor::load(&path)?);
        }
        Ok(self.descriptor.get_or_insert_with(ServiceDescriptor::default))
    }
}

impl Capability for DescriptorCapability {
    fn name(&self) -> &str {
        ArtifactKind::ServiceDescriptor.file_name()
    }

    fn detect(&self, project_root: &Path) -> bool {
        ArtifactKind::ServiceDescriptor.path_in(project_root).is_file()
    }

    fn native_artifacts(&self) -> &[ArtifactKind] {
        &[ArtifactKind::ContainerBuildFile, ArtifactKind::ServiceDescriptor]
    }

    fn registry_image(&self) -> Option<String> {
        None
    }

    fn set_supported_language_versions(&mut self, versions: Vec<String>) {
        self.detected.supported_language_versions = versions;
    }

    fn analyze(&mut self, ctx: &AnalyzeContext<'_>) -> Result<()> {
        let descriptor = self.load(ctx.project_path)?.clone();

        for database in &descriptor.databases {
            self.detected.add_database(database);
        }

        for (name, service) in &descriptor.services {
            if let Some(command) = &service.command {
                self.detected.start_commands.push(command.clone());
            }
            if service.image.is_none() && service.git_url.is_none() && service.build_root.is_none() {
                self.detected
                    .warn(format!("Service '{}' has no image, git_url or build_root", name));
            }
        }

        if descriptor.services.is_empty() {
            self.detected.warn("service.yml does not define any services");
        }

        Ok(())
    }

    fn write_container_build_file(
        &mut self,
        _template_dir: &Path,
        _project_path: &Path,
        _interactive: bool,
    ) -> Result<()> {
        tracing::debug!("service.yml projects build from their own sources; no Dockerfile written");
        Ok(())
    }

    fn write_service_descriptor(
        &mut self,
        _template_dir: &Path,
        _project_path: &Path,
        _interactive: bool,
    ) -> Result<()> {
        tracing::debug!("Keeping existing service.yml");
        Ok(())
    }

    fn write_orchestration_manifest(&mut self, project_path: &Path, _interactive: bool) -> Result<()> {
        let manifest = kube::render_manifest(self.load(project_path)?)?;
        let destination = ArtifactKind::OrchestrationManifest.path_in(project_path);
        fs::write(&destination, manifest)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        tracing::debug!("Wrote {}", destination.display());
        Ok(())
    }

    fn detected(&self) -> &Detected {
        &self.detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERVICE_YML: &str = r#"services:
  web:
    git_url: https://github.com/acme/shop.git
    git_branch: main
    command: bundle exec rails server
    build_root: .
    ports: ["3000:80:443"]
    env_vars:
      RAILS_ENV: production
  worker:
    image: acme/worker:1.0
    command: bundle exec sidekiq
databases:
  - postgresql
  - redis
"#;

    fn context(path: &Path) -> AnalyzeContext<'_> {
        AnalyzeContext {
            project_path: path,
            environment: "production",
            interactive: false,
            git_repo: "",
            git_branch: "",
        }
    }

    #[test]
    fn parses_service_yml() {
        let descriptor: ServiceDescriptor = serde_yaml::from_str(SERVICE_YML).unwrap();
        assert_eq!(descriptor.services.len(), 2);
        assert_eq!(descriptor.databases, vec!["postgresql", "redis"]);

        let web = &descriptor.services["web"];
        assert_eq!(web.ports, vec![PortValue::Text("3000:80:443".to_string())]);
        assert_eq!(web.env_vars["RAILS_ENV"], "production");
    }

    #[test]
    fn port_mapping_parses_all_forms() {
        let full = PortMapping::parse(&PortValue::Text("3000:80:443".into())).unwrap();
        assert_eq!(full.container, 3000);
        assert_eq!(full.http, Some(80));
        assert_eq!(full.https, Some(443));

        let https_only = PortMapping::parse(&PortValue::Text("8080::443".into())).unwrap();
        assert_eq!(https_only.http, None);
        assert_eq!(https_only.https, Some(443));

        let bare = PortMapping::parse(&PortValue::Number(5000)).unwrap();
        assert_eq!(bare.container, 5000);
        assert_eq!(bare.http, None);

        assert!(PortMapping::parse(&PortValue::Text("web".into())).is_err());
    }

    #[test]
    fn detects_only_with_service_yml() {
        let temp = TempDir::new().unwrap();
        let capability = DescriptorCapability::new();
        assert!(!capability.detect(temp.path()));

        fs::write(temp.path().join("service.yml"), SERVICE_YML).unwrap();
        assert!(capability.detect(temp.path()));
    }

    #[test]
    fn analyze_collects_databases_and_commands() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("service.yml"), SERVICE_YML).unwrap();

        let mut capability = DescriptorCapability::new();
        capability.analyze(&context(temp.path())).unwrap();

        let detected = capability.detected();
        assert_eq!(detected.databases, vec!["postgresql", "redis"]);
        assert_eq!(
            detected.start_commands,
            vec!["bundle exec rails server", "bundle exec sidekiq"]
        );
        assert!(detected.messages.is_empty());
    }

    #[test]
    fn analyze_fails_on_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("service.yml"), "services: [unclosed").unwrap();

        let mut capability = DescriptorCapability::new();
        let err = capability.analyze(&context(temp.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn writes_orchestration_manifest_and_leaves_descriptor_alone() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("service.yml"), SERVICE_YML).unwrap();

        let mut capability = DescriptorCapability::new();
        capability.analyze(&context(temp.path())).unwrap();
        capability
            .write_service_descriptor(temp.path(), temp.path(), false)
            .unwrap();
        capability
            .write_orchestration_manifest(temp.path(), false)
            .unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("service.yml")).unwrap(),
            SERVICE_YML
        );
        let manifest = fs::read_to_string(temp.path().join("kubernetes.yml")).unwrap();
        assert!(manifest.contains("kind: Deployment"));
        assert!(manifest.contains("acme/worker:1.0"));
    }

    #[test]
    fn save_round_trips_through_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("service.yml");
        let descriptor: ServiceDescriptor = serde_yaml::from_str(SERVICE_YML).unwrap();

        descriptor.save(&path).unwrap();
        assert_eq!(ServiceDescriptor::load(&path).unwrap(), descriptor);
    }
}
