//! Projects that already ship a `docker-compose.yml`.
//!
//! Compose services build from their own Dockerfiles, so this capability
//! owns the container build file natively and only converts the compose
//! file into a `service.yml`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::descriptor::{PortValue, ServiceDefinition, ServiceDescriptor};
use super::{AnalyzeContext, Capability, Detected};
use crate::artifact::ArtifactKind;

const COMPOSE_FILES: &[&str] = &["docker-compose.yml", "docker-compose.yaml"];

/// Image name prefixes that identify a backing database.
const DATABASE_IMAGES: &[(&str, &str)] = &[
    ("mysql", "mysql"),
    ("mariadb", "mysql"),
    ("postgres", "postgresql"),
    ("redis", "redis"),
    ("mongo", "mongodb"),
    ("elasticsearch", "elasticsearch"),
];

#[derive(Debug, Clone, Default, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ComposeService {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    build: Option<BuildSpec>,
    #[serde(default)]
    command: Option<CommandSpec>,
    #[serde(default)]
    ports: Vec<PortValue>,
    #[serde(default)]
    environment: Option<EnvironmentSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum BuildSpec {
    Context(String),
    Detailed {
        #[serde(default)]
        context: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandSpec {
    Shell(String),
    Exec(Vec<String>),
}

impl CommandSpec {
    fn to_command_line(&self) -> String {
        match self {
            CommandSpec::Shell(s) => s.clone(),
            CommandSpec::Exec(parts) => parts.join(" "),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EnvironmentSpec {
    Map(BTreeMap<String, Option<serde_yaml::Value>>),
    List(Vec<String>),
}

impl EnvironmentSpec {
    fn to_map(&self) -> BTreeMap<String, String> {
        match self {
            EnvironmentSpec::Map(map) => map
                .iter()
                .map(|(k, v)| {
                    let value = match v {
                        Some(serde_yaml::Value::String(s)) => s.clone(),
                        Some(serde_yaml::Value::Number(n)) => n.to_string(),
                        Some(serde_yaml::Value::Bool(b)) => b.to_string(),
                        _ => String::new(),
                    };
                    (k.clone(), value)
                })
                .collect(),
            EnvironmentSpec::List(entries) => entries
                .iter()
                .map(|entry| match entry.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (entry.clone(), String::new()),
                })
                .collect(),
        }
    }
}

impl ComposeService {
    fn database(&self) -> Option<&'static str> {
        let image = self.image.as_deref()?;
        let base = image.rsplit('/').next().unwrap_or(image);
        DATABASE_IMAGES
            .iter()
            .find(|(prefix, _)| base.starts_with(prefix))
            .map(|(_, database)| *database)
    }

    fn build_root(&self) -> Option<String> {
        match self.build.as_ref()? {
            BuildSpec::Context(context) => Some(context.clone()),
            BuildSpec::Detailed { context } => Some(context.clone().unwrap_or_else(|| ".".into())),
        }
    }

    /// Published `host:container` ports become `container:host`, so the
    /// host port is exposed as the public http port.
    fn descriptor_ports(&self) -> Vec<PortValue> {
        self.ports
            .iter()
            .map(|port| {
                let text = port.to_string();
                let mut parts: Vec<&str> = text.split(':').collect();
                let container = parts.pop().unwrap_or_default();
                let container = container.split('/').next().unwrap_or(container);
                match parts.pop() {
                    Some(host) => PortValue::Text(format!("{}:{}", container, host)),
                    None => PortValue::Text(container.to_string()),
                }
            })
            .collect()
    }
}

/// Capability for projects with an existing compose file.
#[derive(Debug, Clone, Default)]
pub struct ComposeCapability {
    compose: Option<ComposeFile>,
    git_repo: String,
    git_branch: String,
    detected: Detected,
}

impl ComposeCapability {
    pub fn new() -> Self {
        Self::default()
    }

    fn compose_path(project_root: &Path) -> Option<PathBuf> {
        COMPOSE_FILES
            .iter()
            .map(|name| project_root.join(name))
            .find(|path| path.is_file())
    }

    fn to_descriptor(&self) -> Result<ServiceDescriptor> {
        let Some(compose) = &self.compose else {
            bail!("docker-compose file has not been analyzed");
        };

        let mut descriptor = ServiceDescriptor {
            databases: self.detected.databases.clone(),
            ..ServiceDescriptor::default()
        };

        for (name, service) in &compose.services {
            if service.database().is_some() {
                continue;
            }

            let build_root = service.build_root();
            let git_url = if build_root.is_some() && !self.git_repo.is_empty() {
                Some(self.git_repo.clone())
            } else {
                None
            };
            let git_branch = git_url.as_ref().and_then(|_| {
                (!self.git_branch.is_empty()).then(|| self.git_branch.clone())
            });

            descriptor.services.insert(
                name.clone(),
                ServiceDefinition {
                    image: if build_root.is_some() { None } else { service.image.clone() },
                    git_url,
                    git_branch,
                    build_root,
                    command: service.command.as_ref().map(CommandSpec::to_command_line),
                    ports: service.descriptor_ports(),
                    env_vars: service
                        .environment
                        .as_ref()
                        .map(EnvironmentSpec::to_map)
                        .unwrap_or_default(),
                },
            );
        }

        Ok(descriptor)
    }
}

impl Capability for ComposeCapability {
    fn name(&self) -> &str {
        "docker-compose"
    }

    fn detect(&self, project_root: &Path) -> bool {
        Self::compose_path(project_root).is_some()
    }

    fn native_artifacts(&self) -> &[ArtifactKind] {
        &[ArtifactKind::ContainerBuildFile]
    }

    fn registry_image(&self) -> Option<String> {
        None
    }

    fn set_supported_language_versions(&mut self, versions: Vec<String>) {
        self.detected.supported_language_versions = versions;
    }

    fn analyze(&mut self, ctx: &AnalyzeContext<'_>) -> Result<()> {
        let Some(path) = Self::compose_path(ctx.project_path) else {
            bail!("No docker-compose file in {}", ctx.project_path.display());
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let compose: ComposeFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if compose.services.is_empty() {
            bail!("{} does not define any services", path.display());
        }

        for (name, service) in &compose.services {
            if let Some(database) = service.database() {
                self.detected.add_database(database);
                continue;
            }
            if let Some(command) = &service.command {
                self.detected.start_commands.push(command.to_command_line());
            }
            if service.image.is_none() && service.build.is_none() {
                self.detected
                    .warn(format!("Service '{}' has neither an image nor a build context", name));
            }
        }

        self.git_repo = ctx.git_repo.to_string();
        self.git_branch = ctx.git_branch.to_string();
        self.compose = Some(compose);
        Ok(())
    }

    fn write_container_build_file(
        &mut self,
        _template_dir: &Path,
        _project_path: &Path,
        _interactive: bool,
    ) -> Result<()> {
        tracing::debug!("Compose services build from their own Dockerfiles; nothing to write");
        Ok(())
    }

    fn write_service_descriptor(
        &mut self,
        _template_dir: &Path,
        project_path: &Path,
        _interactive: bool,
    ) -> Result<()> {
        let descriptor = self.to_descriptor()?;
        descriptor.save(&ArtifactKind::ServiceDescriptor.path_in(project_path))
    }

    fn detected(&self) -> &Detected {
        &self.detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const COMPOSE: &str = r#"version: "3.8"
services:
  web:
    build: .
    command: ["bundle", "exec", "puma"]
    ports:
      - "8080:3000"
    environment:
      RAILS_ENV: production
      WORKERS: 2
  db:
    image: postgres:16
  cache:
    image: library/redis:7
"#;

    fn analyze(temp: &TempDir, git_repo: &str) -> ComposeCapability {
        let ctx = AnalyzeContext {
            project_path: temp.path(),
            environment: "production",
            interactive: false,
            git_repo,
            git_branch: "main",
        };
        let mut capability = ComposeCapability::new();
        capability.analyze(&ctx).unwrap();
        capability
    }

    #[test]
    fn detects_both_extensions() {
        let temp = TempDir::new().unwrap();
        let capability = ComposeCapability::new();
        assert!(!capability.detect(temp.path()));

        fs::write(temp.path().join("docker-compose.yaml"), COMPOSE).unwrap();
        assert!(capability.detect(temp.path()));
    }

    #[test]
    fn analyze_separates_databases_from_services() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("docker-compose.yml"), COMPOSE).unwrap();

        let capability = analyze(&temp, "");
        let detected = capability.detected();
        assert_eq!(detected.databases, vec!["redis", "postgresql"]);
        assert_eq!(detected.start_commands, vec!["bundle exec puma"]);
        assert!(detected.messages.is_empty());
    }

    #[test]
    fn analyze_rejects_empty_compose() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("docker-compose.yml"), "version: '3'\n").unwrap();

        let ctx = AnalyzeContext {
            project_path: temp.path(),
            environment: "production",
            interactive: false,
            git_repo: "",
            git_branch: "",
        };
        let err = ComposeCapability::new().analyze(&ctx).unwrap_err();
        assert!(err.to_string().contains("does not define any services"));
    }

    #[test]
    fn converts_to_service_yml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("docker-compose.yml"), COMPOSE).unwrap();

        let mut capability = analyze(&temp, "https://github.com/acme/shop.git");
        capability
            .write_service_descriptor(temp.path(), temp.path(), false)
            .unwrap();

        let descriptor = ServiceDescriptor::load(&temp.path().join("service.yml")).unwrap();
        assert_eq!(descriptor.services.len(), 1);
        assert_eq!(descriptor.databases, vec!["redis", "postgresql"]);

        let web = &descriptor.services["web"];
        assert_eq!(web.build_root.as_deref(), Some("."));
        assert_eq!(web.git_url.as_deref(), Some("https://github.com/acme/shop.git"));
        assert_eq!(web.git_branch.as_deref(), Some("main"));
        assert_eq!(web.command.as_deref(), Some("bundle exec puma"));
        assert_eq!(web.ports, vec![PortValue::Text("3000:8080".to_string())]);
        assert_eq!(web.env_vars["WORKERS"], "2");
    }

    #[test]
    fn dockerfile_step_writes_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("docker-compose.yml"), COMPOSE).unwrap();

        let mut capability = analyze(&temp, "");
        capability
            .write_container_build_file(temp.path(), temp.path(), false)
            .unwrap();
        assert!(!temp.path().join("Dockerfile").exists());
    }

    #[test]
    fn environment_list_form_is_supported() {
        let env: EnvironmentSpec = serde_yaml::from_str("[\"A=1\", \"B\"]").unwrap();
        let map = env.to_map();
        assert_eq!(map["A"], "1");
        assert_eq!(map["B"], "");
    }
}
