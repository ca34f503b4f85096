//! Language stacks recognised by marker files.
//!
//! Each stack is described by a [`MarkerSpec`]: which files identify it,
//! where its version is declared, which frameworks it knows about, and how
//! the application starts. A single [`MarkerCapability`] type interprets
//! every spec, so adding a stack means adding data, not code.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{LazyLock, Mutex, PoisonError};

use super::template::{render, render_file, TemplateVars};
use super::{AnalyzeContext, Capability, Detected};
use crate::artifact::ArtifactKind;

/// Where a language version may be declared.
#[derive(Debug, Clone, Copy)]
pub struct VersionSource {
    pub file: &'static str,
    /// Regex whose first capture group is the version.
    pub pattern: &'static str,
    /// The file exists only to pin a version, so failing to read one is
    /// worth reporting.
    pub dedicated: bool,
}

/// A framework recognised inside one of the stack's manifests.
#[derive(Debug, Clone, Copy)]
pub struct FrameworkHint {
    pub name: &'static str,
    pub files: &'static [&'static str],
    /// Regex matching the dependency; an optional first capture group is
    /// the framework version.
    pub pattern: &'static str,
    pub start_command: &'static str,
}

/// Static description of a language stack.
#[derive(Debug, Clone, Copy)]
pub struct MarkerSpec {
    pub name: &'static str,
    pub markers: &'static [&'static str],
    pub default_version: &'static str,
    pub supported_versions: &'static [&'static str],
    pub version_sources: &'static [VersionSource],
    pub frameworks: &'static [FrameworkHint],
    /// Files scanned for database client libraries.
    pub dependency_files: &'static [&'static str],
    pub start_command: &'static str,
}

/// Database client libraries, matched case-insensitively.
const DATABASE_HINTS: &[(&str, &str)] = &[
    (
        "mysql",
        r"(?i)\bmysql2?\b|\bmysqlclient\b|\bpymysql\b|go-sql-driver/mysql|\bmyxql\b",
    ),
    (
        "postgresql",
        r"(?i)\bpg\b|\bpsycopg2?\b|\bpostgres(ql)?\b|lib/pq\b|jackc/pgx|\bpostgrex\b",
    ),
    ("redis", r"(?i)\bredis\b|\bioredis\b|\bredix\b"),
    ("mongodb", r"(?i)\bmongo(db|id|ose)?\b"),
    ("elasticsearch", r"(?i)\belasticsearch\b"),
];

// Compiled once per process, keyed by pattern text.
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn compiled(pattern: &'static str) -> Result<Regex> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern).with_context(|| format!("Invalid pattern {}", pattern))?;
    cache.insert(pattern, regex.clone());
    Ok(regex)
}

/// The stacks shipkit recognises out of the box, in registration order.
pub fn builtin_specs() -> Vec<MarkerSpec> {
    vec![
        MarkerSpec {
            name: "ruby",
            markers: &["Gemfile"],
            default_version: "3.3",
            supported_versions: &["3.1", "3.2", "3.3"],
            version_sources: &[
                VersionSource {
                    file: ".ruby-version",
                    pattern: r"(\d+\.\d+(?:\.\d+)?)",
                    dedicated: true,
                },
                VersionSource {
                    file: "Gemfile",
                    pattern: r#"(?m)^\s*ruby\s+['"](\d+\.\d+(?:\.\d+)?)['"]"#,
                    dedicated: false,
                },
            ],
            frameworks: &[
                FrameworkHint {
                    name: "rails",
                    files: &["Gemfile"],
                    pattern: r#"gem\s+['"]rails['"](?:\s*,\s*['"][~><=\s]*(\d+(?:\.\d+)*)['"])?"#,
                    start_command: "bundle exec rails server -b 0.0.0.0 -e ${environment}",
                },
                FrameworkHint {
                    name: "sinatra",
                    files: &["Gemfile"],
                    pattern: r#"gem\s+['"]sinatra['"](?:\s*,\s*['"][~><=\s]*(\d+(?:\.\d+)*)['"])?"#,
                    start_command: "bundle exec rackup -o 0.0.0.0",
                },
            ],
            dependency_files: &["Gemfile", "Gemfile.lock"],
            start_command: "bundle exec ruby app.rb",
        },
        MarkerSpec {
            name: "node",
            markers: &["package.json"],
            default_version: "20",
            supported_versions: &["18", "20", "22"],
            version_sources: &[
                VersionSource {
                    file: ".nvmrc",
                    pattern: r"v?(\d+(?:\.\d+){0,2})",
                    dedicated: true,
                },
                VersionSource {
                    file: ".node-version",
                    pattern: r"v?(\d+(?:\.\d+){0,2})",
                    dedicated: true,
                },
                VersionSource {
                    file: "package.json",
                    pattern: r#""node"\s*:\s*"[\^~>=\s]*(\d+(?:\.\d+){0,2})"#,
                    dedicated: false,
                },
            ],
            frameworks: &[
                FrameworkHint {
                    name: "next",
                    files: &["package.json"],
                    pattern: r#""next"\s*:\s*"[\^~]?(\d+(?:\.\d+)*)?"#,
                    start_command: "npm run start",
                },
                FrameworkHint {
                    name: "express",
                    files: &["package.json"],
                    pattern: r#""express"\s*:\s*"[\^~]?(\d+(?:\.\d+)*)?"#,
                    start_command: "npm start",
                },
            ],
            dependency_files: &["package.json"],
            start_command: "npm start",
        },
        MarkerSpec {
            name: "python",
            markers: &["requirements.txt", "pyproject.toml", "Pipfile", "setup.py"],
            default_version: "3.12",
            supported_versions: &["3.10", "3.11", "3.12"],
            version_sources: &[
                VersionSource {
                    file: ".python-version",
                    pattern: r"(\d+\.\d+(?:\.\d+)?)",
                    dedicated: true,
                },
                VersionSource {
                    file: "runtime.txt",
                    pattern: r"python-(\d+\.\d+(?:\.\d+)?)",
                    dedicated: true,
                },
            ],
            frameworks: &[
                FrameworkHint {
                    name: "django",
                    files: &["requirements.txt", "pyproject.toml", "Pipfile"],
                    pattern: r#"(?im)^\s*"?django\b(?:\s*[=~><]=?\s*(\d+(?:\.\d+)*))?"#,
                    start_command: "python manage.py runserver 0.0.0.0:8000",
                },
                FrameworkHint {
                    name: "flask",
                    files: &["requirements.txt", "pyproject.toml", "Pipfile"],
                    pattern: r#"(?im)^\s*"?flask\b(?:\s*[=~><]=?\s*(\d+(?:\.\d+)*))?"#,
                    start_command: "flask run --host=0.0.0.0",
                },
            ],
            dependency_files: &["requirements.txt", "pyproject.toml", "Pipfile"],
            start_command: "python app.py",
        },
        MarkerSpec {
            name: "golang",
            markers: &["go.mod"],
            default_version: "1.22",
            supported_versions: &["1.21", "1.22", "1.23"],
            version_sources: &[VersionSource {
                file: "go.mod",
                pattern: r"(?m)^go\s+(\d+\.\d+(?:\.\d+)?)",
                dedicated: false,
            }],
            frameworks: &[
                FrameworkHint {
                    name: "gin",
                    files: &["go.mod"],
                    pattern: r"github\.com/gin-gonic/gin\s+v(\d+(?:\.\d+)*)",
                    start_command: "/app/main",
                },
                FrameworkHint {
                    name: "echo",
                    files: &["go.mod"],
                    pattern: r"github\.com/labstack/echo(?:/v\d+)?\s+v(\d+(?:\.\d+)*)",
                    start_command: "/app/main",
                },
            ],
            dependency_files: &["go.mod"],
            start_command: "/app/main",
        },
        MarkerSpec {
            name: "php",
            markers: &["composer.json"],
            default_version: "8.3",
            supported_versions: &["8.1", "8.2", "8.3"],
            version_sources: &[VersionSource {
                file: "composer.json",
                pattern: r#""php"\s*:\s*"[\^~>=\s]*(\d+\.\d+(?:\.\d+)?)"#,
                dedicated: false,
            }],
            frameworks: &[
                FrameworkHint {
                    name: "laravel",
                    files: &["composer.json"],
                    pattern: r#""laravel/framework"\s*:\s*"[\^~]?(\d+(?:\.\d+)*)?"#,
                    start_command: "php artisan serve --host=0.0.0.0",
                },
                FrameworkHint {
                    name: "symfony",
                    files: &["composer.json"],
                    pattern: r#""symfony/framework-bundle"\s*:\s*"[\^~]?(\d+(?:\.\d+)*)?"#,
                    start_command: "php -S 0.0.0.0:8000 -t public",
                },
            ],
            dependency_files: &["composer.json", "composer.lock"],
            start_command: "php -S 0.0.0.0:8000",
        },
        MarkerSpec {
            name: "elixir",
            markers: &["mix.exs"],
            default_version: "1.16",
            supported_versions: &["1.15", "1.16", "1.17"],
            version_sources: &[
                VersionSource {
                    file: ".tool-versions",
                    pattern: r"(?m)^elixir\s+(\d+\.\d+(?:\.\d+)?)",
                    dedicated: false,
                },
                VersionSource {
                    file: "mix.exs",
                    pattern: r#"elixir:\s*"~>\s*(\d+\.\d+(?:\.\d+)?)"#,
                    dedicated: false,
                },
            ],
            frameworks: &[FrameworkHint {
                name: "phoenix",
                files: &["mix.exs"],
                pattern: r#"\{:phoenix,\s*"~>\s*(\d+(?:\.\d+)*)"#,
                start_command: "mix phx.server",
            }],
            dependency_files: &["mix.exs", "mix.lock"],
            start_command: "mix run --no-halt",
        },
    ]
}

/// A language stack capability driven by a [`MarkerSpec`].
#[derive(Debug, Clone)]
pub struct MarkerCapability {
    spec: MarkerSpec,
    environment: String,
    detected: Detected,
}

impl MarkerCapability {
    pub fn new(spec: MarkerSpec) -> Self {
        let detected = Detected {
            supported_language_versions: spec
                .supported_versions
                .iter()
                .map(|v| v.to_string())
                .collect(),
            ..Detected::default()
        };

        Self {
            spec,
            environment: String::new(),
            detected,
        }
    }

    pub fn spec(&self) -> &MarkerSpec {
        &self.spec
    }

    fn detect_version(&mut self, project: &Path) -> Result<()> {
        for source in self.spec.version_sources {
            let Some(content) = read_optional(project, source.file) else {
                continue;
            };

            let pattern = compiled(source.pattern)?;
            if let Some(version) = pattern.captures(&content).and_then(|c| c.get(1)) {
                self.detected.language_version = version.as_str().to_string();
                return Ok(());
            }

            if source.dedicated {
                self.detected.warn(format!(
                    "Found {} but could not read a {} version from it; using {}",
                    source.file, self.spec.name, self.spec.default_version
                ));
            }
        }

        self.detected.language_version = self.spec.default_version.to_string();
        Ok(())
    }

    fn detect_framework(&mut self, project: &Path) -> Result<Option<&'static str>> {
        for hint in self.spec.frameworks {
            let pattern = compiled(hint.pattern)?;
            for file in hint.files {
                let Some(content) = read_optional(project, file) else {
                    continue;
                };
                if let Some(captures) = pattern.captures(&content) {
                    self.detected.framework = hint.name.to_string();
                    self.detected.framework_version = captures
                        .get(1)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    return Ok(Some(hint.start_command));
                }
            }
        }
        Ok(None)
    }

    fn detect_databases(&mut self, project: &Path) -> Result<()> {
        let contents: Vec<String> = self
            .spec
            .dependency_files
            .iter()
            .filter_map(|file| read_optional(project, file))
            .collect();

        for (database, pattern) in DATABASE_HINTS {
            let pattern = compiled(pattern)?;
            if contents.iter().any(|c| pattern.is_match(c)) {
                self.detected.add_database(database);
            }
        }
        Ok(())
    }

    fn check_supported_version(&mut self) {
        let version = &self.detected.language_version;
        let supported = &self.detected.supported_language_versions;
        if supported.is_empty() || supported.iter().any(|s| versions_match(s, version)) {
            return;
        }

        let message = format!(
            "{} {} is not a supported base image version",
            self.spec.name, version
        );
        self.detected.warn(message);
    }

    fn template_vars(&self, project: &Path) -> TemplateVars {
        let project_name = project
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());

        TemplateVars::new()
            .with("language", self.spec.name)
            .with("language_version", self.detected.language_version.as_str())
            .with("framework", self.detected.framework.as_str())
            .with("framework_version", self.detected.framework_version.as_str())
            .with("environment", self.environment.as_str())
            .with(
                "start_command",
                self.detected
                    .start_commands
                    .first()
                    .cloned()
                    .unwrap_or_default(),
            )
            .with("databases", self.detected.databases.join(","))
            .with("project_name", project_name)
    }

    fn write_from_template(
        &self,
        template_dir: &Path,
        suffix: &str,
        project_path: &Path,
        kind: ArtifactKind,
    ) -> Result<()> {
        let template = template_dir.join(format!("{}.{}", self.spec.name, suffix));
        let content = render_file(&template, &self.template_vars(project_path))?;
        let destination = kind.path_in(project_path);
        fs::write(&destination, content)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        tracing::debug!("Wrote {}", destination.display());
        Ok(())
    }
}

impl Capability for MarkerCapability {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn detect(&self, project_root: &Path) -> bool {
        self.spec
            .markers
            .iter()
            .any(|marker| project_root.join(marker).is_file())
    }

    fn set_supported_language_versions(&mut self, versions: Vec<String>) {
        self.detected.supported_language_versions = versions;
    }

    fn analyze(&mut self, ctx: &AnalyzeContext<'_>) -> Result<()> {
        self.environment = ctx.environment.to_string();
        self.detect_version(ctx.project_path)?;
        let start = self
            .detect_framework(ctx.project_path)?
            .unwrap_or(self.spec.start_command);
        self.detect_databases(ctx.project_path)?;
        self.check_supported_version();

        let vars = TemplateVars::new().with("environment", ctx.environment);
        self.detected.start_commands = vec![render(start, &vars)?];

        tracing::debug!(
            "Analyzed {} project: version {}, framework '{}'",
            self.spec.name,
            self.detected.language_version,
            self.detected.framework
        );
        Ok(())
    }

    fn write_container_build_file(
        &mut self,
        template_dir: &Path,
        project_path: &Path,
        _interactive: bool,
    ) -> Result<()> {
        self.write_from_template(
            template_dir,
            "dockerfile.template",
            project_path,
            ArtifactKind::ContainerBuildFile,
        )
    }

    fn write_service_descriptor(
        &mut self,
        template_dir: &Path,
        project_path: &Path,
        _interactive: bool,
    ) -> Result<()> {
        self.write_from_template(
            template_dir,
            "service.yml.template",
            project_path,
            ArtifactKind::ServiceDescriptor,
        )
    }

    fn detected(&self) -> &Detected {
        &self.detected
    }
}

fn read_optional(project: &Path, file: &str) -> Option<String> {
    fs::read_to_string(project.join(file)).ok()
}

/// `3.3` matches `3.3.1` and vice versa; `3.3` does not match `3.31`.
fn versions_match(a: &str, b: &str) -> bool {
    a == b || a.starts_with(&format!("{}.", b)) || b.starts_with(&format!("{}.", a))
}
