//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct. Running `shipkit` without a
//! subcommand analyzes the project at `--path`.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::artifact::ArtifactSet;
use crate::request::{AnalysisRequest, TemplateSource, DEFAULT_BRANCH, DEFAULT_ENVIRONMENT};
use crate::updates::STABLE_CHANNEL;

/// shipkit - Dockerfiles, service descriptors and deployment manifests for
/// your project.
#[derive(Debug, Parser)]
#[command(name = "shipkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Artifacts to generate: dockerfile, service, kube, skycap (comma-separated)
    #[arg(short, long, default_value = "dockerfile", value_name = "LIST")]
    pub generator: ArtifactSet,

    /// Project path (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Do not prompt; pick defaults
    #[arg(short = 'y', long)]
    pub no_prompt: bool,

    /// Overwrite existing files
    #[arg(long)]
    pub overwrite: bool,

    /// Deployment environment
    #[arg(short, long, default_value = DEFAULT_ENVIRONMENT, value_name = "NAME")]
    pub environment: String,

    /// Use templates from a local directory instead of downloading them
    #[arg(long, value_name = "DIR", env = "SHIPKIT_TEMPLATES")]
    pub templates: Option<PathBuf>,

    /// Template branch to download [default: master]
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Check base image versions against the image registry
    #[arg(long)]
    pub registry: bool,

    /// Run as a daemon
    #[arg(long)]
    pub daemon: bool,

    /// Daemon configuration file
    #[arg(short, long, value_name = "FILE", requires = "daemon")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the shipkit version
    Version,

    /// Check for a newer shipkit release
    Update(UpdateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `update` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UpdateArgs {
    /// Release channel
    #[arg(long, default_value = STABLE_CHANNEL)]
    pub channel: String,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl Cli {
    /// Build the analysis request described by the flags.
    pub fn analysis_request(&self, project_root: PathBuf) -> AnalysisRequest {
        let templates = match &self.templates {
            Some(dir) => TemplateSource::Local(dir.clone()),
            None => TemplateSource::Remote,
        };

        AnalysisRequest::new(project_root)
            .with_environment(self.environment.as_str())
            .unattended(self.no_prompt)
            .allow_overwrite(self.overwrite)
            .with_artifacts(self.generator.clone())
            .use_registry(self.registry)
            .with_templates(templates)
            .with_branch(self.branch.as_deref().unwrap_or(DEFAULT_BRANCH))
    }
}
