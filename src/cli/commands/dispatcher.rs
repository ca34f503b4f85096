//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI invocations

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::UserInterface;

use super::analyze::AnalyzeCommand;
use super::completions::CompletionsCommand;
use super::daemon::DaemonCommand;
use super::update::UpdateCommand;
use super::version::VersionCommand;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI invocations to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Without a subcommand, `--daemon` starts the daemon and anything else
    /// analyzes the project.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Version) => VersionCommand.execute(ui),
            Some(Commands::Update(args)) => UpdateCommand::new(args.clone()).execute(ui),
            Some(Commands::Completions(args)) => CompletionsCommand::new(args.clone()).execute(ui),
            None if cli.daemon => DaemonCommand::from_cli(cli).execute(ui),
            None => {
                let request = cli.analysis_request(self.project_root.clone());
                AnalyzeCommand::new(request).execute(ui)
            }
        }
    }
}
