//! `shipkit --daemon` - serve analyses over TCP.

use std::path::PathBuf;

use crate::cli::args::Cli;
use crate::daemon::{Daemon, DaemonConfig};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct DaemonCommand {
    config_path: Option<PathBuf>,
    templates: Option<PathBuf>,
    branch: Option<String>,
    registry: bool,
}

impl DaemonCommand {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone(),
            templates: cli.templates.clone(),
            branch: cli.branch.clone(),
            registry: cli.registry,
        }
    }

    /// Config file values, with `--templates`, `--branch` and `--registry` on top.
    pub fn load_config(&self) -> Result<DaemonConfig> {
        let mut config = match &self.config_path {
            Some(path) => DaemonConfig::load(path)?,
            None => DaemonConfig::default(),
        };
        if self.templates.is_some() {
            config.templates = self.templates.clone();
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
        config.use_registry |= self.registry;
        Ok(config)
    }
}

impl Command for DaemonCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if let Some(path) = &self.config_path {
            ui.message(&format!("Using {} for configuration", path.display()));
        }
        let config = self.load_config()?;

        ui.show_header("shipkit daemon");
        ui.message(&format!("Listening on {}", config.address()));
        Daemon::new(config).run()?;
        Ok(CommandResult::success())
    }
}
