//! `shipkit update` - check for a newer release.

use crate::cli::args::UpdateArgs;
use crate::error::{Result, ShipkitError};
use crate::ui::UserInterface;
use crate::updates::{detect_install_method, InstallMethod, UpdateChecker, UpdateInfo};

use super::dispatcher::{Command, CommandResult};

pub struct UpdateCommand {
    args: UpdateArgs,
    checker: UpdateChecker,
}

impl UpdateCommand {
    pub fn new(args: UpdateArgs) -> Self {
        let checker = UpdateChecker::new(args.channel.as_str());
        Self { args, checker }
    }

    pub fn with_checker(mut self, checker: UpdateChecker) -> Self {
        self.checker = checker;
        self
    }

    fn report(&self, info: &UpdateInfo, method: &InstallMethod, ui: &mut dyn UserInterface) {
        if !info.update_available {
            ui.success(&format!("shipkit {} is up to date", info.current));
            return;
        }

        ui.message(&format!(
            "shipkit {} is available on the {} channel (you have {})",
            info.latest, self.args.channel, info.current
        ));
        match method.update_command(&self.args.channel) {
            Some(command) => ui.show_hint(&format!("Run: {}", command)),
            None => {
                if let Some(url) = &info.release_url {
                    ui.show_hint(&format!("Download it from {}", url));
                }
            }
        }
    }
}

impl Command for UpdateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut spinner = ui.start_spinner("Checking for updates...");
        let info = match self.checker.check() {
            Ok(info) => {
                spinner.finish_success("Checked for updates");
                info
            }
            Err(e) => {
                spinner.finish_error("Update check failed");
                return Err(ShipkitError::Other(e));
            }
        };

        self.report(&info, &detect_install_method(), ui);
        Ok(CommandResult::success())
    }
}
