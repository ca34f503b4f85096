//! `shipkit version`.

use crate::error::Result;
use crate::ui::UserInterface;
use crate::updates::VERSION;

use super::dispatcher::{Command, CommandResult};

pub struct VersionCommand;

impl VersionCommand {
    pub fn text() -> String {
        format!(
            "shipkit {} ({}/{})",
            VERSION,
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    }
}

impl Command for VersionCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", Self::text());
        Ok(CommandResult::success())
    }
}
