//! Command-line interface for shipkit.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, UpdateArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
