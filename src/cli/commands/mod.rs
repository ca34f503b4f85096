//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`].

pub mod analyze;
pub mod completions;
pub mod daemon;
pub mod dispatcher;
pub mod update;
pub mod version;

pub use analyze::AnalyzeCommand;
pub use daemon::DaemonCommand;
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
