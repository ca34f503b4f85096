//! Long-running analysis service.
//!
//! - [`config`] - YAML daemon configuration
//! - [`server`] - newline-delimited JSON over TCP

pub mod config;
pub mod server;

pub use config::{DaemonConfig, DEFAULT_PORT};
pub use server::{Daemon, DaemonRequest};
