//! Self-update checks.
//!
//! - Install method detection (cargo, homebrew, manual)
//! - Version checking against the latest release on a channel

pub mod install;
pub mod version;

pub use install::{detect_install_method, InstallMethod};
pub use version::{
    is_newer_version, UpdateChecker, UpdateInfo, CHECK_TIMEOUT, STABLE_CHANNEL, VERSION,
};
