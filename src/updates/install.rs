//! Install method detection.
//!
//! The update command shipkit prints depends on how it was installed.

use std::env;
use std::path::{Path, PathBuf};

const HOMEBREW_PREFIXES: &[&str] = &[
    "/usr/local/Cellar/",
    "/opt/homebrew/Cellar/",
    "/home/linuxbrew/.linuxbrew/",
];

/// How shipkit was installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallMethod {
    Cargo,
    Homebrew,
    /// Downloaded binary or built from source.
    Manual { path: PathBuf },
    Unknown,
}

impl InstallMethod {
    /// Command that upgrades this install, on the given release channel.
    pub fn update_command(&self, channel: &str) -> Option<String> {
        let stable = channel == super::version::STABLE_CHANNEL;
        match self {
            InstallMethod::Cargo if stable => Some("cargo install shipkit --force".to_string()),
            InstallMethod::Cargo => Some(format!(
                "cargo install shipkit --force --git https://github.com/shipkit-dev/shipkit --branch {}",
                channel
            )),
            InstallMethod::Homebrew if stable => Some("brew upgrade shipkit".to_string()),
            InstallMethod::Homebrew => Some(format!("brew upgrade shipkit-{}", channel)),
            InstallMethod::Manual { .. } | InstallMethod::Unknown => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            InstallMethod::Cargo => "cargo",
            InstallMethod::Homebrew => "homebrew",
            InstallMethod::Manual { .. } => "manual",
            InstallMethod::Unknown => "unknown",
        }
    }
}

/// Detect how the running binary was installed.
pub fn detect_install_method() -> InstallMethod {
    match env::current_exe() {
        Ok(path) => install_method_for(&path),
        Err(_) => InstallMethod::Unknown,
    }
}

fn install_method_for(exe_path: &Path) -> InstallMethod {
    if is_cargo_install(exe_path) {
        InstallMethod::Cargo
    } else if is_homebrew_install(exe_path) {
        InstallMethod::Homebrew
    } else {
        InstallMethod::Manual {
            path: exe_path.to_path_buf(),
        }
    }
}

fn is_cargo_install(exe_path: &Path) -> bool {
    if let Some(home) = dirs::home_dir() {
        if exe_path.starts_with(home.join(".cargo").join("bin")) {
            return true;
        }
    }

    env::var("CARGO_HOME")
        .map(|cargo_home| exe_path.starts_with(PathBuf::from(cargo_home).join("bin")))
        .unwrap_or(false)
}

fn is_homebrew_install(exe_path: &Path) -> bool {
    let exe = exe_path.to_string_lossy();
    HOMEBREW_PREFIXES.iter().any(|prefix| exe.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_update_commands() {
        assert_eq!(
            InstallMethod::Cargo.update_command("stable").as_deref(),
            Some("cargo install shipkit --force")
        );
        assert_eq!(
            InstallMethod::Homebrew.update_command("stable").as_deref(),
            Some("brew upgrade shipkit")
        );
        assert!(InstallMethod::Manual {
            path: PathBuf::from("/tmp/shipkit")
        }
        .update_command("stable")
        .is_none());
        assert!(InstallMethod::Unknown.update_command("stable").is_none());
    }

    #[test]
    fn channel_update_commands() {
        assert!(InstallMethod::Cargo
            .update_command("beta")
            .unwrap()
            .ends_with("--branch beta"));
        assert_eq!(
            InstallMethod::Homebrew.update_command("beta").as_deref(),
            Some("brew upgrade shipkit-beta")
        );
    }

    #[test]
    fn detects_cargo_bin() {
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".cargo").join("bin").join("shipkit");
            assert_eq!(install_method_for(&path), InstallMethod::Cargo);
        }
    }

    #[test]
    fn detects_homebrew_cellar() {
        for path in [
            "/usr/local/Cellar/shipkit/0.4.0/bin/shipkit",
            "/opt/homebrew/Cellar/shipkit/0.4.0/bin/shipkit",
            "/home/linuxbrew/.linuxbrew/bin/shipkit",
        ] {
            assert_eq!(install_method_for(Path::new(path)), InstallMethod::Homebrew);
        }
    }

    #[test]
    fn anything_else_is_manual() {
        let method = install_method_for(Path::new("/tmp/shipkit"));
        assert_eq!(method.name(), "manual");
        assert_eq!(
            method,
            InstallMethod::Manual {
                path: PathBuf::from("/tmp/shipkit")
            }
        );
    }
}
