//! Crash reports for unexpected panics.
//!
//! The CLI and daemon run each analysis inside [`CrashReporter::guard`]. A
//! panic is turned into a [`CrashReport`], written to
//! `~/.shipkit/crash-reports/<timestamp>.json` and handed back to the caller
//! so it can fail the run the normal way.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::templates::shipkit_home;
use crate::updates::VERSION;

/// Diagnostic record of one panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
    pub version: String,
    pub platform: String,
    pub architecture: String,
    /// Where the panic happened, e.g. `analyze` or `daemon request`.
    pub context: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl CrashReport {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            version: VERSION.to_string(),
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            context: context.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for CrashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shipkit crashed during {}: {}", self.context, self.message)
    }
}

/// Writes crash reports into one directory.
#[derive(Debug, Clone)]
pub struct CrashReporter {
    dir: PathBuf,
}

impl Default for CrashReporter {
    fn default() -> Self {
        Self::new(shipkit_home().join("crash-reports"))
    }
}

impl CrashReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `f`, converting a panic into a written [`CrashReport`].
    pub fn guard<T>(&self, context: &str, f: impl FnOnce() -> T) -> std::result::Result<T, CrashReport> {
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
            let report = CrashReport::new(context, panic_message(payload.as_ref()));
            match self.write(&report) {
                Ok(path) => tracing::warn!("Crash report written to {}", path.display()),
                Err(e) => tracing::warn!("Could not write crash report: {:#}", e),
            }
            report
        })
    }

    /// Persist `report` and return the file it was written to.
    pub fn write(&self, report: &CrashReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory {}", self.dir.display()))?;

        let name = format!("{}.json", report.created_at.format("%Y%m%dT%H%M%S%.6fZ"));
        let path = self.dir.join(name);
        let content = serde_json::to_string_pretty(report)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
