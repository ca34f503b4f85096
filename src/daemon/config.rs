//! Daemon configuration file.
//!
//! ```yaml
//! bind: 0.0.0.0
//! port: 9090
//! branch: master
//! use_registry: true
//! ```
//!
//! Every field is optional. The file is read once at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShipkitError};
use crate::pipeline::Orchestrator;
use crate::registry::DEFAULT_REGISTRY;
use crate::request::{TemplateSource, DEFAULT_BRANCH};
use crate::templates::{default_cache_dir, DEFAULT_MANIFEST_URL};

/// Default daemon port.
pub const DEFAULT_PORT: u16 = 9090;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub bind: String,
    pub port: u16,
    /// Local template directory. When unset, templates come from the
    /// remote manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,
    /// Manifest URL pattern, `{branch}` is substituted.
    pub manifest_url: String,
    pub registry_endpoint: String,
    pub branch: String,
    pub use_registry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            templates: None,
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            registry_endpoint: DEFAULT_REGISTRY.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            use_registry: false,
            cache_dir: None,
        }
    }
}

impl DaemonConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ShipkitError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ShipkitError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `bind:port`, ready for `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn template_source(&self) -> TemplateSource {
        match &self.templates {
            Some(dir) => TemplateSource::Local(dir.clone()),
            None => TemplateSource::Remote,
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let cache_dir = self.cache_dir.clone().unwrap_or_else(default_cache_dir);
        Orchestrator::new(cache_dir)
            .with_manifest_url(self.manifest_url.as_str())
            .with_registry(self.registry_endpoint.as_str())
    }
}
