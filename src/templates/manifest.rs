//! Template manifest definitions.
//!
//! The manifest names the current template-set version and every file
//! belonging to it. A cache is valid only for the exact version string it
//! was downloaded for.

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// File name of the manifest inside a template cache.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Versioned description of the remote template set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// Opaque version token, compared by string equality.
    pub version: String,

    /// Files in the set, in download order.
    #[serde(default)]
    pub templates: Vec<TemplateEntry>,
}

/// A single file in the template set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Path relative to the cache directory.
    pub name: String,

    /// Where to download the file from. Relative URLs resolve against the
    /// manifest URL; an empty value means `name`.
    #[serde(default)]
    pub url: String,
}

impl TemplateManifest {
    /// Load a manifest from a cache directory, if one is present.
    pub fn load_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Write this manifest into a directory.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    /// Whether a cached manifest describes the same template set.
    pub fn same_version(&self, other: &TemplateManifest) -> bool {
        self.version == other.version
    }
}

impl TemplateEntry {
    /// Absolute download URL for this entry.
    pub fn source_url(&self, manifest_url: &str) -> Result<String> {
        let reference = if self.url.is_empty() {
            self.name.as_str()
        } else {
            self.url.as_str()
        };

        if let Ok(url) = Url::parse(reference) {
            return Ok(url.to_string());
        }

        let base = Url::parse(manifest_url)
            .with_context(|| format!("Invalid manifest URL: {}", manifest_url))?;
        let url = base
            .join(reference)
            .with_context(|| format!("Invalid template URL: {}", reference))?;
        Ok(url.to_string())
    }

    /// Destination path inside `dir`, rejecting paths that escape it.
    pub fn destination(&self, dir: &Path) -> Result<PathBuf> {
        let relative = Path::new(&self.name);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if self.name.is_empty() || escapes {
            bail!("Template path '{}' is outside the template cache", self.name);
        }

        Ok(dir.join(relative))
    }
}
