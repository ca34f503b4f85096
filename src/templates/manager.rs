//! Template cache reconciliation.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use super::fetch::HttpFetcher;
use super::manifest::TemplateManifest;
use crate::error::{Result, ShipkitError};
use crate::request::TemplateSource;

/// Manifest URL pattern; `{branch}` is replaced with the template branch.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/cloud66/starter/{branch}/templates/templates.json";

const STAGING_PREFIX: &str = ".templates-staging-";

/// Directory templates should be read from for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLocation {
    /// Directory holding the template files.
    pub dir: PathBuf,
    /// Manifest version, when the templates came from the remote set.
    pub version: Option<String>,
    /// Whether this call downloaded the template set.
    pub downloaded: bool,
}

/// Keeps a local template cache in step with the remote manifest.
pub struct TemplateManager {
    cache_dir: PathBuf,
    manifest_url: String,
    fetcher: HttpFetcher,
}

impl TemplateManager {
    /// Create a manager for a cache directory and a fully resolved manifest URL.
    pub fn new(cache_dir: impl Into<PathBuf>, manifest_url: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            manifest_url: manifest_url.into(),
            fetcher: HttpFetcher::new(),
        }
    }

    /// Create a manager whose manifest URL comes from a `{branch}` pattern.
    pub fn for_branch(cache_dir: impl Into<PathBuf>, url_pattern: &str, branch: &str) -> Self {
        Self::new(cache_dir, manifest_url_for(url_pattern, branch))
    }

    /// Replace the HTTP fetcher.
    pub fn with_fetcher(mut self, fetcher: HttpFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// Resolve a request's template source to a directory.
    ///
    /// A local source is trusted as-is and never touches the network.
    pub fn locate(&self, source: &TemplateSource) -> Result<TemplateLocation> {
        match source {
            TemplateSource::Local(dir) => {
                let dir = std::path::absolute(dir)?;
                if !dir.is_dir() {
                    return Err(ShipkitError::Other(anyhow::anyhow!(
                        "Template directory {} does not exist",
                        dir.display()
                    )));
                }
                tracing::info!("Using local templates at {}", dir.display());
                Ok(TemplateLocation {
                    dir,
                    version: None,
                    downloaded: false,
                })
            }
            TemplateSource::Remote => self.ensure_templates(),
        }
    }

    /// Make sure the cache holds the template set named by the remote manifest.
    ///
    /// The remote manifest is always fetched first; if that fails the call
    /// fails, even when a cache exists.
    pub fn ensure_templates(&self) -> Result<TemplateLocation> {
        tracing::info!("Checking templates in {}", self.cache_dir.display());

        let remote: TemplateManifest = self
            .fetcher
            .fetch_json(&self.manifest_url)
            .map_err(|e| ShipkitError::ManifestFetch {
                url: self.manifest_url.clone(),
                message: format!("{:#}", e),
            })?;

        let local = match TemplateManifest::load_from(&self.cache_dir) {
            Ok(local) => local,
            Err(e) => {
                tracing::warn!("Ignoring unreadable template cache: {:#}", e);
                None
            }
        };

        let downloaded = match local {
            Some(local) if local.same_version(&remote) => {
                tracing::info!("Local templates are up to date ({})", remote.version);
                false
            }
            Some(local) => {
                tracing::info!(
                    "Newer templates found ({} -> {}). Downloading them now",
                    local.version,
                    remote.version
                );
                self.download(&remote)?;
                true
            }
            None => {
                tracing::info!("No local templates found. Downloading now");
                self.download(&remote)?;
                true
            }
        };

        Ok(TemplateLocation {
            dir: self.cache_dir.clone(),
            version: Some(remote.version),
            downloaded,
        })
    }

    /// Download the full set into a staging directory, then swap it in.
    ///
    /// The existing cache is left untouched unless every file downloaded.
    fn download(&self, manifest: &TemplateManifest) -> Result<()> {
        self.stage_and_swap(manifest)
            .map_err(|e| ShipkitError::TemplateDownload {
                message: format!("{:#}", e),
            })?;
        tracing::debug!(
            "Downloaded {} templates into {}",
            manifest.templates.len(),
            self.cache_dir.display()
        );
        Ok(())
    }

    fn stage_and_swap(&self, manifest: &TemplateManifest) -> anyhow::Result<()> {
        let parent = self
            .cache_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&parent)
            .with_context(|| format!("Failed to create a staging directory in {}", parent.display()))?;

        for entry in &manifest.templates {
            self.download_entry(entry, staging.path())
                .with_context(|| entry.name.clone())?;
        }
        manifest
            .save_to(staging.path())
            .context("Failed to write the template manifest")?;

        let staged = staging.keep();
        if let Err(e) = swap_into_place(&staged, &self.cache_dir) {
            fs::remove_dir_all(&staged).ok();
            return Err(e);
        }
        Ok(())
    }

    fn download_entry(
        &self,
        entry: &super::manifest::TemplateEntry,
        staging: &Path,
    ) -> anyhow::Result<()> {
        let url = entry.source_url(&self.manifest_url)?;
        let destination = entry.destination(staging)?;

        tracing::debug!("Downloading {} from {}", entry.name, url);
        let body = self.fetcher.fetch_bytes(&url)?;

        if let Some(dir) = destination.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&destination, body)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        Ok(())
    }
}

/// Substitute the branch into a manifest URL pattern.
pub fn manifest_url_for(pattern: &str, branch: &str) -> String {
    pattern.replace("{branch}", branch)
}

/// Replace `target` with `staged` using renames only.
fn swap_into_place(staged: &Path, target: &Path) -> anyhow::Result<()> {
    let install = |from: &Path| {
        fs::rename(from, target)
            .with_context(|| format!("Failed to move templates into {}", target.display()))
    };

    if !target.exists() {
        return install(staged);
    }

    let retired = target.with_extension(format!("retired-{}", std::process::id()));
    if retired.exists() {
        fs::remove_dir_all(&retired)
            .with_context(|| format!("Failed to remove {}", retired.display()))?;
    }

    fs::rename(target, &retired)
        .with_context(|| format!("Failed to retire {}", target.display()))?;
    if let Err(e) = install(staged) {
        fs::rename(&retired, target).ok();
        return Err(e);
    }

    if let Err(e) = fs::remove_dir_all(&retired) {
        tracing::warn!("Failed to remove old templates at {}: {}", retired.display(), e);
    }
    Ok(())
}
