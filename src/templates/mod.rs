//! Versioned template set management.
//!
//! Templates live in a local cache directory that mirrors a remote
//! manifest. The cache is refreshed whenever the remote manifest's version
//! differs from the cached one.
//!
//! # Example
//!
//! ```no_run
//! use shipkit::templates::{TemplateManager, DEFAULT_MANIFEST_URL, default_cache_dir};
//!
//! let manager = TemplateManager::for_branch(default_cache_dir(), DEFAULT_MANIFEST_URL, "master");
//! let location = manager.ensure_templates().unwrap();
//! println!("templates in {}", location.dir.display());
//! ```

pub mod fetch;
pub mod manager;
pub mod manifest;

pub use fetch::HttpFetcher;
pub use manager::{manifest_url_for, TemplateLocation, TemplateManager, DEFAULT_MANIFEST_URL};
pub use manifest::{TemplateEntry, TemplateManifest, MANIFEST_FILE};

/// Root directory for shipkit's per-user state.
pub fn shipkit_home() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".shipkit")
}

/// Get the default template cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    shipkit_home().join("templates")
}
