//! `starter.bundle` archives.
//!
//! A bundle is a gzipped tarball holding the project's generated
//! `Dockerfile` and `service.yml`, the template set's `bundle/` directory
//! under `templates/`, and a `manifest.json` describing the contents.

use anyhow::{Context, Result};
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::artifact::ArtifactKind;

/// Directory inside the template cache that is copied into every bundle.
pub const BUNDLE_TEMPLATE_DIR: &str = "bundle";

#[derive(Debug, Serialize)]
struct BundleManifest {
    version: &'static str,
    branch: String,
    created_at: String,
    files: Vec<String>,
}

/// Write `starter.bundle` into `project_path` and return its path.
pub fn write_bundle(project_path: &Path, template_dir: &Path, branch: &str) -> Result<PathBuf> {
    let destination = ArtifactKind::DeploymentBundle.path_in(project_path);
    // Built beside the destination and renamed over it once complete.
    let staged = tempfile::Builder::new()
        .prefix(".starter.bundle.")
        .tempfile_in(project_path)
        .with_context(|| format!("Failed to create a temporary bundle in {}", project_path.display()))?;
    let mut builder = tar::Builder::new(GzEncoder::new(staged, Compression::default()));
    let mut files = Vec::new();

    for kind in [ArtifactKind::ContainerBuildFile, ArtifactKind::ServiceDescriptor] {
        let path = kind.path_in(project_path);
        if path.is_file() {
            builder
                .append_path_with_name(&path, kind.file_name())
                .with_context(|| format!("Failed to add {} to bundle", path.display()))?;
            files.push(kind.file_name().to_string());
        }
    }

    let bundle_templates = template_dir.join(BUNDLE_TEMPLATE_DIR);
    if bundle_templates.is_dir() {
        builder
            .append_dir_all("templates", &bundle_templates)
            .with_context(|| format!("Failed to add {} to bundle", bundle_templates.display()))?;
        files.push("templates/".to_string());
    } else {
        tracing::debug!("No {} directory in {}", BUNDLE_TEMPLATE_DIR, template_dir.display());
    }

    let now = Utc::now();
    let manifest = BundleManifest {
        version: "1",
        branch: branch.to_string(),
        created_at: now.to_rfc3339(),
        files,
    };
    let bytes = serde_json::to_vec_pretty(&manifest)?;

    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(now.timestamp().max(0) as u64);
    header.set_cksum();
    builder.append_data(&mut header, "manifest.json", bytes.as_slice())?;

    let staged = builder.into_inner()?.finish()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    staged
        .persist(&destination)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    tracing::debug!("Wrote {}", destination.display());
    Ok(destination)
}
