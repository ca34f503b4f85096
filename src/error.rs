//! Error types for shipkit operations.
//!
//! This module defines [`ShipkitError`], the primary error type used throughout
//! the orchestration pipeline, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every pipeline stage returns a `ShipkitError` variant naming its failure kind
//! - Capability modules and fetchers use `anyhow::Error`; the pipeline wraps
//!   those causes in the variant for the stage that failed
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

use crate::artifact::ArtifactKind;

/// Core error type for shipkit operations.
#[derive(Debug, Error)]
pub enum ShipkitError {
    /// The remote template manifest could not be fetched or parsed.
    #[error("Failed to fetch template manifest from {url}: {message}")]
    ManifestFetch { url: String, message: String },

    /// One or more template files could not be downloaded.
    #[error("Failed to download templates: {message}")]
    TemplateDownload { message: String },

    /// No registered capability recognised the project.
    #[error("Failed to detect a supported framework in {}", path.display())]
    NoSupportedFramework { path: PathBuf },

    /// Orchestration manifests require an existing service descriptor.
    #[error("Failed to detect service.yml in {}", path.display())]
    NoServiceDescriptorFound { path: PathBuf },

    /// The user did not pick one of the detected candidates.
    #[error("Framework selection aborted: {message}")]
    SelectionAborted { message: String },

    /// A destination artifact exists and overwriting was not allowed.
    #[error("{file} already exists. Use the overwrite flag to overwrite it")]
    ArtifactExists { file: String },

    /// The image registry could not be reached.
    #[error("Can't connect to the image registry at {endpoint}: {message}")]
    RegistryUnavailable { endpoint: String, message: String },

    /// The tag list for an image could not be retrieved.
    #[error("Can't find the tags for image '{image}': {message}")]
    TagLookup { image: String, message: String },

    /// The capability's analysis step failed.
    #[error("Failed to analyze the project: {0}")]
    Analysis(#[source] anyhow::Error),

    /// The capability failed to render an artifact.
    #[error("Failed to write {kind}: {source}")]
    Render {
        kind: ArtifactKind,
        #[source]
        source: anyhow::Error,
    },

    /// Daemon configuration file not found.
    #[error("Configuration not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the daemon configuration file.
    #[error("Failed to parse config at {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for shipkit operations.
pub type Result<T> = std::result::Result<T, ShipkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_fetch_displays_url_and_message() {
        let err = ShipkitError::ManifestFetch {
            url: "https://example.com/templates.json".into(),
            message: "HTTP 404".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/templates.json"));
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn artifact_exists_names_file() {
        let err = ShipkitError::ArtifactExists {
            file: "Dockerfile".into(),
        };
        assert!(err.to_string().starts_with("Dockerfile already exists"));
    }

    #[test]
    fn no_supported_framework_displays_path() {
        let err = ShipkitError::NoSupportedFramework {
            path: PathBuf::from("/srv/app"),
        };
        assert!(err.to_string().contains("/srv/app"));
    }

    #[test]
    fn render_error_names_artifact() {
        let err = ShipkitError::Render {
            kind: ArtifactKind::ServiceDescriptor,
            source: anyhow::anyhow!("template missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("service.yml"));
        assert!(msg.contains("template missing"));
    }

    #[test]
    fn analysis_error_wraps_cause() {
        let err = ShipkitError::Analysis(anyhow::anyhow!("Gemfile unreadable"));
        assert!(err.to_string().contains("Gemfile unreadable"));
    }

    #[test]
    fn tag_lookup_displays_image() {
        let err = ShipkitError::TagLookup {
            image: "library/ruby".into(),
            message: "HTTP 500".into(),
        };
        assert!(err.to_string().contains("library/ruby"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ShipkitError = io_err.into();
        assert!(matches!(err, ShipkitError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(ShipkitError::SelectionAborted {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
