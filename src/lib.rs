//! shipkit - detect a project's stack and generate its deployment artifacts.
//!
//! shipkit looks at a project directory, picks the capability that
//! recognises it, and renders a `Dockerfile`, a `service.yml`, a
//! `kubernetes.yml` or a `starter.bundle` from a versioned template set.
//!
//! # Modules
//!
//! - [`artifact`] - Artifact kinds and requested artifact sets
//! - [`capability`] - The capability contract and built-in capabilities
//! - [`cli`] - Command-line interface and argument parsing
//! - [`crash`] - Crash reports for unexpected panics
//! - [`daemon`] - Newline-delimited JSON analysis service
//! - [`detection`] - Detection, selection and artifact conflict checks
//! - [`error`] - Error types and result aliases
//! - [`pipeline`] - The orchestration pipeline and its result
//! - [`registry`] - Image registry tag lookups
//! - [`request`] - The per-invocation analysis request
//! - [`templates`] - Template manifest, download and cache
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`updates`] - Self-update checks
//!
//! # Example
//!
//! ```
//! use shipkit::artifact::{ArtifactKind, ArtifactSet};
//!
//! let artifacts: ArtifactSet = "dockerfile,service".parse().unwrap();
//! assert!(artifacts.contains(ArtifactKind::ContainerBuildFile));
//! assert!(artifacts.contains(ArtifactKind::ServiceDescriptor));
//! assert!(!artifacts.contains(ArtifactKind::OrchestrationManifest));
//! ```
//!
//! For end-to-end analysis runs, see the integration tests.

pub mod artifact;
pub mod capability;
pub mod cli;
pub mod crash;
pub mod daemon;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod request;
pub mod templates;
pub mod ui;
pub mod updates;

pub use error::{Result, ShipkitError};
