//! Upstream image registry lookups.
//!
//! Used to narrow a capability's supported language versions to the
//! release tags actually published for its base image.

pub mod client;
pub mod enrich;

pub use client::{RegistryClient, DEFAULT_REGISTRY};
pub use enrich::{enrich, filter_release_tags};
