//! Narrowing supported versions to published release tags.

use regex::Regex;
use std::sync::LazyLock;

use super::client::RegistryClient;
use crate::capability::Capability;
use crate::error::Result;

static RELEASE_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").ok());

/// Keep only strict `major.minor.patch` tags, in registry order.
pub fn filter_release_tags(tags: &[String]) -> Vec<String> {
    let Some(release) = RELEASE_TAG.as_ref() else {
        return Vec::new();
    };
    tags.iter().filter(|t| release.is_match(t)).cloned().collect()
}

/// Replace the capability's supported versions with the release tags of
/// its base image. Capabilities without a base image are left untouched.
pub fn enrich(capability: &mut dyn Capability, client: &RegistryClient) -> Result<()> {
    let Some(image) = capability.registry_image() else {
        tracing::debug!("{} has no base image; skipping registry lookup", capability.name());
        return Ok(());
    };

    client.ping()?;
    let tags = client.tags(&image)?;
    let versions = filter_release_tags(&tags);

    tracing::info!(
        "Found {} release tags for {} on {}",
        versions.len(),
        image,
        client.endpoint()
    );
    capability.set_supported_language_versions(versions);
    Ok(())
}
