//! Version checking against the latest published release.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Current version of shipkit.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GitHub API base for shipkit releases.
pub const RELEASES_API: &str = "https://api.github.com/repos/shipkit-dev/shipkit";

/// Channel that follows `/releases/latest`.
pub const STABLE_CHANNEL: &str = "stable";

/// Deadline for the whole update check.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Information about an available update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub current: String,
    pub latest: String,
    pub channel: String,
    pub update_available: bool,
    pub release_url: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    prerelease: bool,
}

/// Checks a release feed for a newer shipkit.
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    api_base: String,
    channel: String,
    timeout: Duration,
}

impl UpdateChecker {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            api_base: RELEASES_API.to_string(),
            channel: channel.into(),
            timeout: CHECK_TIMEOUT,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the check on a background thread and give up after the deadline.
    pub fn check(&self) -> Result<UpdateInfo> {
        let (tx, rx) = mpsc::channel();
        let checker = self.clone();
        thread::spawn(move || {
            let _ = tx.send(checker.fetch());
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                anyhow::bail!("Update check timed out after {}s", self.timeout.as_secs())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                anyhow::bail!("Update check stopped unexpectedly")
            }
        }
    }

    fn fetch(&self) -> Result<UpdateInfo> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("shipkit/", env!("CARGO_PKG_VERSION")))
            .timeout(CHECK_TIMEOUT)
            .build()?;

        let release = if self.channel == STABLE_CHANNEL {
            let url = format!("{}/releases/latest", self.api_base);
            client
                .get(&url)
                .send()?
                .error_for_status()?
                .json::<Release>()
                .context("Failed to parse GitHub API response")?
        } else {
            let url = format!("{}/releases", self.api_base);
            let releases: Vec<Release> = client
                .get(&url)
                .send()?
                .error_for_status()?
                .json()
                .context("Failed to parse GitHub API response")?;
            releases
                .into_iter()
                .find(|r| r.prerelease && r.tag_name.contains(self.channel.as_str()))
                .with_context(|| format!("No release found on the '{}' channel", self.channel))?
        };

        let tag = release.tag_name.trim_start_matches('v');
        tracing::debug!("Latest {} release is {}", self.channel, tag);

        Ok(UpdateInfo {
            current: VERSION.to_string(),
            latest: tag.to_string(),
            channel: self.channel.clone(),
            update_available: is_newer_version(tag, VERSION),
            release_url: release.html_url,
            checked_at: Utc::now(),
        })
    }
}

/// Compare versions to check if `latest` is newer than `current`.
///
/// Only the first three numeric components are compared; pre-release
/// suffixes such as `-beta.1` are ignored.
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    let parse_version = |v: &str| -> Vec<u32> {
        v.split('-')
            .next()
            .unwrap_or_default()
            .split('.')
            .take(3)
            .filter_map(|s| s.parse().ok())
            .collect()
    };

    let latest_parts = parse_version(latest);
    let current_parts = parse_version(current);

    for (l, c) in latest_parts.iter().zip(current_parts.iter()) {
        if l > c {
            return true;
        }
        if l < c {
            return false;
        }
    }

    latest_parts.len() > current_parts.len()
}
