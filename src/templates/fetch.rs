//! HTTP fetching for template manifests and template files.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Fetches manifests and template files over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default 30-second timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP fetcher with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("shipkit/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            timeout,
        }
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a URL and return its raw body.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(bytes.to_vec())
    }

    /// Fetch a URL and decode its body as JSON.
    pub fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.fetch_bytes(url)?;
        serde_json::from_slice(&body).with_context(|| format!("Invalid JSON returned by {}", url))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct VersionOnly {
        version: String,
    }

    #[test]
    fn default_timeout_is_30_seconds() {
        let fetcher = HttpFetcher::new();
        assert_eq!(fetcher.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn custom_timeout() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5));
        assert_eq!(fetcher.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn fetch_json_decodes_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/templates.json");
            then.status(200).body(r#"{"version": "1.2.0"}"#);
        });

        let body: VersionOnly = HttpFetcher::new()
            .fetch_json(&server.url("/templates.json"))
            .unwrap();
        assert_eq!(body.version, "1.2.0");
    }

    #[test]
    fn fetch_json_rejects_invalid_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/templates.json");
            then.status(200).body("<html>oops</html>");
        });

        let result: Result<VersionOnly> = HttpFetcher::new().fetch_json(&server.url("/templates.json"));
        assert!(result.is_err());
    }

    #[test]
    fn fetch_bytes_reports_http_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let err = HttpFetcher::new()
            .fetch_bytes(&server.url("/missing"))
            .unwrap_err();
        assert!(err.to_string().contains("404"), "unexpected error: {}", err);
    }
}
