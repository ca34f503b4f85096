//! Anonymous Docker Registry HTTP API v2 client.

use regex::Regex;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, LINK, WWW_AUTHENTICATE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{Result, ShipkitError};

/// Docker Hub's registry endpoint.
pub const DEFAULT_REGISTRY: &str = "https://registry-1.docker.io/";

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

static CHALLENGE_PARAM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).ok());

/// Bearer challenge from a `WWW-Authenticate` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: Option<String>,
    pub scope: Option<String>,
}

impl BearerChallenge {
    pub fn parse(header: &str) -> Option<Self> {
        let rest = header.trim().strip_prefix("Bearer ")?;
        let params = CHALLENGE_PARAM.as_ref()?;

        let mut challenge = BearerChallenge::default();
        for capture in params.captures_iter(rest) {
            let value = capture[2].to_string();
            match &capture[1] {
                "realm" => challenge.realm = value,
                "service" => challenge.service = Some(value),
                "scope" => challenge.scope = Some(value),
                _ => {}
            }
        }

        (!challenge.realm.is_empty()).then_some(challenge)
    }
}

/// Talks to one registry endpoint without credentials.
pub struct RegistryClient {
    endpoint: String,
    client: Client,
}

impl RegistryClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Self {
            endpoint,
            client: Client::builder()
                .user_agent(concat!("shipkit/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn unavailable(&self, message: impl Into<String>) -> ShipkitError {
        ShipkitError::RegistryUnavailable {
            endpoint: self.endpoint.clone(),
            message: message.into(),
        }
    }

    /// Check that the endpoint speaks the v2 API.
    ///
    /// `401 Unauthorized` counts as reachable: anonymous pulls authenticate
    /// per repository.
    pub fn ping(&self) -> Result<()> {
        let url = format!("{}v2/", self.endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK | StatusCode::UNAUTHORIZED => Ok(()),
            status => Err(self.unavailable(format!("HTTP {}", status))),
        }
    }

    /// All tags for `repository` (e.g. `library/ruby`), in registry order.
    pub fn tags(&self, repository: &str) -> Result<Vec<String>> {
        let lookup_error = |message: String| ShipkitError::TagLookup {
            image: repository.to_string(),
            message,
        };

        let mut next = Some(format!("{}v2/{}/tags/list", self.endpoint, repository));
        let mut token: Option<String> = None;
        let mut tags = Vec::new();

        while let Some(url) = next.take() {
            let mut response = self.get(&url, token.as_deref()).map_err(lookup_error)?;

            if response.status() == StatusCode::UNAUTHORIZED && token.is_none() {
                let challenge = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|h| h.to_str().ok())
                    .and_then(BearerChallenge::parse)
                    .ok_or_else(|| lookup_error("unauthorized without a bearer challenge".into()))?;

                token = Some(self.anonymous_token(&challenge, repository).map_err(lookup_error)?);
                response = self.get(&url, token.as_deref()).map_err(lookup_error)?;
            }

            if !response.status().is_success() {
                return Err(lookup_error(format!("HTTP {}", response.status())));
            }

            next = next_page(&response, &self.endpoint);
            let page: TagList = response
                .json()
                .map_err(|e| lookup_error(format!("invalid tag list: {}", e)))?;
            tags.extend(page.tags.unwrap_or_default());
        }

        tracing::debug!("Found {} tags for {}", tags.len(), repository);
        Ok(tags)
    }

    fn get(&self, url: &str, token: Option<&str>) -> std::result::Result<Response, String> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request.send().map_err(|e| e.to_string())
    }

    fn anonymous_token(
        &self,
        challenge: &BearerChallenge,
        repository: &str,
    ) -> std::result::Result<String, String> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", repository));

        let mut query = vec![("scope", scope)];
        if let Some(service) = &challenge.service {
            query.push(("service", service.clone()));
        }

        let response = self
            .client
            .get(&challenge.realm)
            .query(&query)
            .send()
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("token request failed with HTTP {}", response.status()));
        }

        let body: TokenResponse = response.json().map_err(|e| e.to_string())?;
        body.token
            .or(body.access_token)
            .ok_or_else(|| "token response did not contain a token".to_string())
    }
}

/// Follow `Link: </v2/...>; rel="next"` pagination.
fn next_page(response: &Response, endpoint: &str) -> Option<String> {
    let link = response.headers().get(LINK)?.to_str().ok()?;
    let target = link
        .split(',')
        .find(|part| part.contains("rel=\"next\""))?
        .split(';')
        .next()?
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>');

    Url::parse(endpoint)
        .ok()?
        .join(target)
        .ok()
        .map(|url| url.to_string())
}
