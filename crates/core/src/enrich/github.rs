//! GitHub REST API profile lookup.

use std::sync::LazyLock;
use std::time::Duration;

use regex_lite::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::PublicEmailProvider;
use crate::config::EnrichConfig;
use crate::errors::EnrichmentError;

/// A GitHub login: ASCII letters, digits and hyphens, starting with a letter
/// or digit, at most 39 characters.
static LOGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{0,38}$").expect("login pattern is valid")
});

/// The subset of `GET /users/{login}` that enrichment needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Looks up a member's public profile email on GitHub.
#[derive(Clone)]
pub struct GitHubProfileProvider {
    http: reqwest::Client,
    api_url: String,
    token: String,
    timeout: Duration,
}

impl GitHubProfileProvider {
    /// Build a provider. Fails if the token is unusable, before any request
    /// is made.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EnrichmentError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let token = token.into();
        validate_token(&token)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("rostermail/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(api_url = %api_url, timeout_secs = timeout.as_secs(), "created GitHubProfileProvider");
        Ok(Self {
            http,
            api_url,
            token,
            timeout,
        })
    }

    pub fn from_config(config: &EnrichConfig, token: impl Into<String>) -> Result<Self, EnrichmentError> {
        Self::new(
            config.api_url.clone(),
            token,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn transport_error(&self, handle: &str, err: reqwest::Error) -> EnrichmentError {
        if err.is_timeout() {
            EnrichmentError::Timeout {
                handle: handle.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            EnrichmentError::Http(err)
        }
    }
}

impl PublicEmailProvider for GitHubProfileProvider {
    #[instrument(skip(self))]
    async fn lookup_public_email(&self, handle: &str) -> Result<Option<String>, EnrichmentError> {
        if !is_valid_login(handle) {
            warn!(handle, "not a valid GitHub login, skipping lookup");
            return Ok(None);
        }
        let url = format!("{}/users/{}", self.api_url, handle);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.transport_error(handle, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(handle, "no such GitHub user");
            return Ok(None);
        }
        check_response(&resp)?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(handle, e))?;
        let user: GitHubUser =
            serde_json::from_slice(&body).map_err(|e| EnrichmentError::Parse(e.to_string()))?;
        debug!(login = %user.login, has_email = user.email.is_some(), "fetched user");

        Ok(user
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()))
    }
}

/// Whether `handle` can be placed in a `/users/{login}` path as is.
pub fn is_valid_login(handle: &str) -> bool {
    LOGIN_PATTERN.is_match(handle)
}

/// Reject tokens that could never authenticate: empty, or containing
/// whitespace or control characters (a pasted multi-line file, for example).
pub fn validate_token(token: &str) -> Result<(), EnrichmentError> {
    if token.is_empty() {
        return Err(EnrichmentError::InvalidCredential("token is empty".into()));
    }
    if let Some(pos) = token.chars().position(|c| !c.is_ascii_graphic()) {
        return Err(EnrichmentError::InvalidCredential(format!(
            "token contains an invalid character at position {}",
            pos
        )));
    }
    Ok(())
}

fn check_response(resp: &reqwest::Response) -> Result<(), EnrichmentError> {
    let header = |name: &str| resp.headers().get(name).and_then(|v| v.to_str().ok());
    classify_status(
        resp.status().as_u16(),
        header("x-ratelimit-remaining"),
        header("x-ratelimit-reset"),
    )
}

/// Map a GitHub status code (other than 404) to the enrichment taxonomy.
fn classify_status(
    status: u16,
    ratelimit_remaining: Option<&str>,
    ratelimit_reset: Option<&str>,
) -> Result<(), EnrichmentError> {
    let reset_at = || ratelimit_reset.unwrap_or("unknown").to_string();
    match status {
        200..=299 => Ok(()),
        401 => Err(EnrichmentError::Unauthorized(format!("HTTP {}", status))),
        403 if ratelimit_remaining == Some("0") => {
            Err(EnrichmentError::RateLimited { reset_at: reset_at() })
        }
        403 => Err(EnrichmentError::Forbidden(format!("HTTP {}", status))),
        429 => Err(EnrichmentError::RateLimited { reset_at: reset_at() }),
        _ => Err(EnrichmentError::Api {
            status,
            body: format!("HTTP {}", status),
        }),
    }
}
