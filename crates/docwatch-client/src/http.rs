//! Authenticated HTTP client wrapper.
//!
//! One configured [`reqwest::Client`] shared by every component. The wrapper
//! attaches the bearer token from the injected session store to each outgoing
//! request and handles 401 centrally: stored credentials are wiped and the
//! call resolves to [`Error::Unauthorized`], which callers treat as fatal to
//! the session. No retry lives at this layer; components that need bounded
//! retries implement them themselves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use docwatch_core::{defaults, Error, Result, SessionStore};

/// Environment variable naming the central backend base URL.
pub const ENV_BACKEND_URL: &str = "DOCWATCH_BACKEND_URL";

/// Shared HTTP client with bearer auth and centralized 401 handling.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client against `base_url` (the central backend).
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Create from `DOCWATCH_BACKEND_URL`, falling back to the default URL.
    pub fn from_env(session: Arc<SessionStore>) -> Result<Self> {
        let base_url =
            std::env::var(ENV_BACKEND_URL).unwrap_or_else(|_| defaults::BACKEND_URL.to_string());
        Self::new(base_url, session)
    }

    /// Central backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the central backend base URL.
    pub fn central_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The session store this client authenticates from.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // ========================================================================
    // Request helpers
    // ========================================================================

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.send(url, self.request(Method::GET, url)).await?;
        Ok(resp.json().await?)
    }

    /// GET a JSON document with a per-request timeout override.
    pub async fn get_json_timeout<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T> {
        let rb = self.request(Method::GET, url).timeout(timeout);
        let resp = self.send(url, rb).await?;
        Ok(resp.json().await?)
    }

    /// POST a JSON body and parse the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let rb = self.request(Method::POST, url).json(body);
        let resp = self.send(url, rb).await?;
        Ok(resp.json().await?)
    }

    /// Bare POST, parsing the JSON response.
    pub async fn post_parse<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.send(url, self.request(Method::POST, url)).await?;
        Ok(resp.json().await?)
    }

    /// Bare POST with a per-request timeout override, parsing the response.
    pub async fn post_parse_timeout<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T> {
        let rb = self.request(Method::POST, url).timeout(timeout);
        let resp = self.send(url, rb).await?;
        Ok(resp.json().await?)
    }

    /// POST a JSON body, discarding the response body.
    pub async fn post_body<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<()> {
        let rb = self.request(Method::POST, url).json(body);
        self.send(url, rb).await?;
        Ok(())
    }

    /// Bare POST, discarding the response body.
    pub async fn post_command(&self, url: &str) -> Result<()> {
        self.send(url, self.request(Method::POST, url)).await?;
        Ok(())
    }

    /// Bare POST with query parameters, discarding the response body.
    pub async fn post_command_query(&self, url: &str, query: &[(&str, &str)]) -> Result<()> {
        let rb = self.request(Method::POST, url).query(query);
        self.send(url, rb).await?;
        Ok(())
    }

    /// Bare POST with query parameters, parsing the JSON response.
    pub async fn post_query_parse<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let rb = self.request(Method::POST, url).query(query);
        let resp = self.send(url, rb).await?;
        Ok(resp.json().await?)
    }

    /// DELETE, discarding the response body.
    pub async fn delete(&self, url: &str) -> Result<()> {
        self.send(url, self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut rb = self.client.request(method, url);
        if let Some(token) = self.session.token() {
            rb = rb.bearer_auth(token);
        }
        rb
    }

    async fn send(&self, url: &str, rb: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let start = Instant::now();
        let resp = rb.send().await?;
        let status = resp.status();
        let elapsed = start.elapsed().as_millis() as u64;

        if elapsed > defaults::SLOW_HTTP_WARN_MS {
            warn!(url, duration_ms = elapsed, slow = true, "Slow HTTP round-trip");
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(url, "Received 401, wiping stored credentials");
            if let Err(e) = self.session.clear_credentials() {
                warn!(error = %e, "Failed to persist credential wipe");
            }
            return Err(Error::Unauthorized(format!("{} returned 401", url)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        debug!(url, status = status.as_u16(), duration_ms = elapsed, "HTTP round-trip");
        Ok(resp)
    }
}
