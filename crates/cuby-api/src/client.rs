// Cuby API HTTP client
//
// Wraps `reqwest::Client` with Cuby-specific URL construction, bearer-token
// injection, and status-code classification. Endpoint methods live in
// sibling modules (auth, devices, control) as inherent impls so this file
// stays focused on transport mechanics.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Production endpoint of the Cuby cloud.
pub const DEFAULT_BASE_URL: &str = "https://cuby.cloud";

const API_PREFIX: [&str; 2] = ["api", "v2"];

/// Async client for the Cuby cloud API.
///
/// Authenticates lazily: the first data call without a held token requests
/// one. The token lives in memory for the client's lifetime and is dropped
/// when the API answers 401. Share it between entities via `Arc`.
pub struct CubyClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    /// Timeout the HTTP client was built with, for error reporting.
    timeout: Option<Duration>,
    token: RwLock<Option<SecretString>>,
    /// Serializes token acquisition so concurrent first calls authenticate once.
    auth_gate: Mutex<()>,
}

impl CubyClient {
    /// Create a client against the production cloud.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL)?;
        Self::with_base_url(base_url, credentials, transport)
    }

    /// Create a client against a specific API root.
    pub fn with_base_url(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, base_url, credentials)?;
        client.timeout = Some(transport.timeout);
        Ok(client)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        Ok(Self {
            http,
            base_url,
            credentials,
            timeout: None,
            token: RwLock::new(None),
            auth_gate: Mutex::new(()),
        })
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account this client authenticates as.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    /// Whether a bearer token is currently held.
    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    pub(crate) fn store_token(&self, token: String) {
        debug!("storing session token");
        *self.token.write().expect("token lock poisoned") = Some(SecretString::from(token));
    }

    /// Forget the held token; the next call authenticates again.
    pub fn clear_token(&self) {
        trace!("clearing session token");
        *self.token.write().expect("token lock poisoned") = None;
    }

    pub(crate) fn auth_gate(&self) -> &Mutex<()> {
        &self.auth_gate
    }

    /// Make sure a token is held, requesting one if not.
    async fn ensure_token(&self) -> Result<(), Error> {
        if self.has_token() {
            return Ok(());
        }
        let _gate = self.auth_gate.lock().await;
        // Another caller may have finished authenticating while we waited.
        if self.has_token() {
            return Ok(());
        }
        self.request_token().await
    }

    /// Attach the bearer token to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.token.read().expect("token lock poisoned");
        match guard.as_ref() {
            Some(token) => Ok(builder.bearer_auth(token.expose_secret())),
            None => Err(Error::Authentication {
                message: "no session token".into(),
            }),
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/v2/{segments...}`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(API_PREFIX.iter().chain(segments.iter()));
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        self.ensure_token().await?;
        debug!("GET {url}");

        let resp = self
            .authorize(self.http.get(url))?
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.check_status(resp).await?;
        decode(body)
    }

    /// Send an authenticated POST with a JSON body, ignoring the response body.
    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<(), Error> {
        self.ensure_token().await?;
        debug!("POST {url}");

        let resp = self
            .authorize(self.http.post(url).json(body))?
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.check_status(resp).await.map(|_| ())
    }

    // ── Response handling ────────────────────────────────────────────

    /// Classify the status code and return the body text on success.
    async fn check_status(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            self.clear_token();
            return Err(Error::Authentication {
                message: "session token rejected (HTTP 401)".into(),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                resource: resp.url().path().to_owned(),
            });
        }

        if !status.is_success() {
            return Err(api_error(resp).await);
        }

        resp.text().await.map_err(|e| self.transport_error(e))
    }

    /// Map a reqwest failure, surfacing timeouts as their own variant.
    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.map_or(0, |t| t.as_secs()),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// `Error::Api` for a non-success response, carrying a body preview.
pub(crate) async fn api_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Error::Api {
        status: status.as_u16(),
        message: if body.is_empty() {
            status.to_string()
        } else {
            preview(&body).to_owned()
        },
    }
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) fn decode<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn client(base: &str) -> CubyClient {
        CubyClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Credentials::new("user@example.com", "secret"),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_encodes_segments() {
        let c = client("https://cuby.cloud");
        let url = c.endpoint(&["token", "user@example.com"]).unwrap();
        assert_eq!(url.as_str(), "https://cuby.cloud/api/v2/token/user@example.com");

        let url = c.endpoint(&["devices", "a b/c", "state"]).unwrap();
        assert_eq!(url.path(), "/api/v2/devices/a%20b%2Fc/state");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("http://localhost:8080/proxy/");
        let url = c.endpoint(&["devices"]).unwrap();
        assert_eq!(url.path(), "/proxy/api/v2/devices");
    }

    #[test]
    fn rejects_non_base_url() {
        let result = CubyClient::with_client(
            reqwest::Client::new(),
            Url::parse("mailto:ops@example.com").unwrap(),
            Credentials::new("u", "p"),
        );
        assert!(matches!(result, Err(Error::InvalidBaseUrl { .. })));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        assert!(preview(&body).len() <= 200);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn token_roundtrip() {
        let c = client("https://cuby.cloud");
        assert!(!c.has_token());
        c.store_token("abc".into());
        assert!(c.has_token());
        c.clear_token();
        assert!(!c.has_token());
    }
}
