// Token authentication
//
// `POST /api/v2/token/{username}` exchanges the account password for a
// bearer token. The token is held by the client and attached to every
// subsequent request.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};

use crate::client::{CubyClient, api_error, decode};
use crate::error::Error;
use crate::models::{TokenRequest, TokenResponse};

/// Account credentials for the Cuby cloud.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Requested token lifetime in seconds. 0 = no expiry.
    pub expiration: u64,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            expiration: 0,
        }
    }

    pub fn with_expiration(mut self, seconds: u64) -> Self {
        self.expiration = seconds;
        self
    }
}

impl CubyClient {
    /// Request a fresh token, replacing any held one.
    ///
    /// Succeeds only on HTTP 200 with `{"status": "ok", "token": ...}`.
    pub async fn login(&self) -> Result<(), Error> {
        let _gate = self.auth_gate().lock().await;
        self.request_token().await
    }

    /// Lenient form of [`login`](Self::login): logs the failure and returns
    /// `false` on any error instead of propagating it.
    pub async fn authenticate(&self) -> bool {
        match self.login().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "error authenticating with Cuby API");
                false
            }
        }
    }

    /// Token exchange proper. Callers must hold the auth gate.
    pub(crate) async fn request_token(&self) -> Result<(), Error> {
        let credentials = self.credentials();
        let url = self.endpoint(&["token", &credentials.username])?;

        debug!(username = %credentials.username, "requesting token at {url}");

        let body = TokenRequest {
            password: credentials.password.expose_secret(),
            expiration: credentials.expiration,
        };

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        // Only a refused credential is an auth failure; outages stay API errors.
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("token request rejected (HTTP {status})"),
            });
        }
        if status != StatusCode::OK {
            return Err(api_error(resp).await);
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        let token: TokenResponse = decode(text).map_err(|e| {
            debug!(error = %e, "unreadable token response");
            Error::Authentication {
                message: "token endpoint returned an unreadable response".into(),
            }
        })?;

        match (token.status.as_deref(), token.token) {
            (Some("ok"), Some(token)) if !token.is_empty() => {
                self.store_token(token);
                debug!("authentication successful");
                Ok(())
            }
            (Some("ok"), _) => Err(Error::Authentication {
                message: "token endpoint reported success without a token".into(),
            }),
            (other, _) => Err(Error::Authentication {
                message: format!(
                    "token endpoint reported status {}",
                    other.unwrap_or("<missing>")
                ),
            }),
        }
    }
}
