// ── Runtime integration configuration ──
//
// Describes *how* to reach the Cuby cloud for one account. Carries
// credential data and connection tuning, never touches disk. The CLI and
// the config flow construct an `IntegrationConfig` and hand it in.

use std::path::PathBuf;
use std::time::Duration;

use cuby_api::{Credentials, CubyClient, DEFAULT_BASE_URL, TlsMode, TransportConfig};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for one Cuby account.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// API root (production: `https://cuby.cloud`).
    pub base_url: Url,
    pub username: String,
    pub password: SecretString,
    /// Requested token lifetime in seconds. 0 = no expiry.
    pub expiration: u64,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra CA certificate to trust (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl IntegrationConfig {
    /// Config for the production cloud with default tuning.
    pub fn new(username: impl Into<String>, password: SecretString) -> Result<Self, CoreError> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|e| CoreError::Config {
            message: format!("invalid default base URL: {e}"),
        })?;
        Ok(Self {
            base_url,
            username: username.into(),
            password,
            expiration: 0,
            timeout: DEFAULT_TIMEOUT,
            ca_cert: None,
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_expiration(mut self, seconds: u64) -> Self {
        self.expiration = seconds;
        self
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.expose_secret())
            .with_expiration(self.expiration)
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = self
            .ca_cert
            .clone()
            .map_or(TlsMode::System, TlsMode::CustomCa);
        TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_timeout(self.timeout)
    }

    /// Build an API client for this account. Does not authenticate.
    pub fn build_client(&self) -> Result<CubyClient, CoreError> {
        CubyClient::with_base_url(self.base_url.clone(), self.credentials(), &self.transport())
            .map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = IntegrationConfig::new("user@example.com", SecretString::from("pw")).unwrap();
        assert_eq!(config.base_url.as_str(), "https://cuby.cloud/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.expiration, 0);
        assert!(matches!(config.transport().tls, TlsMode::System));
    }

    #[test]
    fn carries_tuning_into_client_inputs() {
        let mut config = IntegrationConfig::new("user", SecretString::from("pw"))
            .unwrap()
            .with_timeout(Duration::from_secs(3))
            .with_expiration(3600);
        config.ca_cert = Some(PathBuf::from("/tmp/ca.pem"));

        let creds = config.credentials();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.expiration, 3600);

        let transport = config.transport();
        assert_eq!(transport.timeout, Duration::from_secs(3));
        assert!(matches!(transport.tls, TlsMode::CustomCa(_)));
    }
}
