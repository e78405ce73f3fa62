// ── Config flow ──
//
// The single `user` step: collect credentials, prove they work against the
// cloud, make sure the account has at least one unit, and refuse a second
// entry for the same account.

use std::collections::{BTreeMap, HashSet};
use std::hash::BuildHasher;
use std::path::PathBuf;
use std::time::Duration;

use cuby_api::{DEFAULT_BASE_URL, Error as ApiError};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use strum::{AsRefStr, Display};
use tracing::{debug, error, info};
use url::Url;

use crate::DOMAIN;
use crate::config::{DEFAULT_TIMEOUT, IntegrationConfig};
use crate::error::CoreError;
use crate::setup::ConfigEntry;

pub const STEP_USER: &str = "user";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Form data of the `user` step.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub username: String,
    pub password: SecretString,
    /// Token lifetime in seconds. 0 = no expiry.
    pub expiration: u64,
}

impl UserInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            expiration: 0,
        }
    }

    fn validate(&self) -> Result<(), FlowError> {
        if self.username.trim().is_empty() || self.password.expose_secret().is_empty() {
            return Err(FlowError::InvalidInput);
        }
        Ok(())
    }
}

/// Error keys shown under the form's `base` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowError {
    InvalidAuth,
    CannotConnect,
    NoDevices,
    InvalidInput,
    Unknown,
}

impl FlowError {
    fn classify(err: &ApiError) -> Self {
        match err {
            e if e.is_auth_error() => Self::InvalidAuth,
            ApiError::Transport(_) | ApiError::Timeout { .. } | ApiError::Tls(_) => {
                Self::CannotConnect
            }
            // Server-side outage (5xx)
            e if e.is_transient() => Self::CannotConnect,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of a flow step.
#[derive(Debug)]
pub enum FlowResult {
    /// (Re)show the form, with errors keyed by field (`base` for global).
    Form {
        step_id: &'static str,
        errors: BTreeMap<String, FlowError>,
    },
    CreateEntry(ConfigEntry),
    Abort { reason: &'static str },
}

impl FlowResult {
    fn form() -> Self {
        Self::Form {
            step_id: STEP_USER,
            errors: BTreeMap::new(),
        }
    }

    fn form_error(err: FlowError) -> Self {
        Self::Form {
            step_id: STEP_USER,
            errors: BTreeMap::from([("base".to_owned(), err)]),
        }
    }

    /// The `base` error of a form, if any.
    pub fn base_error(&self) -> Option<FlowError> {
        match self {
            Self::Form { errors, .. } => errors.get("base").copied(),
            _ => None,
        }
    }
}

/// Lookup of entries the host already has.
pub trait ConfigEntries {
    fn has_unique_id(&self, domain: &str, unique_id: &str) -> bool;
}

/// A bare set of unique ids, all within this integration's domain.
impl<S: BuildHasher> ConfigEntries for HashSet<String, S> {
    fn has_unique_id(&self, domain: &str, unique_id: &str) -> bool {
        domain == DOMAIN && self.contains(unique_id)
    }
}

impl ConfigEntries for [ConfigEntry] {
    fn has_unique_id(&self, domain: &str, unique_id: &str) -> bool {
        self.iter()
            .any(|e| e.domain == domain && e.unique_id == unique_id)
    }
}

impl ConfigEntries for Vec<ConfigEntry> {
    fn has_unique_id(&self, domain: &str, unique_id: &str) -> bool {
        self.as_slice().has_unique_id(domain, unique_id)
    }
}

/// Drives the `user` step against a given API root.
#[derive(Debug, Clone)]
pub struct ConfigFlow {
    base_url: Url,
    timeout: Duration,
    ca_cert: Option<PathBuf>,
}

impl ConfigFlow {
    /// Flow against the production cloud.
    pub fn new() -> Result<Self, CoreError> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|e| CoreError::Config {
            message: format!("invalid default base URL: {e}"),
        })?;
        Ok(Self {
            base_url,
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

    pub fn with_ca_cert(mut self, path: Option<PathBuf>) -> Self {
        self.ca_cert = path;
        self
    }

    fn config_for(&self, input: &UserInput) -> IntegrationConfig {
        IntegrationConfig {
            base_url: self.base_url.clone(),
            username: input.username.trim().to_owned(),
            password: input.password.clone(),
            expiration: input.expiration,
            timeout: self.timeout,
            ca_cert: self.ca_cert.clone(),
        }
    }

    /// Run the `user` step. `None` input shows the empty form.
    pub async fn step_user<E>(&self, entries: &E, input: Option<UserInput>) -> FlowResult
    where
        E: ConfigEntries + ?Sized,
    {
        let Some(input) = input else {
            return FlowResult::form();
        };

        if let Err(err) = input.validate() {
            return FlowResult::form_error(err);
        }

        let config = self.config_for(&input);
        let client = match config.build_client() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "could not build API client");
                return FlowResult::form_error(FlowError::Unknown);
            }
        };

        if let Err(e) = client.login().await {
            debug!(error = %e, "credential check failed");
            return FlowResult::form_error(FlowError::classify(&e));
        }

        match client.try_get_devices().await {
            Ok(devices) if devices.is_empty() => {
                return FlowResult::form_error(FlowError::NoDevices);
            }
            Ok(devices) => debug!(count = devices.len(), "account has devices"),
            Err(e) => {
                error!(error = %e, "could not list devices");
                return FlowResult::form_error(FlowError::classify(&e));
            }
        }

        if entries.has_unique_id(DOMAIN, &config.username) {
            return FlowResult::Abort {
                reason: ABORT_ALREADY_CONFIGURED,
            };
        }

        info!(username = %config.username, "creating config entry");
        FlowResult::CreateEntry(ConfigEntry::new(config))
    }
}
