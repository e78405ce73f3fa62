//! Shared configuration for Cuby tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `cuby_core::IntegrationConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use cuby_core::IntegrationConfig;

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "cuby";

/// Environment variable consulted first for the account password.
pub const PASSWORD_ENV: &str = "CUBY_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile` when `name` is
    /// `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        self.profiles
            .get(&name)
            .map(|p| (name.clone(), p))
            .ok_or(ConfigError::UnknownProfile { profile: name })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// A named Cuby account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account username (email).
    pub username: String,

    /// Password (plaintext; prefer keyring or `CUBY_PASSWORD`).
    pub password: Option<String>,

    /// Requested token lifetime in seconds. 0 = no expiry.
    #[serde(default)]
    pub expiration: u64,

    /// API root override (default: `https://cuby.cloud`).
    pub base_url: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("cloud", "cuby", "cuby").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("cuby");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file, layering defaults underneath and `CUBY_`
/// environment variables (`__` separates nesting) on top.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CUBY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Read a stored password from the system keyring.
pub fn keyring_password(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name)
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve the account password: `CUBY_PASSWORD`, then the keyring, then
/// the profile's plaintext field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        std::env::var(PASSWORD_ENV).ok(),
        keyring_password,
    )
}

/// [`resolve_password`] with explicit env and keyring sources.
pub fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env_password: Option<String>,
    keyring: impl FnOnce(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Some(pw) = env_password.filter(|pw| !pw.is_empty()) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Some(pw) = keyring(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build an `IntegrationConfig` from a profile and an already-resolved
/// password. `default_timeout` applies when the profile has no override.
pub fn profile_to_integration_config(
    profile: &Profile,
    password: SecretString,
    default_timeout: u64,
) -> Result<IntegrationConfig, ConfigError> {
    if profile.username.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "username".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut config = IntegrationConfig::new(profile.username.trim(), password)
        .map_err(|e| ConfigError::Validation {
            field: "base_url".into(),
            reason: e.to_string(),
        })?
        .with_expiration(profile.expiration)
        .with_timeout(Duration::from_secs(profile.timeout.unwrap_or(default_timeout)));

    if let Some(ref raw) = profile.base_url {
        let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
        config = config.with_base_url(url);
    }

    config.ca_cert.clone_from(&profile.ca_cert);
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            username: "me@example.com".into(),
            password: Some("plain".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn password_prefers_env_then_keyring_then_plaintext() {
        let p = profile();

        let pw = resolve_password_with(&p, "home", Some("from-env".into()), |_| {
            Some("from-keyring".into())
        })
        .unwrap();
        assert_eq!(pw.expose_secret(), "from-env");

        let pw = resolve_password_with(&p, "home", None, |name| {
            assert_eq!(name, "home");
            Some("from-keyring".into())
        })
        .unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");

        let pw = resolve_password_with(&p, "home", Some(String::new()), |_| None).unwrap();
        assert_eq!(pw.expose_secret(), "plain");
    }

    #[test]
    fn missing_password_is_an_error() {
        let p = Profile {
            password: None,
            ..profile()
        };
        let err = resolve_password_with(&p, "home", None, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { profile } if profile == "home"));
    }

    #[test]
    fn profile_translates_to_integration_config() {
        let p = Profile {
            base_url: Some("http://127.0.0.1:8080".into()),
            expiration: 3600,
            timeout: Some(3),
            ..profile()
        };
        let config = profile_to_integration_config(&p, SecretString::from("pw"), 10).unwrap();
        assert_eq!(config.username, "me@example.com");
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.expiration, 3600);
        assert_eq!(config.timeout, Duration::from_secs(3));

        let config = profile_to_integration_config(&profile(), SecretString::from("pw"), 7).unwrap();
        assert_eq!(config.base_url.as_str(), "https://cuby.cloud/");
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn rejects_bad_profiles() {
        let p = Profile {
            base_url: Some("not a url".into()),
            ..profile()
        };
        assert!(matches!(
            profile_to_integration_config(&p, SecretString::from("pw"), 10),
            Err(ConfigError::Validation { .. })
        ));

        let p = Profile {
            username: " ".into(),
            ..profile()
        };
        assert!(profile_to_integration_config(&p, SecretString::from("pw"), 10).is_err());
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), profile());
        cfg.default_profile = Some("home".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (name, p) = loaded.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(p.username, "me@example.com");
        assert_eq!(loaded.defaults.timeout, 10);
        assert!(matches!(
            loaded.profile(Some("office")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
        assert!(loaded.profiles.is_empty());
        assert_eq!(loaded.defaults.output, "table");
    }
}
