// ── Core error types ──
//
// User-facing errors from cuby-core. Adapters and the setup flow react to
// these variants (reconnect UI vs. silent retry) instead of guessing from a
// falsy return value. `From<cuby_api::Error>` translates transport-layer
// errors into domain variants.

use thiserror::Error;

use crate::entity::HvacMode;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Cuby cloud at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request to Cuby cloud timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("HVAC mode '{mode}' is not supported by Cuby devices")]
    UnsupportedHvacMode { mode: HvacMode },

    #[error("Fan mode '{mode}' is not supported by Cuby devices")]
    UnsupportedFanMode { mode: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation rejected by Cuby cloud: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether the user has to fix credentials before anything will work.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Whether the failure is likely to clear up on the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Api { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cuby_api::Error> for CoreError {
    fn from(err: cuby_api::Error) -> Self {
        match err {
            cuby_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            cuby_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            cuby_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cuby_api::Error::InvalidBaseUrl { url } => CoreError::Config {
                message: format!("Invalid base URL: {url}"),
            },
            cuby_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            cuby_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            cuby_api::Error::NotFound { resource } => CoreError::DeviceNotFound {
                identifier: resource,
            },
            cuby_api::Error::Api { status, message } if status < 500 => {
                CoreError::Rejected { message }
            }
            cuby_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            cuby_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unreadable response: {message}"),
                status: None,
            },
            err @ (cuby_api::Error::InvalidValue { .. } | cuby_api::Error::EmptyUpdate) => {
                CoreError::ValidationFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_api_errors() {
        let err: CoreError = cuby_api::Error::Authentication {
            message: "nope".into(),
        }
        .into();
        assert!(err.requires_reauth());

        let err: CoreError = cuby_api::Error::Api {
            status: 400,
            message: "busy".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Rejected { .. }));

        let err: CoreError = cuby_api::Error::Api {
            status: 503,
            message: "maintenance".into(),
        }
        .into();
        assert!(err.is_transient());

        let err: CoreError = cuby_api::Error::EmptyUpdate.into();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));

        let err: CoreError = cuby_api::Error::NotFound {
            resource: "/api/v2/devices/x".into(),
        }
        .into();
        assert!(matches!(err, CoreError::DeviceNotFound { .. }));
    }
}
