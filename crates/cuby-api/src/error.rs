use thiserror::Error;

/// Top-level error type for the `cuby-api` crate.
///
/// Each variant is a distinct failure class so callers can tell a rejected
/// credential apart from an unreachable cloud or a locally rejected value.
/// `cuby-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token request rejected, or a bearer token was refused by the API.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured base URL cannot carry a path.
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// The requested device or resource does not exist (HTTP 404).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-success response from the Cuby API.
    #[error("Cuby API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Local validation ────────────────────────────────────────────
    /// A command value outside the accepted vocabulary. Never sent.
    #[error("Invalid {field} '{value}': expected one of {allowed}")]
    InvalidValue {
        field: &'static str,
        value: String,
        allowed: String,
    },

    /// A state update with no recognized parameters. Never sent.
    #[error("No valid state parameters provided")]
    EmptyUpdate,
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient network-level failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the error was raised locally, before any request.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(self, Self::InvalidValue { .. } | Self::EmptyUpdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        let auth = Error::Authentication {
            message: "bad password".into(),
        };
        assert!(auth.is_auth_error());
        assert!(!auth.is_transient());

        assert!(Error::Timeout { timeout_secs: 10 }.is_transient());
        assert!(
            Error::Api {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(
            !Error::Api {
                status: 400,
                message: "bad request".into()
            }
            .is_transient()
        );

        assert!(
            Error::NotFound {
                resource: "/api/v2/devices/x".into()
            }
            .is_not_found()
        );
        assert!(Error::EmptyUpdate.is_rejected_locally());
    }
}
