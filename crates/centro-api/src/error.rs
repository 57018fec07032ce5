use thiserror::Error;

/// Top-level error type for the `centro-api` crate.
///
/// Covers every failure mode of both acquisition paths: portal
/// authentication, HTTP transport, control commands and status decoding.
/// Broker trouble is retried inside the telemetry loop and only logged.
/// `centro-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed: anti-forgery token missing or login not redirected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Portal answered with an unexpected HTTP status.
    #[error("Portal returned HTTP {status}")]
    Http { status: u16 },

    // ── Control ─────────────────────────────────────────────────────
    /// Control call answered, but without `"status": "success"`.
    #[error("Command rejected by portal: {message}")]
    CommandRejected { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON decoding failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the portal session should be dropped and
    /// re-established before the next call.
    pub fn invalidates_session(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::Tls(_))
    }

    /// Returns `true` if this is a transient network failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        assert!(Error::Http { status: 500 }.is_transient());
        assert!(Error::Http { status: 503 }.is_transient());
        assert!(!Error::Http { status: 404 }.is_transient());
    }

    #[test]
    fn rejected_command_drops_session() {
        let err = Error::CommandRejected {
            message: "error".into(),
        };
        assert!(err.invalidates_session());
        assert!(!err.is_transient());
        assert!(!Error::Tls("bad cert".into()).invalidates_session());
    }

    #[test]
    fn auth_errors_are_classified() {
        let err = Error::Authentication {
            message: "no token".into(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Authentication failed: no token");
    }
}
