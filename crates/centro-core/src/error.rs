// ── Core error types ──
//
// User-facing errors from centro-core. Consumers never see HTTP status
// codes or JSON parse failures directly: `From<centro_api::Error>`
// translates transport errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to portal at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Could not authenticate: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Portal request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("No data available from telemetry or portal")]
    NoData,

    #[error("Point not found: {identifier}")]
    PointNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Command rejected by portal: {message}")]
    Rejected { message: String },

    #[error("Value {value} out of range for {point} ({min}..={max})")]
    OutOfRange {
        point: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<centro_api::Error> for CoreError {
    fn from(err: centro_api::Error) -> Self {
        match err {
            centro_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            centro_api::Error::Transport(ref e) => {
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
            centro_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            centro_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            centro_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            centro_api::Error::Http { status } => CoreError::Api {
                message: format!("portal returned HTTP {status}"),
                status: Some(status),
            },
            centro_api::Error::CommandRejected { message } => CoreError::Rejected { message },
            centro_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
