//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use centro_config::ConfigError;
use centro_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONFIG: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the portal at {url}")]
    #[diagnostic(
        code(centro::connection_failed),
        help(
            "Check network access to the portal.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Not connected to the portal")]
    #[diagnostic(code(centro::disconnected))]
    Disconnected,

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(centro::timeout),
        help("Increase the timeout with --timeout or check portal responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Could not authenticate: {message}")]
    #[diagnostic(
        code(centro::auth_failed),
        help(
            "Verify the email and password used for the Centrometal web portal.\n\
             Update the stored password with: centro config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No portal password configured")]
    #[diagnostic(
        code(centro::no_password),
        help(
            "Set CENTRO_PASSWORD, run `centro config set-password`,\n\
             or add `password` to the [portal] section of the config file."
        )
    )]
    NoPassword,

    // ── Data / points ────────────────────────────────────────────────
    #[error("No data received from the boiler")]
    #[diagnostic(
        code(centro::no_data),
        help(
            "The portal returned no status and no telemetry arrived.\n\
             Check that the installation id is correct and the boiler is online."
        )
    )]
    NoData,

    #[error("{kind} '{identifier}' not found")]
    #[diagnostic(
        code(centro::not_found),
        help("Run `centro points` to list the available points.")
    )]
    NotFound { kind: String, identifier: String },

    #[error("Value {value} is out of range for {point}")]
    #[diagnostic(code(centro::out_of_range), help("Allowed range: {min} to {max}"))]
    OutOfRange {
        point: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("The portal did not accept the command for {point}")]
    #[diagnostic(
        code(centro::command_failed),
        help("Run with -v to see the portal's response.")
    )]
    CommandFailed { point: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Portal error: {message}")]
    #[diagnostic(code(centro::api_error))]
    Api { message: String },

    // ── Configuration / validation ───────────────────────────────────
    #[error("Missing configuration value: {field}")]
    #[diagnostic(
        code(centro::missing_config),
        help(
            "Create a config with: centro config init\n\
             Expected at: {path}"
        )
    )]
    MissingConfig { field: String, path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(centro::config))]
    Config { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(centro::validation))]
    Validation { field: String, reason: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoPassword => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::CommandFailed { .. } => exit_code::REJECTED,
            Self::MissingConfig { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::OutOfRange { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::NoData | Self::Api { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }

    pub fn point_not_found(identifier: &str) -> Self {
        Self::NotFound {
            kind: "point".into(),
            identifier: identifier.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::ControllerDisconnected => Self::Disconnected,
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::NoData => Self::NoData,
            CoreError::PointNotFound { identifier } => Self::point_not_found(&identifier),
            CoreError::OutOfRange {
                point,
                value,
                min,
                max,
            } => Self::OutOfRange {
                point,
                value,
                min,
                max,
            },
            CoreError::Rejected { message } => Self::Api {
                message: format!("command rejected: {message}"),
            },
            CoreError::Api { message, .. } | CoreError::Internal(message) => Self::Api { message },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { field } => Self::MissingConfig {
                field,
                path: centro_config::config_path().display().to_string(),
            },
            ConfigError::NoPassword => Self::NoPassword,
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
