// ── Runtime connection configuration ──
//
// These types describe how to reach the portal and the telemetry broker.
// They carry credentials and tuning but never touch disk: the CLI builds a
// `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use centro_api::BrokerConfig;
use centro_api::portal::DEFAULT_INSTALL_ID;
use centro_api::transport::{DEFAULT_TIMEOUT, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// Default interval between full refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// TLS verification strategy for the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). The vendor portal has a public certificate.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub(crate) fn to_transport(&self) -> TlsMode {
        match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one boiler installation.
///
/// Built by the CLI, passed to [`Controller`](crate::Controller).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Portal base URL (e.g. `https://portal.centrometal.hr`).
    pub portal_url: Url,
    /// Installation the commands are addressed to.
    pub install_id: String,
    /// Portal account e-mail.
    pub email: String,
    /// Portal account password.
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often to perform a full refresh (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Telemetry broker settings; `None` runs on the pull path alone.
    pub telemetry: Option<BrokerConfig>,
}

impl ControllerConfig {
    /// Settings for the given portal and account, with default install id,
    /// timeout and refresh interval. Telemetry starts disabled.
    pub fn new(portal_url: Url, email: impl Into<String>, password: SecretString) -> Self {
        Self {
            portal_url,
            install_id: DEFAULT_INSTALL_ID.into(),
            email: email.into(),
            password,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            telemetry: None,
        }
    }

    /// Transport settings for the portal client.
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.to_transport(),
            ..TransportConfig::default()
        }
        .with_timeout(self.timeout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_defaults() {
        let url = Url::parse("https://portal.example").unwrap();
        let config = ControllerConfig::new(url, "owner@example.com", String::new().into());

        assert_eq!(config.install_id, DEFAULT_INSTALL_ID);
        assert_eq!(config.refresh_interval_secs, 60);
        assert!(config.telemetry.is_none());
    }

    #[test]
    fn transport_carries_timeout_and_tls() {
        let mut config = ControllerConfig::new(
            Url::parse("https://portal.example").unwrap(),
            "owner@example.com",
            String::new().into(),
        );
        config.timeout = Duration::from_secs(3);
        config.tls = TlsVerification::DangerAcceptInvalid;

        let transport = config.transport();
        assert_eq!(transport.timeout, Duration::from_secs(3));
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert!(transport.cookie_jar.is_none());
    }
}
