//! Configuration for the centro CLI.
//!
//! TOML file plus `CENTRO_*` environment overrides, password resolution
//! (env, keyring, plaintext), and translation to
//! `centro_core::ControllerConfig`. Core never reads config files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use centro_api::BrokerConfig;
use centro_api::portal::{DEFAULT_INSTALL_ID, DEFAULT_PORTAL_URL};
use centro_core::config::DEFAULT_REFRESH_INTERVAL_SECS;
use centro_core::{ControllerConfig, TlsVerification};

/// Keyring service under which portal passwords are stored.
pub const KEYRING_SERVICE: &str = "centro";

/// Environment variable consulted first for the portal password.
pub const PASSWORD_ENV: &str = "CENTRO_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing {field}: set it in the config file or environment")]
    Missing { field: String },

    #[error("no portal password found (tried $CENTRO_PASSWORD, keyring, config file)")]
    NoPassword,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalSection,

    #[serde(default)]
    pub telemetry: TelemetrySection,

    /// Seconds between full refreshes; 0 disables the periodic refresh.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: PortalSection::default(),
            telemetry: TelemetrySection::default(),
            refresh_interval_secs: default_refresh_interval(),
            defaults: Defaults::default(),
        }
    }
}

/// Web portal account and installation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PortalSection {
    #[serde(default = "default_portal_url")]
    pub url: String,

    pub email: Option<String>,

    /// Password (plaintext -- prefer keyring or `CENTRO_PASSWORD`).
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,

    #[serde(default = "default_install_id", deserialize_with = "lenient_string")]
    pub install_id: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            url: default_portal_url(),
            email: None,
            password: None,
            install_id: default_install_id(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

/// Telemetry broker settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetrySection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Physical unit identifier printed on the boiler's WiFi module.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub device_id: Option<String>,

    #[serde(default = "default_broker_host")]
    pub host: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    #[serde(default = "default_broker_username")]
    pub username: String,

    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,

    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            enabled: true,
            device_id: None,
            host: default_broker_host(),
            port: default_broker_port(),
            username: default_broker_username(),
            password: None,
            keep_alive: default_keep_alive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.into()
}
fn default_install_id() -> String {
    DEFAULT_INSTALL_ID.into()
}
fn default_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_broker_host() -> String {
    BrokerConfig::DEFAULT_HOST.into()
}
fn default_broker_port() -> u16 {
    BrokerConfig::DEFAULT_PORT
}
fn default_broker_username() -> String {
    BrokerConfig::DEFAULT_USERNAME.into()
}
fn default_keep_alive() -> u64 {
    60
}
fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

// ── Lenient strings ─────────────────────────────────────────────────

/// Env overrides are parsed as TOML-ish values, so `CENTRO_PORTAL__INSTALL_ID=1844`
/// arrives as an integer. Identifiers and passwords accept either form.
/// Leading zeros are lost in that parse; quote the value to keep them.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Unsigned(n) => n.to_string(),
            StringOrNumber::Signed(n) => n.to_string(),
            StringOrNumber::Float(n) => n.to_string(),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("hr", "centrometal", "centro").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("centro");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path` (or the canonical path) plus `CENTRO_*` env vars.
///
/// Nested keys use a double underscore: `CENTRO_PORTAL__EMAIL`,
/// `CENTRO_TELEMETRY__DEVICE_ID`. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    load_config_from(&path)
}

/// Load from an explicit file plus environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CENTRO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

/// Portal password: `CENTRO_PASSWORD`, then the keyring, then plaintext.
pub fn resolve_password(portal: &PortalSection) -> Result<SecretString, ConfigError> {
    let env = std::env::var(PASSWORD_ENV).ok();
    let keyring = || {
        let email = portal.email.as_deref()?;
        keyring::Entry::new(KEYRING_SERVICE, email)
            .and_then(|entry| entry.get_password())
            .ok()
    };
    pick_password(env, keyring, portal.password.as_deref()).ok_or(ConfigError::NoPassword)
}

fn pick_password(
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    env.filter(|pw| !pw.is_empty())
        .or_else(keyring)
        .or_else(|| plaintext.map(str::to_owned))
        .map(SecretString::from)
}

/// Store the portal password for `email` in the system keyring.
pub fn store_password(email: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, email)?.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Broker settings, or `None` when telemetry is disabled.
pub fn broker_config(telemetry: &TelemetrySection) -> Result<Option<BrokerConfig>, ConfigError> {
    if !telemetry.enabled {
        return Ok(None);
    }
    let device_id = telemetry
        .device_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing {
            field: "telemetry.device_id".into(),
        })?;

    let mut broker = BrokerConfig::new(device_id);
    broker.host.clone_from(&telemetry.host);
    broker.port = telemetry.port;
    broker.username.clone_from(&telemetry.username);
    if let Some(ref pw) = telemetry.password {
        broker.password = SecretString::from(pw.clone());
    }
    broker.keep_alive = Duration::from_secs(telemetry.keep_alive);
    Ok(Some(broker))
}

/// Build a `ControllerConfig`, resolving the password.
pub fn to_controller_config(cfg: &Config) -> Result<ControllerConfig, ConfigError> {
    let portal = &cfg.portal;

    let portal_url: url::Url = portal.url.parse().map_err(|_| ConfigError::Validation {
        field: "portal.url".into(),
        reason: format!("invalid URL: {}", portal.url),
    })?;

    let email = portal
        .email
        .clone()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing {
            field: "portal.email".into(),
        })?;

    if portal.install_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "portal.install_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let password = resolve_password(portal)?;

    let tls = if portal.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = portal.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ControllerConfig {
        portal_url,
        install_id: portal.install_id.clone(),
        email,
        password,
        tls,
        timeout: Duration::from_secs(portal.timeout),
        refresh_interval_secs: cfg.refresh_interval_secs,
        telemetry: broker_config(&cfg.telemetry)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("absent.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.portal.url, "https://portal.centrometal.hr");
            assert_eq!(cfg.portal.install_id, "1844");
            assert_eq!(cfg.portal.timeout, 10);
            assert_eq!(cfg.refresh_interval_secs, 60);
            assert!(cfg.telemetry.enabled);
            assert_eq!(cfg.telemetry.port, 1883);
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
refresh_interval_secs = 120

[portal]
email = "owner@example.com"
password = "hunter2"
timeout = 5

[telemetry]
device_id = "AD53C83A"
keep_alive = 30
"#,
            )?;

            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.refresh_interval_secs, 120);
            assert_eq!(cfg.portal.email.as_deref(), Some("owner@example.com"));
            assert_eq!(cfg.portal.install_id, "1844");
            assert_eq!(cfg.telemetry.device_id.as_deref(), Some("AD53C83A"));
            assert_eq!(cfg.telemetry.keep_alive, 30);
            assert_eq!(cfg.telemetry.host, "136.243.62.164");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[portal]\nemail = \"file@example.com\"\n")?;
            jail.set_env("CENTRO_PORTAL__EMAIL", "env@example.com");
            jail.set_env("CENTRO_REFRESH_INTERVAL_SECS", "30");

            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.portal.email.as_deref(), Some("env@example.com"));
            assert_eq!(cfg.refresh_interval_secs, 30);
            Ok(())
        });
    }

    #[test]
    fn numeric_env_values_stay_strings() {
        Jail::expect_with(|jail| {
            jail.set_env("CENTRO_PORTAL__INSTALL_ID", "2077");
            jail.set_env("CENTRO_PORTAL__PASSWORD", "123456");
            jail.set_env("CENTRO_TELEMETRY__DEVICE_ID", "10203040");

            let cfg = load_config_from(&jail.directory().join("absent.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.portal.install_id, "2077");
            assert_eq!(cfg.portal.password.as_deref(), Some("123456"));
            assert_eq!(cfg.telemetry.device_id.as_deref(), Some("10203040"));
            Ok(())
        });
    }

    #[test]
    fn save_then_load_preserves_sections() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join("config.toml");
            let mut cfg = Config::default();
            cfg.portal.email = Some("owner@example.com".into());
            cfg.telemetry.device_id = Some("AD53C83A".into());
            cfg.telemetry.enabled = false;

            save_config_to(&cfg, &path).map_err(|e| e.to_string())?;
            let loaded = load_config_from(&path).map_err(|e| e.to_string())?;

            assert_eq!(loaded.portal, cfg.portal);
            assert_eq!(loaded.telemetry, cfg.telemetry);
            Ok(())
        });
    }

    #[test]
    fn password_chain_prefers_env_then_keyring() {
        let pw = pick_password(Some("from-env".into()), || Some("from-keyring".into()), Some("plain"));
        assert_eq!(pw.unwrap().expose_secret(), "from-env");

        let pw = pick_password(None, || Some("from-keyring".into()), Some("plain"));
        assert_eq!(pw.unwrap().expose_secret(), "from-keyring");

        let pw = pick_password(Some(String::new()), || None, Some("plain"));
        assert_eq!(pw.unwrap().expose_secret(), "plain");

        assert!(pick_password(None, || None, None).is_none());
    }

    #[test]
    fn disabled_telemetry_needs_no_device() {
        let section = TelemetrySection {
            enabled: false,
            ..TelemetrySection::default()
        };
        assert!(broker_config(&section).unwrap().is_none());
    }

    #[test]
    fn enabled_telemetry_requires_device_id() {
        let result = broker_config(&TelemetrySection::default());
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn broker_settings_are_carried_over() {
        let section = TelemetrySection {
            device_id: Some("AD53C83A".into()),
            port: 8883,
            keep_alive: 15,
            ..TelemetrySection::default()
        };

        let broker = broker_config(&section).unwrap().unwrap();

        assert_eq!(broker.topic(), "cm/inst/biotec/AD53C83A");
        assert_eq!(broker.port, 8883);
        assert_eq!(broker.keep_alive, Duration::from_secs(15));
        assert_eq!(broker.password.expose_secret(), "appuser");
    }

    #[test]
    fn controller_config_requires_email() {
        let result = to_controller_config(&Config::default());
        assert!(matches!(result, Err(ConfigError::Missing { ref field }) if field == "portal.email"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let mut cfg = Config::default();
        cfg.portal.url = "not a url".into();
        assert!(matches!(
            to_controller_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }
}
