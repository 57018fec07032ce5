//! Bridges `centro-config` and the global CLI flags.
//!
//! This is the single place where CLI overrides meet the config file
//! before crossing into `centro_core::ControllerConfig`.

use std::path::PathBuf;

use centro_config::{Config, ConfigError};
use centro_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` / `CENTRO_CONFIG`, else the platform path.
pub fn path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(centro_config::config_path)
}

/// Load the config file (missing file means defaults) plus environment.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(centro_config::load_config(Some(&path(global)))?)
}

/// How long a command stays connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// Connect, do one thing, disconnect. Portal pulls only.
    OneShot,
    /// Stay connected with telemetry and periodic refresh.
    LongRunning,
}

/// Apply CLI flags on top of the loaded config.
pub fn apply_overrides(cfg: &mut Config, global: &GlobalOpts, session: Session) {
    if let Some(secs) = global.timeout {
        cfg.portal.timeout = secs;
    }
    if global.insecure {
        cfg.portal.insecure = true;
    }
    if global.no_telemetry || session == Session::OneShot {
        cfg.telemetry.enabled = false;
    }
    if session == Session::OneShot {
        cfg.refresh_interval_secs = 0;
    }
}

/// Build the controller config for a session.
pub fn controller_config(
    global: &GlobalOpts,
    session: Session,
) -> Result<ControllerConfig, CliError> {
    let mut cfg = load(global)?;
    apply_overrides(&mut cfg, global, session);
    centro_config::to_controller_config(&cfg).map_err(|e| match e {
        ConfigError::Missing { field } => CliError::MissingConfig {
            field,
            path: path(global).display().to_string(),
        },
        other => other.into(),
    })
}
