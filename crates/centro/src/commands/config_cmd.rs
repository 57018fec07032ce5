//! Config subcommand handlers.

use dialoguer::{Input, Select};

use centro_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Copy of `cfg` safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    if cfg.portal.password.is_some() {
        cfg.portal.password = Some(REDACTED.into());
    }
    if cfg.telemetry.password.is_some() {
        cfg.telemetry.password = Some(REDACTED.into());
    }
    cfg
}

fn prompt_password() -> Result<String, CliError> {
    let password = rpassword::prompt_password("Portal password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(password)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let toml_str = toml::to_string_pretty(&cfg).map_err(|e| CliError::Config {
                message: format!("failed to serialize config: {e}"),
            })?;
            let out = output::render_single(
                global.output,
                &cfg,
                |_| toml_str.trim_end().to_owned(),
                |_| toml_str.trim_end().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::path(global).display());
            Ok(())
        }

        ConfigCommand::SetPassword { email } => {
            let email = match email {
                Some(email) => email,
                None => config::load(global)?.portal.email.ok_or_else(|| {
                    CliError::MissingConfig {
                        field: "portal.email".into(),
                        path: config::path(global).display().to_string(),
                    }
                })?,
            };
            let password = prompt_password()?;
            centro_config::store_password(&email, &password)?;
            eprintln!("✓ Password for {email} stored in system keyring");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::path(global);
    let mut cfg = config::load(global).unwrap_or_default();

    eprintln!("centro configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    // 1. Portal account
    let mut email_input = Input::<String>::new().with_prompt("Portal account email");
    if let Some(ref existing) = cfg.portal.email {
        email_input = email_input.default(existing.clone());
    }
    let email = email_input.interact_text().map_err(prompt_err)?;
    if email.trim().is_empty() {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: "email cannot be empty".into(),
        });
    }

    // 2. Installation
    let install_id: String = Input::new()
        .with_prompt("Installation id")
        .default(cfg.portal.install_id.clone())
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Password and where it lives
    let password = prompt_password()?;
    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    cfg.portal.password = if store_selection == 0 {
        centro_config::store_password(&email, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    // 4. Telemetry
    let device_id: String = Input::new()
        .with_prompt("WiFi module device id (empty disables telemetry)")
        .default(cfg.telemetry.device_id.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let device_id = device_id.trim().to_owned();
    cfg.telemetry.enabled = !device_id.is_empty();
    cfg.telemetry.device_id = (!device_id.is_empty()).then_some(device_id);

    cfg.portal.email = Some(email.trim().to_owned());
    cfg.portal.install_id = install_id.trim().to_owned();

    centro_config::save_config_to(&cfg, &path)?;
    eprintln!("\n   ✓ Config written to {}", path.display());
    eprintln!("   Verify with: centro login");
    Ok(())
}
