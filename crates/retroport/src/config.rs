//! CLI configuration: thin wrapper around `retroport_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` / `SetupArgs`
//! flag overrides on top of the active profile.

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::Input;
use secrecy::SecretString;

use retroport_api::TlsMode;
use retroport_core::{Credentials, EngineConfig, RouterConfig};

use crate::cli::{GlobalOpts, SetupArgs};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use retroport_config::{
    Config, Profile, config_path, load_config_or_default, resolve_password, save_config,
    store_password,
};

// ── Profile selection ───────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile, if any. An explicit `--profile` that does not
/// exist is an error; a missing default profile is not.
pub fn active_profile<'a>(
    global: &GlobalOpts,
    config: &'a Config,
) -> Result<Option<(&'a str, &'a Profile)>, CliError> {
    config.profile(global.profile.as_deref()).map_err(|_| {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        CliError::ProfileNotFound {
            name: global.profile.clone().unwrap_or_default(),
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        }
    })
}

// ── Engine settings ─────────────────────────────────────────────────

/// Engine settings from config with the global transport flags applied.
pub fn base_engine_config(
    config: &Config,
    profile: Option<&Profile>,
    global: &GlobalOpts,
) -> Result<EngineConfig, CliError> {
    let mut engine = config.engine_config(profile)?;

    if let Some(secs) = global.timeout {
        engine.transport.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = global.retries {
        engine.transport.retries = retries;
    }
    if global.secure && !matches!(engine.transport.tls, TlsMode::CustomCa(_)) {
        engine.transport.tls = TlsMode::System;
    }
    Ok(engine)
}

/// Engine settings for `setup`: global flags, then setup flags.
pub fn engine_config(
    config: &Config,
    profile: Option<&Profile>,
    global: &GlobalOpts,
    args: &SetupArgs,
) -> Result<EngineConfig, CliError> {
    let mut engine = base_engine_config(config, profile, global)?;

    if let Some(ref raw) = args.admin_url {
        engine.transport.origin_override =
            Some(raw.parse().map_err(|e| CliError::Validation {
                field: "admin-url".into(),
                reason: format!("invalid URL '{raw}': {e}"),
            })?);
    }
    if args.games {
        engine.ports.include_game_ports = true;
    }

    Ok(engine)
}

// ── Request building ────────────────────────────────────────────────

/// Build a setup request. Flags win over the profile; anything still
/// missing is prompted for on a terminal.
pub fn setup_request(
    args: &SetupArgs,
    profile: Option<(&str, &Profile)>,
) -> Result<RouterConfig, CliError> {
    let (profile_name, profile) = match profile {
        Some((name, p)) => (name, Some(p)),
        None => ("default", None),
    };

    let console = args
        .console
        .or_else(|| profile.and_then(|p| p.console))
        .ok_or_else(|| CliError::Validation {
            field: "console".into(),
            reason: "pass --console saturn|dreamcast or set it in the profile".into(),
        })?;

    let router_type = args
        .router
        .clone()
        .or_else(|| profile.map(|p| p.router_type.clone()).filter(|t| !t.is_empty()))
        .ok_or_else(|| CliError::Validation {
            field: "router".into(),
            reason: "pass --router (see `retroport vendors`) or set router_type in the profile"
                .into(),
        })?;

    let username = resolve_username(args, profile)?;
    let password = resolve_password_with_flag(args, profile, profile_name)?;

    let mut request = RouterConfig::new(console, router_type, Credentials::new(username, password));
    request.target_device = args.target.or_else(|| profile.and_then(|p| p.target));
    request.router_ip = args
        .ip
        .clone()
        .or_else(|| profile.and_then(|p| p.router_ip.clone()));
    Ok(request)
}

fn interactive() -> bool {
    std::io::stdin().is_terminal()
}

fn resolve_username(args: &SetupArgs, profile: Option<&Profile>) -> Result<String, CliError> {
    if let Some(user) = args
        .username
        .clone()
        .or_else(|| profile.and_then(|p| p.username.clone()))
    {
        return Ok(user);
    }
    if interactive() {
        return Input::new()
            .with_prompt("Router username")
            .default("admin".into())
            .interact_text()
            .map_err(prompt_err);
    }
    Err(CliError::Validation {
        field: "username".into(),
        reason: "pass --username or set it in the profile".into(),
    })
}

/// `--password-env` first, then the shared resolution chain, then a
/// terminal prompt.
fn resolve_password_with_flag(
    args: &SetupArgs,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Result<SecretString, CliError> {
    if let Some(ref var) = args.password_env {
        return std::env::var(var)
            .map(SecretString::from)
            .map_err(|_| CliError::MissingEnv { var: var.clone() });
    }

    let resolved = match profile {
        Some(p) => resolve_password(p, profile_name).ok(),
        None => std::env::var(retroport_config::PASSWORD_ENV)
            .ok()
            .map(SecretString::from),
    };
    if let Some(secret) = resolved {
        return Ok(secret);
    }

    if interactive() {
        let pass = rpassword::prompt_password("Router password: ").map_err(prompt_err)?;
        return Ok(SecretString::from(pass));
    }
    Err(CliError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Map a dialoguer / interactive I/O failure into `CliError`.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
