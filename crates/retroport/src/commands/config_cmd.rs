//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;
use strum::IntoEnumIterator;

use retroport_api::catalog;
use retroport_core::{Console, TargetDevice};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, prompt_err};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

fn select_enum<T: IntoEnumIterator + ToString>(prompt: &str) -> Result<T, CliError> {
    let items: Vec<T> = T::iter().collect();
    let labels: Vec<String> = items.iter().map(ToString::to_string).collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    items.into_iter().nth(idx).ok_or_else(|| prompt_err("selection out of range"))
}

/// A copy of `cfg` with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(cfg),

        ConfigCommand::Show => {
            let shown = redacted(cfg);
            let out = output::render_single(
                &global.output(),
                &shown,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| c.default_profile.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: available_profiles(cfg),
                });
            }

            let secret = rpassword::prompt_password("Router password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, &SecretString::from(secret))?;

            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(existing: &Config) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("retroport configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Router vendor
    let vendors = catalog::all();
    let labels: Vec<String> = vendors
        .iter()
        .map(|p| format!("{} ({})", p.name, p.id))
        .collect();
    let idx = Select::new()
        .with_prompt("Router")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let router_type = vendors
        .get(idx)
        .map(|p| p.id.to_owned())
        .ok_or_else(|| prompt_err("selection out of range"))?;

    // 3. Router address, blank for gateway discovery
    let router_ip: String = Input::new()
        .with_prompt("Router IP (blank to discover)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    // 4. Credentials
    let username: String = Input::new()
        .with_prompt("Router username")
        .default("admin".into())
        .interact_text()
        .map_err(prompt_err)?;
    let pass = rpassword::prompt_password("Router password: ").map_err(prompt_err)?;
    if pass.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

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
    let password = if store_selection == 0 {
        config::store_password(&profile_name, &SecretString::from(pass))?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(pass)
    };

    // 5. Console and target
    let console: Console = select_enum("Console")?;
    let target: TargetDevice = select_enum("Forward to")?;

    // 6. Merge into the existing config and write
    let mut cfg = existing.clone();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            router_type,
            router_ip: Some(router_ip).filter(|ip| !ip.trim().is_empty()),
            admin_url: None,
            username: Some(username),
            password,
            password_env: None,
            console: Some(console),
            target: Some(target),
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Try it: retroport setup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                router_type: "ASUS".into(),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["home"].password.as_deref(), Some("********"));
        assert_eq!(available_profiles(&cfg), "home");
        assert_eq!(available_profiles(&Config::default()), "(none)");
    }
}
