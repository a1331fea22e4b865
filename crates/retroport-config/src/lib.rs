//! Shared configuration for retroport front ends.
//!
//! TOML profiles, router password resolution (env + keyring + plaintext),
//! and translation to `retroport_core::EngineConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use retroport_api::{PortRule, Protocol, TlsMode, TransportConfig};
use retroport_core::{Console, DiscoveryConfig, EngineConfig, PortCatalog, TargetDevice};

/// Keyring service name for stored router passwords.
pub const KEYRING_SERVICE: &str = "retroport";

/// Environment variable consulted for the router password.
pub const PASSWORD_ENV: &str = "RETROPORT_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

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
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub discovery: Discovery,

    #[serde(default)]
    pub ports: Ports,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            discovery: Discovery::default(),
            ports: Ports::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retries after a connect error or timeout.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Verify router TLS certificates. Most admin panels are self-signed.
    #[serde(default)]
    pub verify_tls: bool,

    /// Extra CA certificate to trust, implies verification.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,

    /// Upper bound on one setup, seconds.
    #[serde(default = "default_deadline")]
    pub deadline: u64,

    /// Append logs to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            retries: default_retries(),
            max_redirects: default_max_redirects(),
            verify_tls: false,
            ca_cert: None,
            login_attempts: default_login_attempts(),
            deadline: default_deadline(),
            log_file: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    5
}
fn default_retries() -> u32 {
    2
}
fn default_max_redirects() -> usize {
    5
}
fn default_login_attempts() -> u32 {
    3
}
fn default_deadline() -> u64 {
    120
}

/// DreamPi LAN scan tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Discovery {
    #[serde(default = "default_probe_ports")]
    pub probe_ports: Vec<u16>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            probe_ports: default_probe_ports(),
            connect_timeout_ms: default_connect_timeout_ms(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_probe_ports() -> Vec<u16> {
    retroport_core::config::DREAMPI_PROBE_PORTS.to_vec()
}
fn default_connect_timeout_ms() -> u64 {
    150
}
fn default_concurrency() -> usize {
    64
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Ports {
    /// Also open the per-game Dreamcast ports.
    #[serde(default)]
    pub include_game_ports: bool,

    #[serde(default)]
    pub extra: Vec<ExtraRule>,
}

/// A rule added on top of the console's set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtraRule {
    /// `tcp` or `udp`, any case.
    pub protocol: String,
    pub port: u16,
    /// Defaults to `port`.
    pub internal_port: Option<u16>,
}

impl ExtraRule {
    pub fn to_rule(&self) -> Result<PortRule, ConfigError> {
        let protocol: Protocol = self.protocol.parse().map_err(|_| ConfigError::Validation {
            field: "ports.extra.protocol".into(),
            reason: format!("expected 'tcp' or 'udp', got '{}'", self.protocol),
        })?;
        let rule = PortRule {
            internal: self.internal_port.unwrap_or(self.port),
            ..PortRule::new(protocol, self.port)
        };
        if !rule.is_valid() {
            return Err(ConfigError::Validation {
                field: "ports.extra.port".into(),
                reason: "ports must be between 1 and 65535".into(),
            });
        }
        Ok(rule)
    }
}

/// A named router profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Vendor id, e.g. "ASUS", or "manual".
    pub router_type: String,

    /// Router LAN address. Discovered from the default gateway when absent.
    pub router_ip: Option<String>,

    /// Admin origin override for panels on a non-standard port
    /// (e.g. "http://192.168.1.1:8080").
    pub admin_url: Option<String>,

    pub username: Option<String>,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    pub console: Option<Console>,

    pub target: Option<TargetDevice>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "retroport", "retroport").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("retroport");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then `path`, then `RETROPORT_*` variables (`__` separates
/// nesting levels, e.g. `RETROPORT_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RETROPORT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profiles ────────────────────────────────────────────────────────

impl Config {
    /// The profile named `name`, or the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        match name {
            Some(name) => self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| Some((k.as_str(), p)))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() }),
            None => Ok(self
                .default_profile
                .as_deref()
                .and_then(|name| self.profiles.get_key_value(name))
                .map(|(k, p)| (k.as_str(), p))),
        }
    }

    /// Engine settings from `[defaults]`, `[discovery]` and `[ports]`,
    /// with the profile's admin URL applied.
    pub fn engine_config(&self, profile: Option<&Profile>) -> Result<EngineConfig, ConfigError> {
        let d = &self.defaults;

        let tls = if let Some(ref ca) = d.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else if d.verify_tls {
            TlsMode::System
        } else {
            TlsMode::DangerAcceptInvalid
        };

        let origin_override = match profile.and_then(|p| p.admin_url.as_deref()) {
            Some(raw) => Some(raw.parse::<url::Url>().map_err(|e| ConfigError::Validation {
                field: "admin_url".into(),
                reason: format!("invalid URL '{raw}': {e}"),
            })?),
            None => None,
        };

        let extra = self
            .ports
            .extra
            .iter()
            .map(ExtraRule::to_rule)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EngineConfig {
            transport: TransportConfig {
                tls,
                timeout: Duration::from_secs(d.timeout),
                retries: d.retries,
                max_redirects: d.max_redirects,
                origin_override,
                ..TransportConfig::default()
            },
            discovery: DiscoveryConfig {
                probe_ports: self.discovery.probe_ports.clone(),
                connect_timeout: Duration::from_millis(self.discovery.connect_timeout_ms),
                concurrency: self.discovery.concurrency,
            },
            ports: PortCatalog {
                include_game_ports: self.ports.include_game_ports,
                extra,
            },
            login_attempts: d.login_attempts,
            deadline: Duration::from_secs(d.deadline),
        })
    }
}

// ── Password resolution ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Resolve a router password without CLI flags: the profile's env var,
/// then `RETROPORT_PASSWORD`, then the keyring, then plaintext config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a router password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 8
verify_tls = true

[ports]
include_game_ports = true
extra = [{ protocol = "tcp", port = 8080 }, { protocol = "UDP", port = 9000, internal_port = 9001 }]

[profiles.home]
router_type = "ASUS"
router_ip = "192.168.50.1"
username = "admin"
password = "plain"
console = "dreamcast"
target = "pc"

[profiles.lab]
router_type = "manual"
admin_url = "http://10.0.0.1:8080"
"#;

    #[test]
    fn defaults_match_engine_defaults() {
        let engine = Config::default().engine_config(None).unwrap();
        assert_eq!(engine.transport.timeout, Duration::from_secs(5));
        assert_eq!(engine.transport.retries, 2);
        assert_eq!(engine.transport.max_redirects, 5);
        assert!(matches!(engine.transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(engine.login_attempts, 3);
        assert_eq!(engine.deadline, Duration::from_secs(120));
        assert_eq!(engine.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn file_and_env_layers_merge() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("RETROPORT_DEFAULTS__RETRIES", "0");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.defaults.timeout, 8);
            assert_eq!(config.defaults.retries, 0);
            assert_eq!(config.defaults.login_attempts, 3);

            let (name, home) = config.profile(None).unwrap().unwrap();
            assert_eq!(name, "home");
            assert_eq!(home.router_type, "ASUS");
            assert_eq!(home.console, Some(Console::Dreamcast));
            assert_eq!(home.target, Some(TargetDevice::Pc));
            Ok(())
        });
    }

    #[test]
    fn engine_config_applies_ports_and_admin_url() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let (_, lab) = config.profile(Some("lab")).unwrap().unwrap();
        let engine = config.engine_config(Some(lab)).unwrap();

        assert!(matches!(engine.transport.tls, TlsMode::System));
        assert_eq!(
            engine.transport.origin_override.unwrap().as_str(),
            "http://10.0.0.1:8080/"
        );
        assert!(engine.ports.include_game_ports);
        assert_eq!(
            engine.ports.extra,
            vec![
                PortRule::tcp(8080),
                PortRule {
                    internal: 9001,
                    ..PortRule::udp(9000)
                }
            ]
        );
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert!(matches!(
            config.profile(Some("office")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn bad_extra_rule_is_rejected() {
        let rule = ExtraRule {
            protocol: "icmp".into(),
            port: 1,
            internal_port: None,
        };
        assert!(matches!(rule.to_rule(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config: Config = toml::from_str(SAMPLE).unwrap();

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.profiles.len(), 2);
        assert_eq!(
            loaded.profiles["lab"].admin_url.as_deref(),
            Some("http://10.0.0.1:8080")
        );
    }

    #[test]
    fn profile_env_var_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            let profile = Profile {
                router_type: "ASUS".into(),
                password_env: Some("RETROPORT_TEST_PW_ENV".into()),
                password: Some("plain".into()),
                ..Profile::default()
            };
            jail.set_env("RETROPORT_TEST_PW_ENV", "from-env");
            let pw = resolve_password(&profile, "retroport-test-profile").unwrap();
            assert_eq!(pw.expose_secret(), "from-env");
            Ok(())
        });
    }
}
