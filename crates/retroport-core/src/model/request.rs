use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Retro console the ports are opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Console {
    Saturn,
    Dreamcast,
}

/// Device on the LAN the rules should point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TargetDevice {
    DreamPi,
    Pc,
}

/// Router admin credentials.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default = "empty_secret", deserialize_with = "secret_from_string")]
    pub password: SecretString,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn secret_from_string<'de, D: Deserializer<'de>>(de: D) -> Result<SecretString, D::Error> {
    String::deserialize(de).map(SecretString::from)
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Both username and password are present.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.expose_secret().is_empty()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: empty_secret(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One setup request, in the JSON shape the wizard UI sends.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    pub console: Console,
    #[serde(default)]
    pub target_device: Option<TargetDevice>,
    pub router_type: String,
    #[serde(default, rename = "routerIP", alias = "routerIp")]
    pub router_ip: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
}

impl RouterConfig {
    pub fn new(console: Console, router_type: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            console,
            target_device: None,
            router_type: router_type.into(),
            router_ip: None,
            credentials,
        }
    }

    pub fn with_target(mut self, target: TargetDevice) -> Self {
        self.target_device = Some(target);
        self
    }

    pub fn with_router_ip(mut self, ip: impl Into<String>) -> Self {
        self.router_ip = Some(ip.into());
        self
    }

    /// The router IP as given, treating an empty string as absent.
    pub fn router_ip(&self) -> Option<&str> {
        self.router_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }
}
