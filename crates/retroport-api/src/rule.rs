use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Transport protocol of a port-forward rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }

    /// Lowercase form, as OpenWrt-style firmwares expect it.
    pub fn as_lower(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// An abstract port-forward rule. The destination address is bound
/// when the rule is installed, not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRule {
    pub protocol: Protocol,
    /// WAN-side port.
    pub external: u16,
    /// LAN-side port on the destination host.
    pub internal: u16,
}

impl PortRule {
    /// A rule forwarding `port` to the same port on the destination.
    pub const fn new(protocol: Protocol, port: u16) -> Self {
        Self {
            protocol,
            external: port,
            internal: port,
        }
    }

    pub const fn tcp(port: u16) -> Self {
        Self::new(Protocol::Tcp, port)
    }

    pub const fn udp(port: u16) -> Self {
        Self::new(Protocol::Udp, port)
    }

    /// Ports must be in 1..=65535 on both sides.
    pub fn is_valid(&self) -> bool {
        self.external != 0 && self.internal != 0
    }

    /// Human-readable descriptor reported back to the UI, e.g. `"TCP 65432"`.
    pub fn descriptor(&self) -> String {
        format!("{} {}", self.protocol, self.external)
    }

    /// The name the rule is stored under on the router.
    pub fn rule_name(&self) -> String {
        format!("DreamPi_{}_{}", self.protocol, self.external)
    }
}

impl fmt::Display for PortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.protocol, self.external)
    }
}
