// ── Engine configuration ──
//
// How a setup runs: transport tuning, discovery tuning, which ports to
// open, and the overall deadline. Never touches disk; the CLI builds
// one from `retroport-config` and hands it in.

use std::time::Duration;

use retroport_api::TransportConfig;

use crate::ports::PortCatalog;

/// Ports a DreamPi has open; any one answering marks the host.
pub const DREAMPI_PROBE_PORTS: [u16; 3] = [65432, 20001, 20002];

/// Host number the Dreamcast conventionally takes on the router subnet.
pub const DREAMCAST_HOST: u8 = 98;

/// LAN scan tuning for DreamPi discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub probe_ports: Vec<u16>,
    /// Per-connect timeout.
    pub connect_timeout: Duration,
    /// Probes in flight at once.
    pub concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_ports: DREAMPI_PROBE_PORTS.to_vec(),
            connect_timeout: Duration::from_millis(150),
            concurrency: 64,
        }
    }
}

/// Everything a `PortForwarder` needs besides the request itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub transport: TransportConfig,
    pub discovery: DiscoveryConfig,
    pub ports: PortCatalog,
    /// Login attempts before giving up on an unreachable or confusing router.
    pub login_attempts: u32,
    /// Upper bound on one whole invocation.
    pub deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            discovery: DiscoveryConfig::default(),
            ports: PortCatalog::default(),
            login_attempts: 3,
            deadline: Duration::from_secs(120),
        }
    }
}
