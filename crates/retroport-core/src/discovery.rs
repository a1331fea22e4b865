// ── Target discovery ──
//
// Finds the addresses a setup needs when the request doesn't spell them
// out: the router (default gateway), this machine's address on the
// router subnet, and a DreamPi somewhere on the /24.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};

use futures_util::StreamExt;
use futures_util::stream;
use netdev::ip::Ipv4Net;
use tokio::net::{TcpStream, UdpSocket};
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::error::SetupError;

/// Interface names that never lead to the home router.
const VIRTUAL_INTERFACE_MARKERS: [&str; 6] = ["vpn", "tun", "tap", "wg", "utun", "tailscale"];

/// Resolves router and destination addresses.
///
/// Production uses [`SystemResolver`]; tests and embedders can pin
/// addresses with [`StaticResolver`].
pub trait TargetResolver: Send + Sync {
    /// The router's LAN address, when the request gives none.
    fn router_address(&self) -> impl Future<Output = Result<Ipv4Addr, SetupError>> + Send;

    /// This machine's address on the router's subnet.
    fn local_address(
        &self,
        router: Ipv4Addr,
    ) -> impl Future<Output = Result<Ipv4Addr, SetupError>> + Send;

    /// A DreamPi on the router's subnet.
    fn dreampi_address(
        &self,
        router: Ipv4Addr,
    ) -> impl Future<Output = Result<Ipv4Addr, SetupError>> + Send;
}

/// The conventional `.98` address on the router's /24.
pub fn dreamcast_address(router: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = router.octets();
    Ipv4Addr::new(a, b, c, crate::config::DREAMCAST_HOST)
}

fn same_subnet(a: Ipv4Addr, b: Ipv4Addr) -> bool {
    a.octets()[..3] == b.octets()[..3]
}

/// First configured address sharing the router's subnet.
fn lan_address(nets: impl IntoIterator<Item = Ipv4Net>, router: Ipv4Addr) -> Option<Ipv4Addr> {
    nets.into_iter()
        .map(|net| net.addr)
        .find(|addr| same_subnet(*addr, router) && *addr != router)
}

fn is_virtual(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    VIRTUAL_INTERFACE_MARKERS.iter().any(|m| name.contains(m))
}

// ── System resolver ──────────────────────────────────────────────────

/// Discovers addresses from the host's interfaces and the LAN.
#[derive(Debug, Clone, Default)]
pub struct SystemResolver {
    discovery: DiscoveryConfig,
}

impl SystemResolver {
    pub fn new(discovery: DiscoveryConfig) -> Self {
        Self { discovery }
    }

    /// Interface addresses on the router's subnet, skipping VPN adapters.
    fn interface_address(router: Ipv4Addr) -> Option<Ipv4Addr> {
        let nets = netdev::get_interfaces()
            .into_iter()
            .filter(|iface| !is_virtual(&iface.name))
            .flat_map(|iface| iface.ipv4);
        lan_address(nets, router)
    }

    /// Local address the OS would route to the router from.
    async fn routed_address(router: Ipv4Addr) -> Option<Ipv4Addr> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .ok()?;
        socket.connect(SocketAddr::from((router, 80))).await.ok()?;
        match socket.local_addr().ok()? {
            SocketAddr::V4(addr) => Some(*addr.ip()),
            SocketAddr::V6(_) => None,
        }
    }

    async fn probe(&self, host: Ipv4Addr) -> bool {
        for port in &self.discovery.probe_ports {
            let connect = TcpStream::connect(SocketAddr::from((host, *port)));
            if let Ok(Ok(_)) = tokio::time::timeout(self.discovery.connect_timeout, connect).await {
                debug!(%host, port, "probe port open");
                return true;
            }
        }
        false
    }
}

impl TargetResolver for SystemResolver {
    async fn router_address(&self) -> Result<Ipv4Addr, SetupError> {
        let gateway = netdev::get_interfaces()
            .into_iter()
            .filter(|iface| !is_virtual(&iface.name))
            .filter_map(|iface| iface.gateway)
            .flat_map(|gw| gw.ipv4)
            .find(|ip| !ip.is_unspecified());

        match gateway {
            Some(ip) => {
                info!(router = %ip, "found default gateway");
                Ok(ip)
            }
            None => Err(SetupError::TargetNotFound {
                what: "a default gateway (router)".into(),
            }),
        }
    }

    async fn local_address(&self, router: Ipv4Addr) -> Result<Ipv4Addr, SetupError> {
        let found = match Self::interface_address(router) {
            Some(addr) => Some(addr),
            None => Self::routed_address(router)
                .await
                .filter(|addr| same_subnet(*addr, router)),
        };
        found.ok_or_else(|| SetupError::TargetNotFound {
            what: format!("a local address on the {router} subnet"),
        })
    }

    async fn dreampi_address(&self, router: Ipv4Addr) -> Result<Ipv4Addr, SetupError> {
        let [a, b, c, _] = router.octets();
        let hosts = (2..=253)
            .map(|h| Ipv4Addr::new(a, b, c, h))
            .filter(|ip| *ip != router);

        info!(subnet = %format!("{a}.{b}.{c}.0/24"), "scanning for DreamPi");
        let mut hits: Vec<Ipv4Addr> = stream::iter(hosts)
            .map(|host| async move { self.probe(host).await.then_some(host) })
            .buffer_unordered(self.discovery.concurrency.max(1))
            .filter_map(|hit| async move { hit })
            .collect()
            .await;
        hits.sort_unstable();

        match hits.as_slice() {
            [] => Err(SetupError::TargetNotFound {
                what: "DreamPi".into(),
            }),
            [only] => {
                info!(dreampi = %only, "found DreamPi");
                Ok(*only)
            }
            [first, rest @ ..] => {
                warn!(chosen = %first, others = ?rest, "several hosts answer on DreamPi ports");
                Ok(*first)
            }
        }
    }
}

// ── Static resolver ──────────────────────────────────────────────────

/// Fixed addresses; `None` fields report `TargetNotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticResolver {
    pub router: Option<Ipv4Addr>,
    pub local: Option<Ipv4Addr>,
    pub dreampi: Option<Ipv4Addr>,
}

impl StaticResolver {
    /// Every lookup answers `addr`.
    pub fn pinned(addr: Ipv4Addr) -> Self {
        Self {
            router: Some(addr),
            local: Some(addr),
            dreampi: Some(addr),
        }
    }
}

impl TargetResolver for StaticResolver {
    async fn router_address(&self) -> Result<Ipv4Addr, SetupError> {
        self.router.ok_or_else(|| SetupError::TargetNotFound {
            what: "a default gateway (router)".into(),
        })
    }

    async fn local_address(&self, router: Ipv4Addr) -> Result<Ipv4Addr, SetupError> {
        self.local.ok_or_else(|| SetupError::TargetNotFound {
            what: format!("a local address on the {router} subnet"),
        })
    }

    async fn dreampi_address(&self, _router: Ipv4Addr) -> Result<Ipv4Addr, SetupError> {
        self.dreampi.ok_or_else(|| SetupError::TargetNotFound {
            what: "DreamPi".into(),
        })
    }
}
