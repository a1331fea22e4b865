// ── Service boundary ──
//
// What a UI talks to. Production and demo backends are interchangeable
// behind `PortForwardService`.

use std::future::Future;
use std::net::Ipv4Addr;

use tracing::debug;

use crate::discovery::TargetResolver;
use crate::engine::PortForwarder;
use crate::model::{RouterConfig, SetupResponse};
use crate::ports::DREAMPI_RULES;

/// Router automation as seen from a front end.
pub trait PortForwardService: Send + Sync {
    /// Run one complete setup. Never fails; errors come back in the response.
    fn start_port_forward(
        &self,
        config: RouterConfig,
    ) -> impl Future<Output = SetupResponse> + Send;

    /// Connectivity pre-check: answers with `message` unchanged.
    fn echo(&self, message: &str) -> String;
}

impl<R: TargetResolver> PortForwardService for PortForwarder<R> {
    fn start_port_forward(
        &self,
        config: RouterConfig,
    ) -> impl Future<Output = SetupResponse> + Send {
        PortForwarder::start_port_forward(self, config)
    }

    fn echo(&self, message: &str) -> String {
        message.to_owned()
    }
}

/// Canned backend for UI development. Touches no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoService;

impl DemoService {
    pub const ROUTER_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);
}

impl PortForwardService for DemoService {
    async fn start_port_forward(&self, config: RouterConfig) -> SetupResponse {
        debug!(router = %config.router_type, console = %config.console, "demo setup");
        SetupResponse::success(
            Self::ROUTER_IP,
            DREAMPI_RULES.iter().map(|r| r.descriptor()).collect(),
        )
    }

    fn echo(&self, message: &str) -> String {
        message.to_owned()
    }
}
