//! Port-forward setup engine between `retroport-api` and front ends (CLI, UI bridge).
//!
//! This crate owns the business rules of one setup:
//!
//! - **[`PortForwarder`]**: Runs a complete invocation: validates the
//!   [`RouterConfig`], resolves the vendor profile, discovers the router and
//!   the destination device, logs in with retries, installs every rule of the
//!   console's set and aggregates the results into a [`SetupResponse`].
//!   Supports caller cancellation and an overall deadline.
//!
//! - **[`PortForwardService`]**: The front-end boundary, implemented by
//!   `PortForwarder` and by the network-free [`DemoService`].
//!
//! - **[`TargetResolver`]**: Router, local PC and DreamPi discovery.
//!   [`SystemResolver`] asks the OS and scans the LAN; [`StaticResolver`]
//!   pins addresses.
//!
//! - **[`PortCatalog`]**: Rule sets per console, with optional Dreamcast
//!   game ports and configured extras.

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod model;
pub mod outcome;
pub mod ports;
pub mod service;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DiscoveryConfig, EngineConfig};
pub use discovery::{StaticResolver, SystemResolver, TargetResolver};
pub use engine::{Phase, PortForwarder};
pub use error::SetupError;
pub use model::{Console, Credentials, RouterConfig, SetupResponse, TargetDevice};
pub use ports::PortCatalog;
pub use service::{DemoService, PortForwardService};

pub use retroport_api::{PortRule, Protocol};
pub use tokio_util::sync::CancellationToken;
