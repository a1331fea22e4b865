//! Subcommand handlers.
//!
//! `setup` and `bridge` drive a `PortForwardService`; the rest are
//! local and never touch the network.

pub mod bridge;
pub mod config_cmd;
pub mod echo;
pub mod ports;
pub mod setup;
pub mod vendors;
