// retroport-api: async client for consumer router admin panels
//
// Everything that speaks HTTP to a router lives here: the session
// transport, the static vendor catalog, the login flows and the
// port-forward rule installer. Business rules (which ports, which
// destination, how results are reported) live in `retroport-core`.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod html;
pub mod install;
pub mod profile;
pub mod rule;
pub mod session;
pub mod soap;
pub mod transport;

pub use auth::{LoginCredentials, authenticate};
pub use catalog::{GENERIC_ALIAS, MANUAL_ID, lookup};
pub use error::Error;
pub use install::{InstallStatus, RuleInstaller};
pub use profile::{AuthScheme, ParsingStrategy, Scheme, Verification, VendorProfile};
pub use rule::{PortRule, Protocol};
pub use session::{RouterResponse, RouterSession};
pub use transport::{TlsMode, TransportConfig};
