// Domain model: what the UI sends in and what it gets back.

mod request;
mod response;

pub use request::{Console, Credentials, RouterConfig, TargetDevice};
pub use response::SetupResponse;
