// Input validation, run before any network call.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SetupError;
use crate::model::Credentials;

static DOTTED_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("invalid dotted-quad regex"));

/// Parse a router address. It must look like a dotted quad and every
/// octet must fit in a byte.
pub fn parse_router_ip(value: &str) -> Result<Ipv4Addr, SetupError> {
    let value = value.trim();
    let invalid = || SetupError::InvalidIpFormat {
        value: value.to_owned(),
    };
    if !DOTTED_QUAD.is_match(value) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), SetupError> {
    if credentials.is_complete() {
        Ok(())
    } else {
        Err(SetupError::InvalidConfiguration {
            message: "username and password are required".into(),
        })
    }
}
