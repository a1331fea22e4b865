use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Outcome of one setup invocation, in the shape the wizard UI reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupResponse {
    pub success: bool,
    /// Address the rules point at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    /// Descriptors (`"TCP 65432"`) of the rules that are in place.
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SetupResponse {
    pub fn success(ip: Ipv4Addr, ports: Vec<String>) -> Self {
        Self {
            success: true,
            ip: Some(ip),
            ports,
            error: None,
        }
    }

    /// A failure before any rule was attempted.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            ip: None,
            ports: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// A failure after some rules may have been installed.
    pub fn partial(ip: Ipv4Addr, ports: Vec<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            ip: Some(ip),
            ports,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn success_serializes_without_error() {
        let resp = SetupResponse::success(
            Ipv4Addr::new(192, 168, 1, 1),
            vec!["TCP 65432".into(), "UDP 20001".into()],
        );
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"success": true, "ip": "192.168.1.1", "ports": ["TCP 65432", "UDP 20001"]})
        );
    }

    #[test]
    fn failure_serializes_without_ip() {
        let resp = SetupResponse::failure("Unsupported router type: X");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"success": false, "ports": [], "error": "Unsupported router type: X"})
        );
    }
}
