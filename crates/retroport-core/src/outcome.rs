// Outcome aggregation
//
// Folds per-rule results into the single `SetupResponse` an invocation
// returns. Rules that went in are listed even when others failed.

use std::fmt::Write as _;
use std::net::Ipv4Addr;

use retroport_api::PortRule;

use crate::error::SetupError;
use crate::model::SetupResponse;

/// Per-rule results for one invocation, in install order.
#[derive(Debug)]
pub struct Outcome {
    destination: Ipv4Addr,
    results: Vec<(PortRule, Result<(), SetupError>)>,
    manual_hint: bool,
}

impl Outcome {
    pub fn new(destination: Ipv4Addr) -> Self {
        Self {
            destination,
            results: Vec::new(),
            manual_hint: false,
        }
    }

    /// Append step-by-step instructions to failure messages, for routers
    /// without a known automation profile.
    #[must_use]
    pub fn with_manual_hint(mut self, enabled: bool) -> Self {
        self.manual_hint = enabled;
        self
    }

    pub fn record(&mut self, rule: PortRule, result: Result<(), SetupError>) {
        self.results.push((rule, result));
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn into_response(self) -> SetupResponse {
        let total = self.results.len();
        let failed = self.failures();

        let mut first_error = None;
        let mut installed = Vec::with_capacity(total - failed);
        for (rule, result) in &self.results {
            match result {
                Ok(()) => installed.push(rule.descriptor()),
                Err(e) if first_error.is_none() => first_error = Some(e.to_string()),
                Err(_) => {}
            }
        }

        let Some(first) = first_error else {
            return SetupResponse::success(self.destination, installed);
        };

        let mut message = if failed > 1 {
            format!("{first} ({failed} of {total} rules failed)")
        } else {
            first
        };
        if self.manual_hint {
            message.push_str("\nPlease configure these ports manually:");
            for (rule, _) in &self.results {
                let _ = write!(
                    message,
                    "\n- {} Port {} -> {}:{}",
                    rule.protocol, rule.external, self.destination, rule.internal
                );
            }
        }
        SetupResponse::partial(self.destination, installed, message)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DEST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 98);

    fn install_failure(rule: &PortRule) -> SetupError {
        SetupError::RuleInstallationFailed {
            rule: rule.descriptor(),
            cause: "router answered HTTP 500".into(),
        }
    }

    #[test]
    fn all_succeeded() {
        let mut outcome = Outcome::new(DEST);
        outcome.record(PortRule::tcp(65432), Ok(()));
        outcome.record(PortRule::udp(20001), Ok(()));

        let resp = outcome.into_response();
        assert!(resp.success);
        assert_eq!(resp.ip, Some(DEST));
        assert_eq!(resp.ports, vec!["TCP 65432", "UDP 20001"]);
        assert_eq!(resp.error, None);
    }

    #[test]
    fn first_failure_is_named_and_successes_listed() {
        let first = PortRule::tcp(65432);
        let mut outcome = Outcome::new(DEST);
        outcome.record(first, Err(install_failure(&first)));
        outcome.record(PortRule::udp(20001), Ok(()));
        outcome.record(PortRule::udp(20002), Ok(()));

        let resp = outcome.into_response();
        assert!(!resp.success);
        assert_eq!(resp.ports, vec!["UDP 20001", "UDP 20002"]);
        assert_eq!(
            resp.error.as_deref(),
            Some("Failed to install TCP 65432: router answered HTTP 500")
        );
    }

    #[test]
    fn failure_count_is_reported_when_several_fail() {
        let mut outcome = Outcome::new(DEST);
        for rule in [PortRule::tcp(65432), PortRule::udp(20001)] {
            outcome.record(rule, Err(install_failure(&rule)));
        }
        let error = outcome.into_response().error.unwrap_or_default();
        assert!(error.starts_with("Failed to install TCP 65432"));
        assert!(error.ends_with("(2 of 2 rules failed)"));
    }

    #[test]
    fn manual_hint_lists_every_rule() {
        let rule = PortRule::udp(20002);
        let mut outcome = Outcome::new(DEST).with_manual_hint(true);
        outcome.record(PortRule::tcp(65432), Ok(()));
        outcome.record(rule, Err(install_failure(&rule)));

        let error = outcome.into_response().error.unwrap_or_default();
        assert!(error.contains("Please configure these ports manually:"));
        assert!(error.contains("- TCP Port 65432 -> 192.168.1.98:65432"));
        assert!(error.contains("- UDP Port 20002 -> 192.168.1.98:20002"));
    }
}
