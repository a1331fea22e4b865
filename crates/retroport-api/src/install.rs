// Rule installation
//
// Renders a `PortRule` through a profile's rule template, submits it on
// an authenticated session, and confirms it through the profile's
// verification method. Profiles that can list their rules get an
// existence check first so re-running setup never creates duplicates.

use std::net::Ipv4Addr;

use serde_json::{Map, Value};
use strum::Display;
use tracing::{debug, info};

use crate::error::Error;
use crate::html;
use crate::profile::{
    FieldValue, ParsingStrategy, PayloadEncoding, Verification, VendorProfile, expand_path,
};
use crate::rule::PortRule;
use crate::session::{RouterResponse, RouterSession};
use crate::soap;

/// Result of installing one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum InstallStatus {
    /// The rule was submitted and accepted.
    Installed,
    /// An equivalent rule was already on the router; nothing was sent.
    AlreadyPresent,
}

/// Installs port-forward rules using one vendor profile.
#[derive(Debug, Clone, Copy)]
pub struct RuleInstaller {
    profile: &'static VendorProfile,
}

impl RuleInstaller {
    pub fn new(profile: &'static VendorProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &'static VendorProfile {
        self.profile
    }

    /// Install `rule` forwarding to `destination`.
    pub async fn install(
        &self,
        session: &mut RouterSession,
        rule: &PortRule,
        destination: Ipv4Addr,
    ) -> Result<InstallStatus, Error> {
        if !rule.is_valid() {
            return Err(Error::Rejected {
                status: None,
                message: format!("invalid port in rule {rule}"),
            });
        }

        if self.profile.lists_rules() {
            match self.is_listed(session, rule, destination).await {
                Ok(true) => {
                    info!(rule = %rule, "rule already present, skipping");
                    return Ok(InstallStatus::AlreadyPresent);
                }
                Ok(false) => {}
                // The submission itself reports anything fatal.
                Err(e) => debug!(error = %e, "rule list unavailable before submit"),
            }
        }

        let resp = self.submit(session, rule, destination).await?;
        check_submission(&resp)?;

        if self.profile.lists_rules() && !self.is_listed(session, rule, destination).await? {
            return Err(Error::NotEchoed);
        }

        debug!(rule = %rule, %destination, "rule installed");
        Ok(InstallStatus::Installed)
    }

    /// Whether the router's rule list already holds `rule`.
    ///
    /// Best-effort profiles always answer `false`.
    pub async fn is_listed(
        &self,
        session: &mut RouterSession,
        rule: &PortRule,
        destination: Ipv4Addr,
    ) -> Result<bool, Error> {
        let resp = match self.profile.verify {
            Verification::BestEffort => return Ok(false),
            Verification::ListEcho { path } => {
                let path = expand_path(path, session.token());
                session.get(&path).await?
            }
            Verification::SoapList { action, element } => {
                let path = expand_path(self.profile.install.path, session.token());
                let session_id = session.token().unwrap_or(soap::ANONYMOUS_SESSION).to_owned();
                session
                    .post_soap(&path, action, soap::envelope(element, &[], &session_id))
                    .await?
            }
        };
        if resp.is_auth_rejected() {
            return Err(Error::Rejected {
                status: Some(resp.status.as_u16()),
                message: format!("rule list refused (HTTP {})", resp.status),
            });
        }
        if !resp.is_success() {
            return Err(Error::UnexpectedResponse {
                message: format!("rule list returned HTTP {}", resp.status),
            });
        }

        if let Verification::SoapList { .. } = self.profile.verify {
            if let Some(message) = soap::fault(&resp.body) {
                return Err(Error::UnexpectedResponse {
                    message: format!("rule list query failed: {message}"),
                });
            }
            return Ok(soap::rule_listed(&resp.body, rule, destination));
        }
        Ok(match self.profile.parsing {
            ParsingStrategy::HtmlScrape => html::rule_listed(&resp.body, rule, destination),
            ParsingStrategy::Json => {
                let value: Value = resp.json()?;
                json_rule_listed(&value, rule, destination)
            }
        })
    }

    async fn submit(
        &self,
        session: &mut RouterSession,
        rule: &PortRule,
        destination: Ipv4Addr,
    ) -> Result<RouterResponse, Error> {
        let template = &self.profile.install;
        let path = expand_path(template.path, session.token());
        debug!(vendor = self.profile.id, rule = %rule, "submitting rule to {path}");

        match template.encoding {
            PayloadEncoding::Form => {
                let form = template
                    .fields
                    .iter()
                    .map(|(name, value)| ((*name).to_owned(), render_text(*value, rule, destination)))
                    .collect();
                session.post_form(&path, form).await
            }
            PayloadEncoding::Json => {
                let body: Map<String, Value> = template
                    .fields
                    .iter()
                    .map(|(name, value)| ((*name).to_owned(), render_json(*value, rule, destination)))
                    .collect();
                session.post_json(&path, Value::Object(body)).await
            }
            PayloadEncoding::Soap { action, element } => {
                let fields: Vec<(&str, String)> = template
                    .fields
                    .iter()
                    .map(|(name, value)| (*name, render_text(*value, rule, destination)))
                    .collect();
                let session_id = session.token().unwrap_or(soap::ANONYMOUS_SESSION).to_owned();
                let envelope = soap::envelope(element, &fields, &session_id);
                session.post_soap(&path, action, envelope).await
            }
        }
    }
}

/// Render a field for form and SOAP bodies.
pub fn render_text(value: FieldValue, rule: &PortRule, destination: Ipv4Addr) -> String {
    match value {
        FieldValue::Literal(s) => s.to_owned(),
        FieldValue::Flag(b) => String::from(if b { "1" } else { "0" }),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::RuleName => rule.rule_name(),
        FieldValue::Protocol => rule.protocol.as_str().to_owned(),
        FieldValue::ProtocolLower => rule.protocol.as_lower().to_owned(),
        FieldValue::ExternalPort => rule.external.to_string(),
        FieldValue::InternalPort => rule.internal.to_string(),
        FieldValue::Destination => destination.to_string(),
    }
}

/// Render a field for JSON bodies. Ports go out as strings, which is
/// what these firmwares accept.
pub fn render_json(value: FieldValue, rule: &PortRule, destination: Ipv4Addr) -> Value {
    match value {
        FieldValue::Flag(b) => Value::Bool(b),
        FieldValue::Int(n) => Value::from(n),
        other => Value::String(render_text(other, rule, destination)),
    }
}

/// Reject 2xx answers whose body says the rule was refused.
fn check_submission(resp: &RouterResponse) -> Result<(), Error> {
    let status = Some(resp.status.as_u16());
    if !resp.is_success() {
        return Err(Error::Rejected {
            status,
            message: format!("router answered HTTP {}", resp.status),
        });
    }

    if let Some(Value::Object(body)) = resp.json_value() {
        if body.get("success") == Some(&Value::Bool(false)) {
            return Err(Error::Rejected {
                status,
                message: error_message(&body).unwrap_or_else(|| "router reported success=false".into()),
            });
        }
        if let Some(code) = body.get("error_code").and_then(Value::as_i64).filter(|c| *c != 0) {
            return Err(Error::Rejected {
                status,
                message: error_message(&body).unwrap_or_else(|| format!("router error code {code}")),
            });
        }
        if let Some(message) = error_message(&body) {
            return Err(Error::Rejected { status, message });
        }
    } else if let Some(message) = soap::fault(&resp.body) {
        return Err(Error::Rejected { status, message });
    }
    Ok(())
}

/// A non-empty `error` member, as a message.
fn error_message(body: &Map<String, Value>) -> Option<String> {
    match body.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_i64() == Some(0) => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .map_or_else(|| Value::Object(obj.clone()).to_string(), str::to_owned),
        ),
        other => Some(other.to_string()),
    }
}

/// Whether a JSON rule list holds `rule` pointed at `destination`.
pub fn json_rule_listed(list: &Value, rule: &PortRule, destination: Ipv4Addr) -> bool {
    let Some(entries) = find_rule_array(list) else {
        return false;
    };
    let name = rule.rule_name();
    let port = rule.external.to_string();
    let ip = destination.to_string();

    entries.iter().any(|entry| {
        let values = scalar_values(entry);
        if values.iter().any(|v| v == &name) {
            return true;
        }
        let has_port = values.iter().any(|v| v == &port);
        let has_ip = values.iter().any(|v| v == &ip);
        let has_proto = values.iter().any(|v| {
            v.eq_ignore_ascii_case(rule.protocol.as_str()) || v.eq_ignore_ascii_case("tcp_udp")
        });
        has_port && has_ip && has_proto
    })
}

/// The top-level array, or the first array under a conventional key.
fn find_rule_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["data", "rules", "result", "items"]
            .iter()
            .find_map(|key| map.get(*key).and_then(find_rule_array))
            .or_else(|| map.values().find_map(Value::as_array)),
        _ => None,
    }
}

fn scalar_values(entry: &Value) -> Vec<String> {
    match entry {
        Value::Object(map) => map
            .values()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}
