// Minimal SOAP envelopes for HNAP-style admin APIs.
//
// Answers are read with `roxmltree`; elements are matched on their local
// name so any namespace prefix the firmware picks is accepted.

use std::net::Ipv4Addr;

use roxmltree::{Document, Node};

use crate::rule::PortRule;

/// Session id HNAP firmwares accept before a real one is issued.
pub const ANONYMOUS_SESSION: &str = "A7D88AE69687E58D9A00";

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build an envelope whose body is `<element>` wrapping `fields`.
pub fn envelope(element: &str, fields: &[(&str, String)], session_id: &str) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!("<{name}>{}</{name}>", escape(value)));
    }
    format!(
        r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
<SOAP-ENV:Header><SessionID>{}</SessionID></SOAP-ENV:Header>
<SOAP-ENV:Body><{element}>{body}</{element}></SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#,
        escape(session_id)
    )
}

/// Trimmed text content of `node`, entities and CDATA resolved.
fn text_of(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn named<'a, 'input>(doc: &'a Document<'input>, tag: &'a str) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// Text of the first non-empty `<tag>` element, whatever its namespace.
///
/// Returns `None` when `xml` does not parse.
pub fn element_text(xml: &str, tag: &str) -> Option<String> {
    let doc = Document::parse(xml).ok()?;
    named(&doc, tag).find_map(text_of)
}

/// The fault message when `xml` is a SOAP fault.
pub fn fault(xml: &str) -> Option<String> {
    let doc = Document::parse(xml).ok()?;
    let fault = named(&doc, "Fault").next()?;
    let message = fault
        .descendants()
        .filter(|n| n.is_element())
        .find(|n| matches!(n.tag_name().name(), "faultstring" | "Text" | "Reason"))
        .and_then(text_of);
    Some(message.unwrap_or_else(|| "router returned a SOAP fault".into()))
}

/// Whether a port-mapping listing holds `rule` pointed at `destination`.
///
/// An entry matches on the rule's name, or on an element whose children
/// carry the external port, the destination and the protocol.
pub fn rule_listed(xml: &str, rule: &PortRule, destination: Ipv4Addr) -> bool {
    let Ok(doc) = Document::parse(xml) else {
        return false;
    };
    let name = rule.rule_name();
    let port = rule.external.to_string();
    let ip = destination.to_string();

    doc.descendants().filter(|n| n.is_element()).any(|entry| {
        let values: Vec<String> = entry
            .children()
            .filter(|c| c.is_element())
            .filter_map(text_of)
            .collect();
        if values.iter().any(|v| v == &name) {
            return true;
        }
        let has_port = values.iter().any(|v| v == &port);
        let has_ip = values.iter().any(|v| v == &ip);
        let has_proto = values.iter().any(|v| v.eq_ignore_ascii_case(rule.protocol.as_str()));
        has_port && has_ip && has_proto
    })
}
