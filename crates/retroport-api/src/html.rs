// HTML scraping helpers for admin panels that render state as pages.
//
// Everything here is synchronous: `scraper::Html` is not `Send`, so
// callers parse the buffered body and drop the document before the
// next await point.

use std::net::Ipv4Addr;

use scraper::{Html, Selector};

use crate::rule::PortRule;

/// Value of `attribute` on the first element matching `selector`.
///
/// Returns `None` for an invalid selector, no match, or an empty value.
pub fn extract_attribute(body: &str, selector: &str, attribute: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(body);
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Whether a rendered rule list contains `rule` pointed at `destination`.
///
/// Matches either the rule's name anywhere in the page text, or a table
/// row mentioning the external port, the destination and the protocol.
pub fn rule_listed(body: &str, rule: &PortRule, destination: Ipv4Addr) -> bool {
    let document = Html::parse_document(body);
    let name = rule.rule_name();

    let page_text: String = document.root_element().text().collect();
    if page_text.contains(&name) {
        return true;
    }
    // Hidden inputs and option values carry list state on some firmwares.
    if let Ok(inputs) = Selector::parse("input[value]") {
        if document
            .select(&inputs)
            .filter_map(|e| e.value().attr("value"))
            .any(|v| v.contains(&name))
        {
            return true;
        }
    }

    let Ok(rows) = Selector::parse("tr") else {
        return false;
    };
    let port = rule.external.to_string();
    let ip = destination.to_string();
    document.select(&rows).any(|row| {
        let cells: Vec<String> = row
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        let has_port = cells.iter().any(|c| c == &port);
        let has_ip = cells.iter().any(|c| c == &ip);
        let has_proto = cells.iter().any(|c| {
            c.eq_ignore_ascii_case(rule.protocol.as_str()) || c.eq_ignore_ascii_case("both")
        });
        has_port && has_ip && has_proto
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE_TABLE: &str = r#"
        <html><body>
        <table id="forwards">
          <tr><th>Service</th><th>Port</th><th>Address</th><th>Proto</th></tr>
          <tr><td>web</td><td>8080</td><td>192.168.1.10</td><td>TCP</td></tr>
          <tr><td>dc</td><td>20001</td><td>192.168.1.98</td><td>UDP</td></tr>
        </table>
        </body></html>"#;

    #[test]
    fn finds_csrf_meta_tag() {
        let page = r#"<html><head><meta name="csrf-token" content=" abc123 "></head></html>"#;
        assert_eq!(
            extract_attribute(page, r#"meta[name="csrf-token"]"#, "content").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn finds_hidden_input() {
        let page = r#"<form><input type="hidden" name="token" value="t0k"></form>"#;
        assert_eq!(
            extract_attribute(page, r#"input[name="token"]"#, "value").as_deref(),
            Some("t0k")
        );
    }

    #[test]
    fn missing_or_empty_attribute_is_none() {
        let page = r#"<form><input type="hidden" name="token" value=""></form>"#;
        assert_eq!(extract_attribute(page, r#"input[name="token"]"#, "value"), None);
        assert_eq!(extract_attribute(page, "meta", "content"), None);
        assert_eq!(extract_attribute(page, "[[[", "value"), None);
    }

    #[test]
    fn matches_table_row() {
        let dest = Ipv4Addr::new(192, 168, 1, 98);
        assert!(rule_listed(RULE_TABLE, &PortRule::udp(20001), dest));
        assert!(!rule_listed(RULE_TABLE, &PortRule::tcp(20001), dest));
        assert!(!rule_listed(RULE_TABLE, &PortRule::udp(20002), dest));
        assert!(!rule_listed(
            RULE_TABLE,
            &PortRule::udp(20001),
            Ipv4Addr::new(192, 168, 1, 99)
        ));
    }

    #[test]
    fn matches_rule_name() {
        let page = "<ul><li>DreamPi_TCP_65432</li></ul>";
        assert!(rule_listed(page, &PortRule::tcp(65432), Ipv4Addr::LOCALHOST));
        let form = r#"<input name="vts_desc" value="DreamPi_UDP_20002">"#;
        assert!(rule_listed(form, &PortRule::udp(20002), Ipv4Addr::LOCALHOST));
    }
}
