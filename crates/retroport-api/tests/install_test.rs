#![allow(clippy::unwrap_used)]
// Integration tests for `RuleInstaller` using wiremock.

use std::net::Ipv4Addr;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use retroport_api::{
    Error, InstallStatus, LoginCredentials, PortRule, RouterSession, RuleInstaller,
    TransportConfig, authenticate, lookup,
};

const DEST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 98);
const LIST_ACTION: &str = "http://purenetworks.com/HNAP1/GetPortMappings";
const ADD_ACTION: &str = "http://purenetworks.com/HNAP1/AddPortMapping";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RouterSession) {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        retries: 0,
        ..TransportConfig::default()
    };
    let session = RouterSession::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();
    (server, session)
}

fn installer(router_type: &str) -> RuleInstaller {
    RuleInstaller::new(lookup(router_type).unwrap())
}

fn asus_list(rows: &str) -> String {
    format!("<html><table><tr><th>Name</th><th>Port</th><th>IP</th><th>Proto</th></tr>{rows}</table></html>")
}

// ── HTML list verification ──────────────────────────────────────────

#[tokio::test]
async fn test_form_rule_is_submitted_and_verified() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Advanced_VirtualServer_Content.asp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list("")))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/start_apply.htm"))
        .and(body_string_contains("vts_desc_x=DreamPi_TCP_65432"))
        .and(body_string_contains("vts_ipaddr_x=192.168.1.98"))
        .and(body_string_contains("action_script=restart_firewall"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Advanced_VirtualServer_Content.asp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list(
            "<tr><td>DreamPi_TCP_65432</td><td>65432</td><td>192.168.1.98</td><td>TCP</td></tr>",
        )))
        .mount(&server)
        .await;

    let status = installer("ASUS")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await
        .unwrap();

    assert_eq!(status, InstallStatus::Installed);
}

#[tokio::test]
async fn test_present_rule_is_not_resubmitted() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Advanced_VirtualServer_Content.asp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list(
            "<tr><td>dc</td><td>20001</td><td>192.168.1.98</td><td>UDP</td></tr>",
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let status = installer("ASUS")
        .install(&mut session, &PortRule::udp(20001), DEST)
        .await
        .unwrap();

    assert_eq!(status, InstallStatus::AlreadyPresent);
}

#[tokio::test]
async fn test_rule_missing_after_submit_is_not_echoed() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Advanced_VirtualServer_Content.asp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list("")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/start_apply.htm"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = installer("ASUS")
        .install(&mut session, &PortRule::udp(20002), DEST)
        .await;

    assert!(
        matches!(result, Err(Error::NotEchoed)),
        "expected NotEchoed, got: {result:?}"
    );
}

// ── Form vendors: the rule page is the list ─────────────────────────

#[tokio::test]
async fn test_form_vendor_reads_back_its_rule_page() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/portforward.cgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list("")))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/portforward.cgi"))
        .and(body_string_contains("public_port=20001"))
        .and(body_string_contains("protocol=UDP"))
        .and(body_string_contains("schedule=Always"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/portforward.cgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list(
            "<tr><td>DreamPi_UDP_20001</td><td>20001</td><td>192.168.1.98</td><td>UDP</td></tr>",
        )))
        .mount(&server)
        .await;

    let status = installer("D-Link")
        .install(&mut session, &PortRule::udp(20001), DEST)
        .await
        .unwrap();

    assert_eq!(status, InstallStatus::Installed);
}

#[tokio::test]
async fn test_form_vendor_skips_rule_already_on_its_page() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/portforward.cgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(asus_list(
            "<tr><td>DreamPi_UDP_20001</td><td>20001</td><td>192.168.1.98</td><td>UDP</td></tr>",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let status = installer("D-Link")
        .install(&mut session, &PortRule::udp(20001), DEST)
        .await
        .unwrap();

    assert_eq!(status, InstallStatus::AlreadyPresent);
}

// ── Best-effort generic profile ─────────────────────────────────────

#[tokio::test]
async fn test_generic_profile_accepts_2xx_without_reading_back() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/port_forward.cgi"))
        .and(body_string_contains("external_port=20001"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let status = installer("manual")
        .install(&mut session, &PortRule::udp(20001), DEST)
        .await
        .unwrap();

    assert_eq!(status, InstallStatus::Installed);
}

#[tokio::test]
async fn test_http_error_is_rejected_with_status() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/portforward.cgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = installer("Billion")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await;

    assert!(
        matches!(result, Err(Error::Rejected { status: Some(500), .. })),
        "expected Rejected(500), got: {result:?}"
    );
}

// ── JSON vendors ────────────────────────────────────────────────────

#[tokio::test]
async fn test_json_success_false_is_rejected() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/goform/virtualServer"))
        .and(body_partial_json(json!({"outPort": "65432", "enable": 1})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "port in use"})),
        )
        .mount(&server)
        .await;

    let result = installer("Tenda")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await;

    match result {
        Err(Error::Rejected { message, .. }) => assert_eq!(message, "port in use"),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_json_list_echo() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/ip/firewall/nat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/ip/firewall/nat"))
        .and(body_partial_json(json!({
            "comment": "DreamPi_UDP_20002",
            "protocol": "udp",
            "to-addresses": "192.168.1.98",
            "chain": "dstnat"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({".id": "*1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/ip/firewall/nat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {".id": "*1", "comment": "DreamPi_UDP_20002", "dst-port": "20002"}
        ])))
        .mount(&server)
        .await;

    let status = installer("MikroTik")
        .install(&mut session, &PortRule::udp(20002), DEST)
        .await
        .unwrap();

    assert_eq!(status, InstallStatus::Installed);
}

#[tokio::test]
async fn test_path_token_is_substituted() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/;stok=/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"stok": "s70k"}})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/;stok=s70k/admin/port_forward/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/;stok=s70k/admin/port_forward/add"))
        .and(body_partial_json(json!({"externalPort": "65432", "internalIP": "192.168.1.98"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error_code": 0})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/;stok=s70k/admin/port_forward/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"description": "DreamPi_TCP_65432", "externalPort": "65432"}
        ]})))
        .mount(&server)
        .await;

    let creds = LoginCredentials::new("admin", SecretString::from("pw".to_owned()));
    authenticate(&mut session, lookup("TP-Link").unwrap(), &creds)
        .await
        .unwrap();

    let status = installer("TP-Link")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await
        .unwrap();
    assert_eq!(status, InstallStatus::Installed);
}

#[tokio::test]
async fn test_error_code_is_rejected() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/;stok=/admin/port_forward/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error_code": -40401})))
        .mount(&server)
        .await;

    let result = installer("TP-Link")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await;

    assert!(matches!(result, Err(Error::Rejected { .. })), "got: {result:?}");
}

// ── CSRF & SOAP ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_csrf_header_is_sent_on_submit() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "session=abc"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/port_forward.asp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><meta name="csrf-token" content="tkn-1"></head><body></body></html>"#,
        ))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/port_forward.asp"))
        .and(header("x-csrf-token", "tkn-1"))
        .and(body_string_contains("dest_ip=192.168.1.98"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/port_forward.asp"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<ul><li>DreamPi_TCP_65432</li></ul>"),
        )
        .mount(&server)
        .await;

    let creds = LoginCredentials::new("admin", SecretString::from("pw".to_owned()));
    authenticate(&mut session, lookup("Arris").unwrap(), &creds)
        .await
        .unwrap();

    let status = installer("Arris")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await
        .unwrap();
    assert_eq!(status, InstallStatus::Installed);
}

fn port_mappings(entries: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><GetPortMappingsResponse>{entries}</GetPortMappingsResponse></soap:Body></soap:Envelope>"#
    )
}

#[tokio::test]
async fn test_soap_rule_carries_session_id() {
    let (server, mut session) = setup().await;
    session.set_token("NG-42".into());

    Mock::given(method("POST"))
        .and(path("/soap/server_sa"))
        .and(header("soapaction", LIST_ACTION))
        .and(body_string_contains("<SessionID>NG-42</SessionID>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(port_mappings("")))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/soap/server_sa"))
        .and(header("soapaction", ADD_ACTION))
        .and(body_string_contains("<SessionID>NG-42</SessionID>"))
        .and(body_string_contains("<PortMappingProtocol>UDP</PortMappingProtocol>"))
        .and(body_string_contains("<InternalClient>192.168.1.98</InternalClient>"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<AddPortMappingResult>OK</AddPortMappingResult>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/soap/server_sa"))
        .and(header("soapaction", LIST_ACTION))
        .respond_with(ResponseTemplate::new(200).set_body_string(port_mappings(
            "<PortMapping><PortMappingDescription>DreamPi_UDP_20001</PortMappingDescription></PortMapping>",
        )))
        .mount(&server)
        .await;

    let status = installer("Netgear")
        .install(&mut session, &PortRule::udp(20001), DEST)
        .await
        .unwrap();
    assert_eq!(status, InstallStatus::Installed);
}

#[tokio::test]
async fn test_soap_listing_skips_existing_mapping() {
    let (server, mut session) = setup().await;
    session.set_token("NG-42".into());

    Mock::given(method("POST"))
        .and(path("/soap/server_sa"))
        .and(header("soapaction", LIST_ACTION))
        .respond_with(ResponseTemplate::new(200).set_body_string(port_mappings(
            "<PortMapping><ExternalPort>65432</ExternalPort><InternalClient>192.168.1.98</InternalClient>\
             <PortMappingProtocol>TCP</PortMappingProtocol></PortMapping>",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("soapaction", ADD_ACTION))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let status = installer("Netgear")
        .install(&mut session, &PortRule::tcp(65432), DEST)
        .await
        .unwrap();
    assert_eq!(status, InstallStatus::AlreadyPresent);
}

#[tokio::test]
async fn test_soap_fault_is_rejected_with_its_message() {
    let (server, mut session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/soap/server_sa"))
        .and(header("soapaction", ADD_ACTION))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
  <s:Fault><faultcode>s:Client</faultcode><faultstring>ConflictInMappingEntry</faultstring></s:Fault>
</s:Body></s:Envelope>"#,
        ))
        .mount(&server)
        .await;

    let result = installer("Netgear")
        .install(&mut session, &PortRule::udp(20002), DEST)
        .await;

    match result {
        Err(Error::Rejected { message, .. }) => assert_eq!(message, "ConflictInMappingEntry"),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}
