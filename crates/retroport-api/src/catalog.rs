// Vendor catalog
//
// One static entry per supported router brand, plus the generic
// `manual` profile. Lookups are by the `routerType` identifier the UI
// sends and are case-insensitive.

use crate::profile::{
    AuthScheme, CsrfPlacement, CsrfSpec, FieldValue, LoginBody, LoginFields, ParsingStrategy,
    PasswordEncoding, PayloadEncoding, RuleTemplate, Scheme, SessionCheck, TokenPlacement,
    TokenSource, Verification, VendorProfile,
};

/// Identifier of the generic fallback profile.
pub const MANUAL_ID: &str = "manual";

/// Alias accepted for [`MANUAL_ID`].
pub const GENERIC_ALIAS: &str = "Generic";

use FieldValue::{
    Destination, ExternalPort, Flag, Int, InternalPort, Literal, Protocol, ProtocolLower, RuleName,
};

const USER_PASS: &[LoginFields] = &[LoginFields::new("username", "password")];

const fn form_login(
    path: &'static [&'static str],
    fields: &'static [LoginFields],
    password: PasswordEncoding,
    cookie: &'static str,
) -> AuthScheme {
    AuthScheme::FormPost {
        paths: path,
        fields,
        body: LoginBody::Form,
        password,
        extra: &[],
        check: SessionCheck::Cookie(cookie),
    }
}

const fn json_login(
    path: &'static [&'static str],
    fields: &'static [LoginFields],
    password: PasswordEncoding,
    check: SessionCheck,
) -> AuthScheme {
    AuthScheme::FormPost {
        paths: path,
        fields,
        body: LoginBody::Json,
        password,
        extra: &[],
        check,
    }
}

const fn bearer_login(path: &'static str, password: PasswordEncoding, field: &'static str) -> AuthScheme {
    AuthScheme::TokenExchange {
        path,
        fields: LoginFields::new("username", "password"),
        body: LoginBody::Json,
        password,
        nonce_path: None,
        token: TokenSource::JsonField(field),
        placement: TokenPlacement::Bearer,
    }
}

const fn form_rule(path: &'static str, fields: &'static [(&'static str, FieldValue)]) -> RuleTemplate {
    RuleTemplate {
        path,
        encoding: PayloadEncoding::Form,
        fields,
    }
}

const fn json_rule(path: &'static str, fields: &'static [(&'static str, FieldValue)]) -> RuleTemplate {
    RuleTemplate {
        path,
        encoding: PayloadEncoding::Json,
        fields,
    }
}

/// A cookie-session vendor whose rule page is both the form target and
/// the rendered list.
const fn html_vendor(
    id: &'static str,
    name: &'static str,
    auth: AuthScheme,
    install: RuleTemplate,
) -> VendorProfile {
    VendorProfile {
        id,
        name,
        scheme: Scheme::Http,
        auth,
        csrf: None,
        install,
        verify: Verification::ListEcho { path: install.path },
        parsing: ParsingStrategy::HtmlScrape,
    }
}

/// A JSON API vendor whose rule list is served at the submission path.
const fn json_vendor(
    id: &'static str,
    name: &'static str,
    auth: AuthScheme,
    install: RuleTemplate,
) -> VendorProfile {
    VendorProfile {
        id,
        name,
        scheme: Scheme::Http,
        auth,
        csrf: None,
        install,
        verify: Verification::ListEcho { path: install.path },
        parsing: ParsingStrategy::Json,
    }
}

static PROFILES: &[VendorProfile] = &[
    VendorProfile {
        id: "ASUS",
        name: "ASUS",
        scheme: Scheme::Http,
        auth: form_login(&["/login.cgi"], &[LoginFields::new("login_username", "login_passwd")], PasswordEncoding::Plain, "asus_token"),
        csrf: None,
        install: form_rule(
            "/start_apply.htm",
            &[
                ("action_mode", Literal("apply")),
                ("current_page", Literal("Advanced_VirtualServer_Content.asp")),
                ("next_page", Literal("Advanced_VirtualServer_Content.asp")),
                ("modified", Literal("0")),
                ("action_script", Literal("restart_firewall")),
                ("vts_enable_x", Literal("1")),
                ("vts_desc_x", RuleName),
                ("vts_port_x", ExternalPort),
                ("vts_ipaddr_x", Destination),
                ("vts_proto_x", Protocol),
                ("vts_protono_x", Literal("0")),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/Advanced_VirtualServer_Content.asp",
        },
        parsing: ParsingStrategy::HtmlScrape,
    },
    VendorProfile {
        id: "Fios-G1100",
        name: "Verizon Fios G1100",
        scheme: Scheme::Https,
        auth: AuthScheme::BasicAuth { probe_path: "/" },
        csrf: None,
        install: json_rule(
            "/api/firewall/portforwarding",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("destination_ip", Destination),
                ("destination_port", InternalPort),
                ("source_port", ExternalPort),
                ("enabled", Flag(true)),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/api/firewall/portforwarding",
        },
        parsing: ParsingStrategy::Json,
    },
    VendorProfile {
        id: "TP-Link",
        name: "TP-Link",
        scheme: Scheme::Http,
        auth: AuthScheme::TokenExchange {
            path: "/cgi-bin/luci/;stok=/login?form=login",
            fields: LoginFields::new("username", "password"),
            body: LoginBody::Json,
            password: PasswordEncoding::Md5Hex,
            nonce_path: None,
            token: TokenSource::JsonField("data.stok"),
            placement: TokenPlacement::PathSegment,
        },
        csrf: None,
        install: json_rule(
            "/cgi-bin/luci/;stok={token}/admin/port_forward/add",
            &[
                ("protocol", Protocol),
                ("externalPort", ExternalPort),
                ("internalPort", InternalPort),
                ("internalIP", Destination),
                ("description", RuleName),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/cgi-bin/luci/;stok={token}/admin/port_forward/list",
        },
        parsing: ParsingStrategy::Json,
    },
    VendorProfile {
        id: "Netgear",
        name: "Netgear",
        scheme: Scheme::Http,
        auth: AuthScheme::TokenExchange {
            path: "/soap/server_sa",
            fields: LoginFields::new("Username", "Password"),
            body: LoginBody::Soap {
                action: "http://purenetworks.com/HNAP1/Login",
                element: "Authenticate",
            },
            password: PasswordEncoding::Plain,
            nonce_path: None,
            token: TokenSource::XmlElement("SessionID"),
            placement: TokenPlacement::SoapSession,
        },
        csrf: None,
        install: RuleTemplate {
            path: "/soap/server_sa",
            encoding: PayloadEncoding::Soap {
                action: "http://purenetworks.com/HNAP1/AddPortMapping",
                element: "AddPortMapping",
            },
            fields: &[
                ("PortMappingDescription", RuleName),
                ("InternalClient", Destination),
                ("PortMappingProtocol", Protocol),
                ("ExternalPort", ExternalPort),
                ("InternalPort", InternalPort),
            ],
        },
        verify: Verification::SoapList {
            action: "http://purenetworks.com/HNAP1/GetPortMappings",
            element: "GetPortMappings",
        },
        parsing: ParsingStrategy::HtmlScrape,
    },
    html_vendor(
        "Linksys",
        "Linksys",
        form_login(&["/admin/login.cgi"], USER_PASS, PasswordEncoding::Plain, "PHPSESSID"),
        form_rule(
            "/admin/forward.cgi",
            &[
                ("single_port", Literal("1")),
                ("name", RuleName),
                ("ext_port", ExternalPort),
                ("int_port", InternalPort),
                ("protocol", Protocol),
                ("int_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    html_vendor(
        "D-Link",
        "D-Link",
        form_login(&["/login.cgi"], USER_PASS, PasswordEncoding::Base64, "uid"),
        form_rule(
            "/portforward.cgi",
            &[
                ("name", RuleName),
                ("public_port", ExternalPort),
                ("private_port", InternalPort),
                ("protocol", Protocol),
                ("local_ip", Destination),
                ("enabled", Literal("1")),
                ("schedule", Literal("Always")),
            ],
        ),
    ),
    html_vendor(
        "Cisco",
        "Cisco",
        AuthScheme::FormPost {
            paths: &["/login"],
            fields: USER_PASS,
            body: LoginBody::Form,
            password: PasswordEncoding::Plain,
            extra: &[("submit", "Login")],
            check: SessionCheck::Cookie("sessionid"),
        },
        form_rule(
            "/firewall/portforward/add",
            &[
                ("description", RuleName),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("protocol", Protocol),
                ("internal_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    html_vendor(
        "Belkin",
        "Belkin",
        form_login(&["/login.php"], USER_PASS, PasswordEncoding::Md5Hex, "session"),
        form_rule(
            "/forward.php",
            &[
                ("description", RuleName),
                ("internalPort", InternalPort),
                ("externalPort", ExternalPort),
                ("protocol", Protocol),
                ("internalClient", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    html_vendor(
        "Buffalo",
        "Buffalo",
        AuthScheme::BasicAuth {
            probe_path: "/admin.cgi",
        },
        form_rule(
            "/port_forward.cgi",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    html_vendor(
        "Zyxel",
        "Zyxel",
        form_login(&["/login.cgi"], USER_PASS, PasswordEncoding::Sha256Hex, "sid"),
        form_rule(
            "/nat-port-forward.cgi",
            &[
                ("name", RuleName),
                ("start_port", ExternalPort),
                ("end_port", ExternalPort),
                ("server_ip", Destination),
                ("protocol", Protocol),
                ("enable", Literal("1")),
            ],
        ),
    ),
    json_vendor(
        "Huawei",
        "Huawei",
        json_login(
            &["/api/system/user_login"],
            &[LoginFields::new("Username", "Password")],
            PasswordEncoding::Sha256Hex,
            SessionCheck::AnyCookie,
        ),
        json_rule(
            "/api/security/virtual_server",
            &[
                ("Name", RuleName),
                ("Protocol", Protocol),
                ("ExternalPort", ExternalPort),
                ("InternalPort", InternalPort),
                ("InternalClient", Destination),
                ("Enable", Int(1)),
            ],
        ),
    ),
    VendorProfile {
        id: "Ubiquiti",
        name: "Ubiquiti UniFi",
        scheme: Scheme::Https,
        auth: bearer_login("/api/auth/login", PasswordEncoding::Plain, "token"),
        csrf: None,
        install: json_rule(
            "/api/s/default/rest/portforward",
            &[
                ("name", RuleName),
                ("proto", ProtocolLower),
                ("src_port", ExternalPort),
                ("dst_port", InternalPort),
                ("dst_addr", Destination),
                ("enabled", Flag(true)),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/api/s/default/rest/portforward",
        },
        parsing: ParsingStrategy::Json,
    },
    json_vendor(
        "MikroTik",
        "MikroTik",
        json_login(
            &["/rest/system/user/login"],
            &[LoginFields::new("name", "password")],
            PasswordEncoding::Plain,
            SessionCheck::Cookie("jwt"),
        ),
        json_rule(
            "/rest/ip/firewall/nat",
            &[
                ("comment", RuleName),
                ("protocol", ProtocolLower),
                ("dst-port", ExternalPort),
                ("to-ports", InternalPort),
                ("to-addresses", Destination),
                ("action", Literal("dst-nat")),
                ("chain", Literal("dstnat")),
                ("disabled", Literal("false")),
            ],
        ),
    ),
    html_vendor(
        "NETIS",
        "NETIS",
        form_login(&["/login.php"], USER_PASS, PasswordEncoding::Md5Hex, "NETIS_SESSION"),
        form_rule(
            "/port_forward.php",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    VendorProfile {
        id: "Tenda",
        name: "Tenda",
        scheme: Scheme::Http,
        auth: json_login(&["/login/Auth"], USER_PASS, PasswordEncoding::Md5Hex, SessionCheck::Cookie("SESSIONID")),
        csrf: None,
        install: json_rule(
            "/goform/virtualServer",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("outPort", ExternalPort),
                ("inPort", InternalPort),
                ("ipAddr", Destination),
                ("enable", Int(1)),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/goform/GetVirtualServerCfg",
        },
        parsing: ParsingStrategy::Json,
    },
    html_vendor(
        "EnGenius",
        "EnGenius",
        form_login(&["/cgi-bin/auth.cgi"], USER_PASS, PasswordEncoding::Base64, "session_id"),
        form_rule(
            "/cgi-bin/port_forwarding.cgi",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("public_port", ExternalPort),
                ("private_port", InternalPort),
                ("server_ip", Destination),
                ("enable", Literal("on")),
            ],
        ),
    ),
    html_vendor(
        "Actiontec",
        "Actiontec",
        form_login(&["/login.cgi"], USER_PASS, PasswordEncoding::Plain, "sessionKey"),
        form_rule(
            "/port_forwarding.cgi",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_client", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    json_vendor(
        "AirTies",
        "AirTies",
        AuthScheme::TokenExchange {
            path: "/login",
            fields: LoginFields::new("username", "password"),
            body: LoginBody::Json,
            password: PasswordEncoding::Sha256Hex,
            nonce_path: None,
            token: TokenSource::Header("X-Session-Token"),
            placement: TokenPlacement::Header("X-Session-Token"),
        },
        json_rule(
            "/api/port_forward",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Flag(true)),
            ],
        ),
    ),
    VendorProfile {
        id: "Arris",
        name: "Arris",
        scheme: Scheme::Http,
        auth: form_login(&["/login"], USER_PASS, PasswordEncoding::Md5Hex, "session"),
        csrf: Some(CsrfSpec {
            page: "/port_forward.asp",
            selector: r#"meta[name="csrf-token"]"#,
            attribute: "content",
            placement: CsrfPlacement::Header("X-CSRF-Token"),
        }),
        install: form_rule(
            "/port_forward.asp",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("dest_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/port_forward.asp",
        },
        parsing: ParsingStrategy::HtmlScrape,
    },
    html_vendor(
        "Motorola",
        "Motorola",
        form_login(&["/goform/login"], USER_PASS, PasswordEncoding::Md5Hex, "sessionid"),
        form_rule(
            "/goform/PortForwarding",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("public_port", ExternalPort),
                ("private_port", InternalPort),
                ("local_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    json_vendor(
        "Sagemcom",
        "Sagemcom",
        bearer_login("/api/v1/login", PasswordEncoding::Sha256Hex, "token"),
        json_rule(
            "/api/v1/nat/portforwarding",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("externalPort", ExternalPort),
                ("internalPort", InternalPort),
                ("destinationIp", Destination),
                ("enabled", Flag(true)),
            ],
        ),
    ),
    html_vendor(
        "Thomson",
        "Thomson",
        form_login(
            &["/cgi/login"],
            &[LoginFields::new("user", "pwd")],
            PasswordEncoding::Base64,
            "sessionid",
        ),
        form_rule(
            "/cgi/portforwarding",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    VendorProfile {
        id: "Technicolor",
        name: "Technicolor",
        scheme: Scheme::Http,
        auth: form_login(&["/login"], USER_PASS, PasswordEncoding::Md5Hex, "session"),
        csrf: Some(CsrfSpec {
            page: "/portforward",
            selector: r#"input[name="CSRFtoken"]"#,
            attribute: "value",
            placement: CsrfPlacement::FormField("CSRFtoken"),
        }),
        install: form_rule(
            "/portforward",
            &[
                ("label", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("destination", Destination),
                ("enable", Literal("1")),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/portforward",
        },
        parsing: ParsingStrategy::HtmlScrape,
    },
    html_vendor(
        "Zoom",
        "Zoom",
        form_login(
            &["/goform/login"],
            &[LoginFields::new("userName", "userPwd")],
            PasswordEncoding::Sha256Hex,
            "sessionKey",
        ),
        form_rule(
            "/goform/PortMapping",
            &[
                ("ruleName", RuleName),
                ("protocol", Protocol),
                ("publicPort", ExternalPort),
                ("privatePort", InternalPort),
                ("localIP", Destination),
                ("enable", Literal("1")),
            ],
        ),
    ),
    html_vendor(
        "Billion",
        "Billion",
        form_login(&["/login.cgi"], USER_PASS, PasswordEncoding::Md5Hex, "sessionid"),
        form_rule(
            "/portforward.cgi",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    json_vendor(
        "SmartRG",
        "SmartRG",
        bearer_login("/api/v1/session", PasswordEncoding::Sha256Hex, "token"),
        json_rule(
            "/api/v1/nat/port-forward",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("wan_port", ExternalPort),
                ("lan_port", InternalPort),
                ("lan_ip", Destination),
                ("enabled", Flag(true)),
            ],
        ),
    ),
    html_vendor(
        "Edimax",
        "Edimax",
        form_login(&["/cgi-bin/login.cgi"], USER_PASS, PasswordEncoding::Md5Hex, "session_id"),
        form_rule(
            "/cgi-bin/port_forwarding.cgi",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("public_port", ExternalPort),
                ("private_port", InternalPort),
                ("ip_addr", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    html_vendor(
        "Comtrend",
        "Comtrend",
        form_login(&["/login.cgi"], USER_PASS, PasswordEncoding::Base64, "sessionKey"),
        form_rule(
            "/nat/portforward.cgi",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_client", Destination),
                ("enabled", Literal("1")),
            ],
        ),
    ),
    json_vendor(
        "Pace",
        "Pace",
        bearer_login("/login", PasswordEncoding::Sha256Hex, "access_token"),
        json_rule(
            "/api/port-forwarding",
            &[
                ("description", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Flag(true)),
            ],
        ),
    ),
    VendorProfile {
        id: "Xiaomi",
        name: "Xiaomi",
        scheme: Scheme::Http,
        auth: AuthScheme::TokenExchange {
            path: "/cgi-bin/luci/api/xqsystem/login",
            fields: LoginFields::new("username", "password"),
            body: LoginBody::Json,
            password: PasswordEncoding::Sha1WithNonce,
            nonce_path: Some("/cgi-bin/luci/api/xqsystem/nonce"),
            token: TokenSource::JsonField("token"),
            placement: TokenPlacement::RawAuthorization,
        },
        csrf: None,
        install: json_rule(
            "/cgi-bin/luci/api/xqsystem/port_forward",
            &[
                ("name", RuleName),
                ("proto", ProtocolLower),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Flag(true)),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/cgi-bin/luci/api/xqsystem/port_forward",
        },
        parsing: ParsingStrategy::Json,
    },
    VendorProfile {
        id: "OpenWrt",
        name: "OpenWrt (LuCI)",
        scheme: Scheme::Http,
        auth: form_login(
            &["/cgi-bin/luci/admin/login"],
            &[LoginFields::new("luci_username", "luci_password")],
            PasswordEncoding::Plain,
            "sysauth",
        ),
        csrf: Some(CsrfSpec {
            page: "/cgi-bin/luci/admin/network/firewall/forwards",
            selector: r#"input[name="token"]"#,
            attribute: "value",
            placement: CsrfPlacement::FormField("token"),
        }),
        install: form_rule(
            "/cgi-bin/luci/admin/network/firewall/forwards",
            &[
                ("name", RuleName),
                ("proto", ProtocolLower),
                ("src_port", ExternalPort),
                ("dest_port", InternalPort),
                ("dest_ip", Destination),
                ("target", Literal("DNAT")),
                ("enabled", Literal("1")),
            ],
        ),
        verify: Verification::ListEcho {
            path: "/cgi-bin/luci/admin/network/firewall/forwards",
        },
        parsing: ParsingStrategy::HtmlScrape,
    },
    VendorProfile {
        id: MANUAL_ID,
        name: "Generic / manual",
        scheme: Scheme::Http,
        auth: AuthScheme::Chain(&[
            AuthScheme::BasicAuth { probe_path: "/" },
            AuthScheme::FormPost {
                paths: &["/login.cgi", "/login.asp", "/login.htm", "/login", "/cgi-bin/login"],
                fields: &[
                    LoginFields::new("username", "password"),
                    LoginFields::new("user", "pass"),
                    LoginFields::new("login", "password"),
                    LoginFields::new("admin_name", "admin_pwd"),
                ],
                body: LoginBody::Form,
                password: PasswordEncoding::Plain,
                extra: &[],
                check: SessionCheck::Status,
            },
        ]),
        csrf: None,
        install: form_rule(
            "/port_forward.cgi",
            &[
                ("name", RuleName),
                ("protocol", Protocol),
                ("external_port", ExternalPort),
                ("internal_port", InternalPort),
                ("internal_ip", Destination),
                ("enabled", Literal("1")),
            ],
        ),
        // No known rule page to read back from an unidentified router.
        verify: Verification::BestEffort,
        parsing: ParsingStrategy::HtmlScrape,
    },
];

/// Every profile in the catalog, `manual` last.
pub fn all() -> &'static [VendorProfile] {
    PROFILES
}

/// Vendor profiles only, without the generic fallback.
pub fn vendors() -> impl Iterator<Item = &'static VendorProfile> {
    PROFILES.iter().filter(|p| !p.is_manual())
}

/// Find a profile by `routerType`, case-insensitively. `Generic` is an
/// alias of `manual`.
pub fn lookup(router_type: &str) -> Option<&'static VendorProfile> {
    let key = router_type.trim();
    let key = if key.eq_ignore_ascii_case(GENERIC_ALIAS) {
        MANUAL_ID
    } else {
        key
    };
    PROFILES.iter().find(|p| p.id.eq_ignore_ascii_case(key))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_covers_all_vendors_and_manual() {
        assert_eq!(vendors().count(), 31);
        assert_eq!(all().len(), 32);
        assert!(all().last().unwrap().is_manual());
    }

    #[test]
    fn identifiers_are_unique_ignoring_case() {
        let ids: HashSet<String> = all().iter().map(|p| p.id.to_ascii_lowercase()).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("asus").unwrap().id, "ASUS");
        assert_eq!(lookup("tp-link").unwrap().id, "TP-Link");
        assert_eq!(lookup(" OpenWrt ").unwrap().id, "OpenWrt");
    }

    #[test]
    fn generic_is_manual() {
        assert!(lookup("Generic").unwrap().is_manual());
        assert!(lookup("manual").unwrap().is_manual());
    }

    #[test]
    fn unknown_type_is_none() {
        assert!(lookup("Commodore").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn every_template_names_the_rule_and_destination() {
        for profile in all() {
            let values: Vec<FieldValue> = profile.install.fields.iter().map(|(_, v)| *v).collect();
            assert!(values.contains(&RuleName), "{} has no rule name", profile.id);
            assert!(values.contains(&Destination), "{} has no destination", profile.id);
            assert!(values.contains(&ExternalPort), "{} has no external port", profile.id);
        }
    }

    #[test]
    fn only_the_generic_profile_is_best_effort() {
        for profile in all() {
            assert_eq!(
                profile.lists_rules(),
                !profile.is_manual(),
                "{} verification",
                profile.id
            );
        }
    }

    #[test]
    fn generic_profile_tries_basic_before_forms() {
        let AuthScheme::Chain(schemes) = lookup("manual").unwrap().auth else {
            panic!("generic profile should chain login schemes");
        };
        assert_eq!(schemes.len(), 2);
        assert!(matches!(schemes[0], AuthScheme::BasicAuth { probe_path: "/" }));
        assert!(matches!(schemes[1], AuthScheme::FormPost { .. }));
        assert!(!schemes.iter().any(|s| matches!(s, AuthScheme::Chain(_))));
    }

    #[test]
    fn token_templates_use_path_placement() {
        for profile in all() {
            if profile.install.path.contains("{token}") {
                assert!(matches!(
                    profile.auth,
                    AuthScheme::TokenExchange {
                        placement: TokenPlacement::PathSegment,
                        ..
                    }
                ));
            }
        }
    }
}
