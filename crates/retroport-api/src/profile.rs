// Vendor profile data model
//
// A `VendorProfile` is pure data: how one router brand's admin panel
// logs in, where rules are submitted, how they are encoded, and how the
// result can be checked. Behaviour is dispatched on the tagged enums
// below; adding a vendor means adding a table entry in `catalog`.

use std::fmt;

/// URL scheme of the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// How the password is transformed before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordEncoding {
    Plain,
    Md5Hex,
    Sha256Hex,
    Base64,
    /// SHA-1 hex of `password + nonce`; the nonce is fetched first.
    Sha1WithNonce,
}

/// Names of the username and password fields in a login body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginFields {
    pub username: &'static str,
    pub password: &'static str,
}

impl LoginFields {
    pub const fn new(username: &'static str, password: &'static str) -> Self {
        Self { username, password }
    }
}

/// Encoding of a login request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBody {
    Form,
    Json,
    /// SOAP envelope; `element` wraps the credential fields.
    Soap {
        action: &'static str,
        element: &'static str,
    },
}

/// What proves a form login succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// A specific session cookie must be set.
    Cookie(&'static str),
    /// Any cookie must be set.
    AnyCookie,
    /// Any non-error status is accepted.
    Status,
}

/// Where an exchanged token is read from in the login response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cookie(&'static str),
    Header(&'static str),
    /// Dotted path into a JSON body, e.g. `"data.stok"`.
    JsonField(&'static str),
    /// First element with this tag name in an XML body.
    XmlElement(&'static str),
}

/// How an exchanged token is attached to later requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    /// The token is a cookie already held by the jar.
    CookieJar,
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// `Authorization: <token>`.
    RawAuthorization,
    /// A vendor-specific header.
    Header(&'static str),
    /// Substituted for `{token}` in endpoint templates.
    PathSegment,
    /// Sent as `<SessionID>` in the SOAP header.
    SoapSession,
}

/// Login flow of a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// HTTP Basic credentials on every request, validated with one GET.
    BasicAuth { probe_path: &'static str },
    /// Credentials posted to a login page; the session lives in cookies.
    /// Several paths and field sets may be tried in order.
    FormPost {
        paths: &'static [&'static str],
        fields: &'static [LoginFields],
        body: LoginBody,
        password: PasswordEncoding,
        extra: &'static [(&'static str, &'static str)],
        check: SessionCheck,
    },
    /// Credentials exchanged for a token carried by later requests.
    TokenExchange {
        path: &'static str,
        fields: LoginFields,
        body: LoginBody,
        password: PasswordEncoding,
        nonce_path: Option<&'static str>,
        token: TokenSource,
        placement: TokenPlacement,
    },
    /// Each scheme tried in order until one logs in. Chains do not nest.
    Chain(&'static [AuthScheme]),
}

impl AuthScheme {
    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BasicAuth { .. } => "basic",
            Self::FormPost { .. } => "form",
            Self::TokenExchange { .. } => "token",
            Self::Chain(_) => "auto",
        }
    }
}

/// Value of one field in a rule submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Literal(&'static str),
    Flag(bool),
    Int(i64),
    /// `DreamPi_<PROTO>_<PORT>`.
    RuleName,
    /// `TCP` / `UDP`.
    Protocol,
    /// `tcp` / `udp`.
    ProtocolLower,
    ExternalPort,
    InternalPort,
    Destination,
}

/// Wire encoding of a rule submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    Form,
    Json,
    Soap {
        action: &'static str,
        element: &'static str,
    },
}

/// Where and how one rule is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTemplate {
    /// Endpoint path; may contain `{token}`.
    pub path: &'static str,
    pub encoding: PayloadEncoding,
    pub fields: &'static [(&'static str, FieldValue)],
}

/// How admin-panel responses are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingStrategy {
    HtmlScrape,
    Json,
}

/// How an installed rule is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// A 2xx answer to the submission is taken as success.
    BestEffort,
    /// The rule must show up in the list served at `path`.
    ListEcho { path: &'static str },
    /// The rule must show up in the answer to an HNAP `element` query
    /// posted to the install endpoint.
    SoapList {
        action: &'static str,
        element: &'static str,
    },
}

/// Where a CSRF token goes on mutating requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfPlacement {
    FormField(&'static str),
    Header(&'static str),
}

/// How to scrape a CSRF token after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrfSpec {
    /// Page carrying the token.
    pub page: &'static str,
    /// CSS selector of the carrying element.
    pub selector: &'static str,
    /// Attribute holding the token value.
    pub attribute: &'static str,
    pub placement: CsrfPlacement,
}

/// How one router brand's admin interface behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorProfile {
    /// Identifier the UI sends as `routerType`.
    pub id: &'static str,
    pub name: &'static str,
    pub scheme: Scheme,
    pub auth: AuthScheme,
    pub csrf: Option<CsrfSpec>,
    pub install: RuleTemplate,
    pub verify: Verification,
    pub parsing: ParsingStrategy,
}

impl VendorProfile {
    /// The generic fallback profile used for `routerType = "manual"`.
    pub fn is_manual(&self) -> bool {
        self.id == crate::catalog::MANUAL_ID
    }

    /// Whether installed rules can be read back from the router.
    pub fn lists_rules(&self) -> bool {
        !matches!(self.verify, Verification::BestEffort)
    }
}

impl fmt::Display for VendorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Substitute `{token}` in an endpoint template.
pub fn expand_path(template: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => template.replace("{token}", token),
        None => template.replace("{token}", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_token_placeholder() {
        let path = "/cgi-bin/luci/;stok={token}/admin/port_forward/add";
        assert_eq!(
            expand_path(path, Some("abc")),
            "/cgi-bin/luci/;stok=abc/admin/port_forward/add"
        );
        assert_eq!(
            expand_path(path, None),
            "/cgi-bin/luci/;stok=/admin/port_forward/add"
        );
    }

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_path("/portforward.cgi", Some("x")), "/portforward.cgi");
    }
}
