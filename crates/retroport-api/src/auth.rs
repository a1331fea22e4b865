// Router authentication
//
// Drives the login flow a vendor profile declares and leaves the
// resulting auth material on the session: cookies in the jar, Basic
// credentials, an Authorization header, or a token for path/SOAP
// placement. A CSRF token is scraped afterwards when the profile needs
// one.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, HeaderName};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Error;
use crate::html;
use crate::profile::{
    AuthScheme, CsrfSpec, LoginBody, LoginFields, PasswordEncoding, SessionCheck, TokenPlacement,
    TokenSource, VendorProfile,
};
use crate::session::{RouterResponse, RouterSession};
use crate::soap;

/// Phrases admin panels render on a failed login page.
static LOGIN_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(invalid|incorrect|wrong|bad)\s+(user(\s*name)?|password|credentials|login)|login\s+(failed|error)|authentication\s+failed|access\s+denied",
    )
    .expect("invalid login failure regex")
});

/// Username and password for a router admin panel.
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: SecretString,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Encode a password the way a firmware expects it on the wire.
pub fn encode_password(encoding: PasswordEncoding, password: &str, nonce: Option<&str>) -> String {
    match encoding {
        PasswordEncoding::Plain => password.to_owned(),
        PasswordEncoding::Md5Hex => format!("{:x}", md5::compute(password.as_bytes())),
        PasswordEncoding::Sha256Hex => hex::encode(Sha256::digest(password.as_bytes())),
        PasswordEncoding::Base64 => BASE64.encode(password.as_bytes()),
        PasswordEncoding::Sha1WithNonce => {
            let salted = format!("{password}{}", nonce.unwrap_or_default());
            hex::encode(Sha1::digest(salted.as_bytes()))
        }
    }
}

/// Log in to the router using the profile's auth scheme.
///
/// On success the session carries whatever later requests need. A
/// missing CSRF token is logged and otherwise ignored; the rule
/// submission will surface any real problem.
pub async fn authenticate(
    session: &mut RouterSession,
    profile: &VendorProfile,
    credentials: &LoginCredentials,
) -> Result<(), Error> {
    debug!(vendor = profile.id, scheme = profile.auth.label(), "logging in");

    match profile.auth {
        AuthScheme::Chain(schemes) => chain_login(session, schemes, credentials).await?,
        other => login_with(session, &other, credentials).await?,
    }

    if let Some(csrf) = profile.csrf {
        fetch_csrf(session, &csrf).await;
    }

    debug!(vendor = profile.id, "login successful");
    Ok(())
}

async fn login_with(
    session: &mut RouterSession,
    auth: &AuthScheme,
    credentials: &LoginCredentials,
) -> Result<(), Error> {
    match *auth {
        AuthScheme::BasicAuth { probe_path } => basic_login(session, probe_path, credentials).await,
        AuthScheme::FormPost {
            paths,
            fields,
            body,
            password,
            extra,
            check,
        } => {
            let attempt = FormAttempt {
                body,
                password,
                extra,
                check,
            };
            form_login(session, paths, fields, &attempt, credentials).await
        }
        AuthScheme::TokenExchange {
            path,
            fields,
            body,
            password,
            nonce_path,
            token,
            placement,
        } => {
            let exchange = TokenExchange {
                path,
                fields,
                body,
                password,
                nonce_path,
                token,
                placement,
            };
            token_login(session, &exchange, credentials).await
        }
        AuthScheme::Chain(_) => Err(Error::UnexpectedResponse {
            message: "nested login chains are not supported".into(),
        }),
    }
}

// ── Chain ────────────────────────────────────────────────────────────

/// Try each scheme in order; the first that logs in wins. A failed step
/// leaves no Basic credentials behind for the next one.
async fn chain_login(
    session: &mut RouterSession,
    schemes: &[AuthScheme],
    credentials: &LoginCredentials,
) -> Result<(), Error> {
    let mut worst: Option<Error> = None;

    for scheme in schemes {
        match login_with(session, scheme, credentials).await {
            Ok(()) => {
                debug!(scheme = scheme.label(), "login scheme accepted");
                return Ok(());
            }
            Err(err) => {
                debug!(scheme = scheme.label(), error = %err, "login scheme rejected");
                session.clear_basic_auth();
                if err.is_unreachable() {
                    return Err(err);
                }
                if worst.as_ref().is_none_or(|w| rank(&err) > rank(w)) {
                    worst = Some(err);
                }
            }
        }
    }

    Err(worst.unwrap_or_else(|| Error::UnexpectedResponse {
        message: "no login scheme configured".into(),
    }))
}

// ── Basic ────────────────────────────────────────────────────────────

async fn basic_login(
    session: &mut RouterSession,
    probe_path: &str,
    credentials: &LoginCredentials,
) -> Result<(), Error> {
    session.set_basic_auth(&credentials.username, credentials.password.clone());
    let resp = session.get(probe_path).await?;
    if resp.is_auth_rejected() {
        return Err(Error::InvalidCredentials {
            message: format!("HTTP {}", resp.status),
        });
    }
    if !resp.is_success() {
        return Err(Error::UnexpectedResponse {
            message: format!("login probe {probe_path} returned HTTP {}", resp.status),
        });
    }
    Ok(())
}

// ── Form post ────────────────────────────────────────────────────────

struct FormAttempt {
    body: LoginBody,
    password: PasswordEncoding,
    extra: &'static [(&'static str, &'static str)],
    check: SessionCheck,
}

/// Try every path and field-name combination until one logs in.
///
/// A bad-credentials verdict from any candidate outranks "unexpected
/// response", which outranks "unreachable".
async fn form_login(
    session: &mut RouterSession,
    paths: &[&str],
    fields: &[LoginFields],
    attempt: &FormAttempt,
    credentials: &LoginCredentials,
) -> Result<(), Error> {
    let password = encode_password(attempt.password, credentials.password.expose_secret(), None);
    let mut worst: Option<Error> = None;

    for path in paths {
        for names in fields {
            let outcome = post_login(session, path, *names, attempt, &credentials.username, &password)
                .await
                .and_then(|resp| check_session(session, &resp, attempt.check));
            match outcome {
                Ok(()) => {
                    debug!(path, username_field = names.username, "form login accepted");
                    return Ok(());
                }
                Err(err) => {
                    debug!(path, error = %err, "login candidate rejected");
                    let unreachable = err.is_unreachable();
                    if worst.as_ref().is_none_or(|w| rank(&err) > rank(w)) {
                        worst = Some(err);
                    }
                    // Every other candidate targets the same host.
                    if unreachable {
                        break;
                    }
                }
            }
        }
        if worst.as_ref().is_some_and(Error::is_unreachable) {
            break;
        }
    }

    Err(worst.unwrap_or_else(|| Error::UnexpectedResponse {
        message: "no login endpoint configured".into(),
    }))
}

fn rank(err: &Error) -> u8 {
    match err {
        Error::InvalidCredentials { .. } => 3,
        Error::UnexpectedResponse { .. } => 2,
        _ if err.is_unreachable() => 0,
        _ => 1,
    }
}

async fn post_login(
    session: &mut RouterSession,
    path: &str,
    names: LoginFields,
    attempt: &FormAttempt,
    username: &str,
    password: &str,
) -> Result<RouterResponse, Error> {
    match attempt.body {
        LoginBody::Form => {
            let mut form = vec![
                (names.username.to_owned(), username.to_owned()),
                (names.password.to_owned(), password.to_owned()),
            ];
            form.extend(attempt.extra.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));
            session.post_form(path, form).await
        }
        LoginBody::Json => {
            let mut body = Map::new();
            body.insert(names.username.into(), username.into());
            body.insert(names.password.into(), password.into());
            for (k, v) in attempt.extra {
                body.insert((*k).into(), (*v).into());
            }
            session.post_json(path, Value::Object(body)).await
        }
        LoginBody::Soap { action, element } => {
            let envelope = soap::envelope(
                element,
                &[
                    (names.username, username.to_owned()),
                    (names.password, password.to_owned()),
                ],
                soap::ANONYMOUS_SESSION,
            );
            session.post_soap(path, action, envelope).await
        }
    }
}

fn check_session(
    session: &RouterSession,
    resp: &RouterResponse,
    check: SessionCheck,
) -> Result<(), Error> {
    if resp.is_auth_rejected() {
        return Err(Error::InvalidCredentials {
            message: format!("HTTP {}", resp.status),
        });
    }
    if !resp.is_success() {
        return Err(Error::UnexpectedResponse {
            message: format!("login returned HTTP {}", resp.status),
        });
    }

    let established = match check {
        SessionCheck::Cookie(name) => session.cookie(name).is_some(),
        SessionCheck::AnyCookie => session.has_cookies(),
        SessionCheck::Status => !LOGIN_FAILURE.is_match(&resp.body),
    };
    if established {
        return Ok(());
    }
    Err(missing_marker(resp, || match check {
        SessionCheck::Cookie(name) => format!("login did not set the {name} cookie"),
        _ => "login did not establish a session".into(),
    }))
}

/// A success status without the expected marker is either a login
/// failure page or a firmware we don't understand.
fn missing_marker(resp: &RouterResponse, describe: impl FnOnce() -> String) -> Error {
    if let Some(found) = LOGIN_FAILURE.find(&resp.body) {
        return Error::InvalidCredentials {
            message: found.as_str().to_owned(),
        };
    }
    Error::UnexpectedResponse {
        message: describe(),
    }
}

// ── Token exchange ───────────────────────────────────────────────────

struct TokenExchange {
    path: &'static str,
    fields: LoginFields,
    body: LoginBody,
    password: PasswordEncoding,
    nonce_path: Option<&'static str>,
    token: TokenSource,
    placement: TokenPlacement,
}

async fn token_login(
    session: &mut RouterSession,
    exchange: &TokenExchange,
    credentials: &LoginCredentials,
) -> Result<(), Error> {
    let nonce = match exchange.nonce_path {
        Some(path) => Some(fetch_nonce(session, path).await?),
        None => None,
    };
    let password = encode_password(
        exchange.password,
        credentials.password.expose_secret(),
        nonce.as_deref(),
    );

    let attempt = FormAttempt {
        body: exchange.body,
        password: exchange.password,
        extra: &[],
        check: SessionCheck::Status,
    };
    let resp = if let (LoginBody::Json, Some(nonce)) = (exchange.body, &nonce) {
        let mut body = Map::new();
        body.insert(exchange.fields.username.into(), credentials.username.clone().into());
        body.insert(exchange.fields.password.into(), password.into());
        body.insert("nonce".into(), nonce.clone().into());
        session.post_json(exchange.path, Value::Object(body)).await?
    } else {
        post_login(
            session,
            exchange.path,
            exchange.fields,
            &attempt,
            &credentials.username,
            &password,
        )
        .await?
    };

    if resp.is_auth_rejected() {
        return Err(Error::InvalidCredentials {
            message: format!("HTTP {}", resp.status),
        });
    }
    if !resp.is_success() {
        return Err(Error::UnexpectedResponse {
            message: format!("login returned HTTP {}", resp.status),
        });
    }

    let token = read_token(session, &resp, exchange.token)
        .ok_or_else(|| missing_marker(&resp, || "login response carried no session token".into()))?;

    place_token(session, token, exchange.placement)
}

async fn fetch_nonce(session: &mut RouterSession, path: &str) -> Result<String, Error> {
    let resp = session.get(path).await?;
    if !resp.is_success() {
        return Err(Error::UnexpectedResponse {
            message: format!("nonce endpoint returned HTTP {}", resp.status),
        });
    }
    resp.json_value()
        .as_ref()
        .and_then(|v| json_path(v, "nonce"))
        .ok_or_else(|| Error::UnexpectedResponse {
            message: "nonce endpoint returned no nonce".into(),
        })
}

fn read_token(session: &RouterSession, resp: &RouterResponse, source: TokenSource) -> Option<String> {
    match source {
        TokenSource::Cookie(name) => session.cookie(name),
        TokenSource::Header(name) => resp.header(name).filter(|v| !v.is_empty()).map(str::to_owned),
        TokenSource::JsonField(path) => resp.json_value().as_ref().and_then(|v| json_path(v, path)),
        TokenSource::XmlElement(tag) => soap::element_text(&resp.body, tag),
    }
}

/// Look up a dotted path such as `data.stok`; strings and numbers only.
pub(crate) fn json_path(value: &Value, path: &str) -> Option<String> {
    let found = path.split('.').try_fold(value, |v, key| v.get(key))?;
    match found {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn place_token(
    session: &mut RouterSession,
    token: String,
    placement: TokenPlacement,
) -> Result<(), Error> {
    match placement {
        TokenPlacement::CookieJar => Ok(()),
        TokenPlacement::Bearer => session.set_header(AUTHORIZATION, &format!("Bearer {token}")),
        TokenPlacement::RawAuthorization => session.set_header(AUTHORIZATION, &token),
        TokenPlacement::Header(name) => {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                Error::UnexpectedResponse {
                    message: format!("invalid token header name {name}"),
                }
            })?;
            session.set_header(name, &token)
        }
        TokenPlacement::PathSegment | TokenPlacement::SoapSession => {
            session.set_token(token);
            Ok(())
        }
    }
}

// ── CSRF ─────────────────────────────────────────────────────────────

async fn fetch_csrf(session: &mut RouterSession, csrf: &CsrfSpec) {
    let resp = match session.get(csrf.page).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(page = csrf.page, error = %e, "could not fetch CSRF page");
            return;
        }
    };
    match html::extract_attribute(&resp.body, csrf.selector, csrf.attribute) {
        Some(token) => session.set_csrf(token, csrf.placement),
        None => warn!(page = csrf.page, "no CSRF token found; continuing without one"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn password_encodings() {
        assert_eq!(encode_password(PasswordEncoding::Plain, "admin", None), "admin");
        assert_eq!(
            encode_password(PasswordEncoding::Md5Hex, "admin", None),
            "21232f297a57a5a743894a0e4a801fc3"
        );
        assert_eq!(
            encode_password(PasswordEncoding::Sha256Hex, "admin", None),
            "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
        );
        assert_eq!(encode_password(PasswordEncoding::Base64, "admin", None), "YWRtaW4=");
    }

    #[test]
    fn nonce_is_appended_before_hashing() {
        assert_eq!(
            encode_password(PasswordEncoding::Sha1WithNonce, "admin", Some("")),
            "d033e22ae348aeb5660fc2140aec35850c4da997"
        );
        assert_ne!(
            encode_password(PasswordEncoding::Sha1WithNonce, "admin", Some("n1")),
            encode_password(PasswordEncoding::Sha1WithNonce, "admin", Some("n2"))
        );
    }

    #[test]
    fn json_path_walks_objects() {
        let body = json!({"error_code": 0, "data": {"stok": "abc"}, "id": 7});
        assert_eq!(json_path(&body, "data.stok").as_deref(), Some("abc"));
        assert_eq!(json_path(&body, "id").as_deref(), Some("7"));
        assert_eq!(json_path(&body, "data.missing"), None);
        assert_eq!(json_path(&json!({"token": ""}), "token"), None);
    }

    #[test]
    fn failure_pages_are_recognised() {
        assert!(LOGIN_FAILURE.is_match("<p>Invalid password, try again</p>"));
        assert!(LOGIN_FAILURE.is_match("Login failed"));
        assert!(LOGIN_FAILURE.is_match("incorrect username"));
        assert!(!LOGIN_FAILURE.is_match("<title>Router status</title>"));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = LoginCredentials::new("admin", SecretString::from("s3cret".to_owned()));
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[test]
    fn rank_prefers_credentials_verdict() {
        let creds = Error::InvalidCredentials {
            message: String::new(),
        };
        let unexpected = Error::UnexpectedResponse {
            message: String::new(),
        };
        let timeout = Error::Timeout {
            url: String::new(),
            timeout_secs: 5,
        };
        assert!(rank(&creds) > rank(&unexpected));
        assert!(rank(&unexpected) > rank(&timeout));
    }
}
