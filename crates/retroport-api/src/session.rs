// Router session
//
// One `RouterSession` per setup attempt: an HTTP client bound to a fresh
// cookie jar, the admin origin, and whatever auth material the login
// flow produced (Basic credentials, auth headers, a token, a CSRF
// token). Request helpers buffer the whole body so callers can inspect
// it synchronously.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cookie::Cookie;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::profile::CsrfPlacement;
use crate::transport::TransportConfig;

/// Longest body preview kept in deserialization errors.
const BODY_PREVIEW: usize = 512;

/// A fully buffered admin-panel response.
#[derive(Debug, Clone)]
pub struct RouterResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: Url,
    pub body: String,
}

impl RouterResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 401 or 403.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        )
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: preview(&self.body),
        })
    }

    /// The body as a JSON value, if it is JSON at all.
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

/// Request body variants the session knows how to send.
#[derive(Debug, Clone)]
enum Body {
    Empty,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
    Soap { action: String, envelope: String },
}

/// Authenticated HTTP session against one router's admin panel.
pub struct RouterSession {
    http: reqwest::Client,
    origin: Url,
    jar: Arc<Jar>,
    timeout: Duration,
    retries: u32,
    retry_backoff: Duration,
    basic: Option<(String, SecretString)>,
    headers: HeaderMap,
    token: Option<String>,
    csrf_placement: Option<CsrfPlacement>,
    csrf_token: Option<String>,
}

impl RouterSession {
    /// Create a session rooted at `origin` with an empty cookie jar.
    pub fn new(origin: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let http = transport.build_client(&jar)?;
        Ok(Self {
            http,
            origin,
            jar,
            timeout: transport.timeout,
            retries: transport.retries,
            retry_backoff: transport.retry_backoff,
            basic: None,
            headers: HeaderMap::new(),
            token: None,
            csrf_placement: None,
            csrf_token: None,
        })
    }

    /// The admin-panel origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve an absolute path against the origin.
    ///
    /// Paths are joined textually so firmware paths such as
    /// `/cgi-bin/luci/;stok=abc/...` survive unchanged.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.origin.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Auth material ────────────────────────────────────────────────

    /// Send HTTP Basic credentials on every request from now on.
    pub fn set_basic_auth(&mut self, username: &str, password: SecretString) {
        self.basic = Some((username.to_owned(), password));
    }

    pub fn clear_basic_auth(&mut self) {
        self.basic = None;
    }

    /// Attach a header to every request from now on.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), Error> {
        let mut value = HeaderValue::from_str(value).map_err(|_| Error::UnexpectedResponse {
            message: format!("token is not a valid {name} header value"),
        })?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Session token for path or SOAP placement, if one was exchanged.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store a scraped CSRF token and where it goes on mutating requests.
    pub fn set_csrf(&mut self, token: String, placement: CsrfPlacement) {
        debug!("storing CSRF token");
        self.csrf_token = Some(token);
        self.csrf_placement = Some(placement);
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Value of a cookie the jar holds for the origin.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.origin)?;
        let header = header.to_str().ok()?;
        Cookie::split_parse(header)
            .filter_map(Result::ok)
            .find(|c| c.name() == name && !c.value().is_empty())
            .map(|c| c.value().to_owned())
    }

    /// Whether the jar holds any cookie for the origin.
    pub fn has_cookies(&self) -> bool {
        self.jar
            .cookies(&self.origin)
            .is_some_and(|h| !h.is_empty())
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub async fn get(&mut self, path: &str) -> Result<RouterResponse, Error> {
        self.send(Method::GET, path, Body::Empty).await
    }

    /// POST an urlencoded form. A form-field CSRF token is appended.
    pub async fn post_form(
        &mut self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<RouterResponse, Error> {
        self.send(Method::POST, path, Body::Form(fields)).await
    }

    pub async fn post_json(
        &mut self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<RouterResponse, Error> {
        self.send(Method::POST, path, Body::Json(body)).await
    }

    /// POST a SOAP envelope with its `SOAPAction` header.
    pub async fn post_soap(
        &mut self,
        path: &str,
        action: &str,
        envelope: String,
    ) -> Result<RouterResponse, Error> {
        let body = Body::Soap {
            action: action.to_owned(),
            envelope,
        };
        self.send(Method::POST, path, body).await
    }

    async fn send(&mut self, method: Method, path: &str, body: Body) -> Result<RouterResponse, Error> {
        let url = self.url(path)?;
        debug!("{} {}", method, url);

        let builder = self.prepare(method, url.clone(), body);
        let timeout_secs = self.timeout.as_secs();

        let (builder, target) = (&builder, &url);
        let resp = with_retries(self.retries, self.retry_backoff, || async move {
            let request = builder.try_clone().ok_or_else(|| Error::NotRetryable {
                url: target.to_string(),
            })?;
            request
                .send()
                .await
                .map_err(|e| Error::from_send(e, target, timeout_secs))
        })
        .await?;
        self.buffer(resp).await
    }

    fn prepare(&self, method: Method, url: Url, body: Body) -> reqwest::RequestBuilder {
        let mutating = method != Method::GET;
        let mut builder = self.http.request(method, url).headers(self.headers.clone());

        if let Some((user, pass)) = &self.basic {
            builder = builder.basic_auth(user, Some(pass.expose_secret()));
        }

        let csrf = if mutating {
            self.csrf_token.as_deref().zip(self.csrf_placement)
        } else {
            None
        };
        if let Some((token, CsrfPlacement::Header(name))) = csrf {
            builder = builder.header(name, token);
        }

        match body {
            Body::Empty => builder,
            Body::Form(mut fields) => {
                if let Some((token, CsrfPlacement::FormField(name))) = csrf {
                    if !fields.iter().any(|(k, _)| k == name) {
                        fields.push((name.to_owned(), token.to_owned()));
                    }
                }
                builder.form(&fields)
            }
            Body::Json(value) => builder.json(&value),
            Body::Soap { action, envelope } => builder
                .header(CONTENT_TYPE, "text/xml; charset=utf-8")
                .header("SOAPAction", action)
                .body(envelope),
        }
    }

    async fn buffer(&mut self, resp: reqwest::Response) -> Result<RouterResponse, Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(%status, bytes = body.len(), "response from {url}");

        self.update_csrf_from_response(&headers);

        Ok(RouterResponse {
            status,
            headers,
            url,
            body,
        })
    }

    /// Header-placed CSRF tokens may be rotated by the router.
    fn update_csrf_from_response(&mut self, headers: &HeaderMap) {
        let Some(CsrfPlacement::Header(name)) = self.csrf_placement else {
            return;
        };
        let rotated = headers
            .get("X-Updated-CSRF-Token")
            .or_else(|| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from);
        if let Some(token) = rotated {
            trace!("CSRF token rotated");
            self.csrf_token = Some(token);
        }
    }
}

/// Run `op`, re-running it up to `retries` times while it fails with a
/// transient transport error. HTTP statuses never reach this as errors.
pub(crate) async fn with_retries<T, F, Fut>(retries: u32, backoff: Duration, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if attempt < retries && err.is_transient() => {
                attempt += 1;
                debug!(attempt, error = %err, "retrying request");
                tokio::time::sleep(backoff * attempt).await;
            }
            result => return result,
        }
    }
}

impl std::fmt::Debug for RouterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterSession")
            .field("origin", &self.origin.as_str())
            .field("basic_auth", &self.basic.is_some())
            .field("token", &self.token.is_some())
            .field("csrf", &self.csrf_token.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(origin: &str) -> RouterSession {
        RouterSession::new(Url::parse(origin).unwrap(), &TransportConfig::default()).unwrap()
    }

    #[test]
    fn url_joins_paths_textually() {
        let s = session("http://192.168.1.1/");
        assert_eq!(
            s.url("/cgi-bin/luci/;stok=abc/admin/port_forward/add")
                .unwrap()
                .as_str(),
            "http://192.168.1.1/cgi-bin/luci/;stok=abc/admin/port_forward/add"
        );
        assert_eq!(
            s.url("login.cgi").unwrap().as_str(),
            "http://192.168.1.1/login.cgi"
        );
    }

    #[test]
    fn url_keeps_origin_port() {
        let s = session("http://127.0.0.1:38080");
        assert_eq!(
            s.url("/api/v1/login").unwrap().as_str(),
            "http://127.0.0.1:38080/api/v1/login"
        );
    }

    #[test]
    fn debug_hides_secrets() {
        let mut s = session("http://10.0.0.1/");
        s.set_basic_auth("admin", SecretString::from("hunter2".to_owned()));
        let rendered = format!("{s:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("basic_auth: true"));
    }

    #[test]
    fn cookie_reads_one_value_from_the_jar() {
        let s = session("http://10.0.0.1/");
        let origin = s.origin().clone();
        s.jar.add_cookie_str("sid=abc=def; Path=/", &origin);
        s.jar.add_cookie_str("empty=; Path=/", &origin);
        s.jar.add_cookie_str("theme=dark; Path=/", &origin);

        assert_eq!(s.cookie("sid").as_deref(), Some("abc=def"));
        assert_eq!(s.cookie("theme").as_deref(), Some("dark"));
        assert_eq!(s.cookie("empty"), None);
        assert_eq!(s.cookie("missing"), None);
        assert!(s.has_cookies());
    }

    #[tokio::test]
    async fn refused_connections_are_retried_exactly_retries_times() {
        use std::sync::atomic::{AtomicU32, Ordering};

        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let client = reqwest::Client::new();
        let calls = AtomicU32::new(0);

        let (calls, client, url) = (&calls, &client, &url);
        let result = with_retries(3, Duration::from_millis(1), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| Error::from_send(e, url, 5))
        })
        .await;

        assert!(matches!(result, Err(Error::Unreachable { .. })), "{result:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), Error> = with_retries(3, Duration::from_millis(1), || {
            calls += 1;
            async {
                Err(Error::UnexpectedResponse {
                    message: "nope".into(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(BODY_PREVIEW + 10);
        assert_eq!(preview(&long).len(), BODY_PREVIEW + 3);
        assert_eq!(preview("short"), "short");
    }
}
