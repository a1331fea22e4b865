// Shared transport configuration for building router sessions.
//
// Timeout, retry, redirect and TLS settings live here so every session
// is built the same way. Each session gets its own cookie jar.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use url::Url;

use crate::error::Error;
use crate::profile::Scheme;

/// Admin panels sniff user agents; some refuse anything that isn't a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (router admin panels are self-signed).
    DangerAcceptInvalid,
}

/// Shared transport configuration for router sessions.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after a connect error or timeout. 4xx/5xx are never retried.
    pub retries: u32,
    /// Base delay between retries; multiplied by the attempt number.
    pub retry_backoff: Duration,
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
    /// Replaces `scheme://router-ip/` as the admin origin when set.
    pub origin_override: Option<Url>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(5),
            retries: 2,
            retry_backoff: Duration::from_millis(250),
            max_redirects: 5,
            origin_override: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` bound to the given cookie jar.
    pub fn build_client(&self, jar: &Arc<Jar>) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(Policy::limited(self.max_redirects))
            .cookie_provider(Arc::clone(jar));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// The admin-panel origin for a router: the override if configured,
    /// otherwise `scheme://ip/`.
    pub fn origin_for(&self, scheme: Scheme, ip: Ipv4Addr) -> Result<Url, Error> {
        if let Some(ref origin) = self.origin_override {
            return Ok(origin.clone());
        }
        Ok(Url::parse(&format!("{}://{ip}/", scheme.as_str()))?)
    }
}
