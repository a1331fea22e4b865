use thiserror::Error;

/// Top-level error type for the `retroport-api` crate.
///
/// Covers every failure mode of talking to a router admin panel:
/// transport, authentication, CSRF handling and rule submission.
/// `retroport-core` maps these into the user-facing setup taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The router rejected the credentials (HTTP 401/403 or a login
    /// failure page).
    #[error("Authentication failed: {message}")]
    InvalidCredentials { message: String },

    /// The router answered, but not in the shape the vendor profile
    /// expects. Usually a firmware revision the profile doesn't know.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, host down, DNS failure.
    #[error("Router unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Redirect chain exceeded the configured cap.
    #[error("Too many redirects from {url}")]
    TooManyRedirects { url: String },

    /// Any other HTTP transport error.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A request body could not be cloned for a retry.
    #[error("Request to {url} cannot be retried (streaming body)")]
    NotRetryable { url: String },

    // ── Rule submission ─────────────────────────────────────────────
    /// The router refused a rule submission.
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    /// The submission was accepted but the rule is missing from the
    /// router's rule list afterwards.
    #[error("rule not present in the router's rule list after submission")]
    NotEchoed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with a body preview for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient transport error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable { .. } | Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the router could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
            || matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// Classify a raw `reqwest` error against the URL it was sent to.
    pub(crate) fn from_send(err: reqwest::Error, url: &url::Url, timeout_secs: u64) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            Self::Timeout { url, timeout_secs }
        } else if err.is_connect() {
            Self::Unreachable { url, source: err }
        } else if err.is_redirect() {
            Self::TooManyRedirects { url }
        } else {
            Self::Transport(err)
        }
    }
}
