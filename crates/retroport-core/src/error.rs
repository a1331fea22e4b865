// ── Setup error types ──
//
// User-facing errors for one port-forward setup. Consumers never see
// HTTP status codes or raw transport failures. The
// `From<retroport_api::Error>` impl folds transport-layer errors into
// the setup taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum SetupError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Unsupported router type: {router_type}")]
    UnsupportedRouterType { router_type: String },

    #[error("Invalid IP format: '{value}' is not a dotted-quad IPv4 address")]
    InvalidIpFormat { value: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // ── Router errors ────────────────────────────────────────────────
    #[error("Router login failed. Check your credentials. ({message})")]
    InvalidCredentials { message: String },

    #[error("Cannot reach router at {address}: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("Unexpected response from router (possible firmware mismatch): {message}")]
    UnexpectedResponse { message: String },

    #[error("Failed to install {rule}: {cause}")]
    RuleInstallationFailed { rule: String, cause: String },

    // ── Discovery errors ─────────────────────────────────────────────
    #[error("Could not find {what} on the network")]
    TargetNotFound { what: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,
}

impl SetupError {
    /// Errors worth another login attempt.
    pub fn is_retryable_login(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::UnexpectedResponse { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<retroport_api::Error> for SetupError {
    fn from(err: retroport_api::Error) -> Self {
        use retroport_api::Error as Api;
        match err {
            Api::InvalidCredentials { message } => Self::InvalidCredentials { message },
            Api::UnexpectedResponse { message } => Self::UnexpectedResponse { message },
            Api::Deserialization { message, body: _ } => Self::UnexpectedResponse { message },
            Api::Unreachable { url, source } => Self::Unreachable {
                address: url,
                reason: source.to_string(),
            },
            Api::Timeout { url, timeout_secs } => Self::Unreachable {
                address: url,
                reason: format!("timed out after {timeout_secs}s"),
            },
            Api::TooManyRedirects { url } => Self::UnexpectedResponse {
                message: format!("too many redirects from {url}"),
            },
            Api::Transport(ref e) if e.is_connect() || e.is_timeout() => Self::Unreachable {
                address: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
            Api::Transport(e) => Self::UnexpectedResponse {
                message: e.to_string(),
            },
            Api::InvalidUrl(e) => Self::InvalidConfiguration {
                message: format!("invalid admin URL: {e}"),
            },
            Api::Tls(message) => Self::InvalidConfiguration { message },
            Api::NotRetryable { url } => Self::UnexpectedResponse {
                message: format!("request to {url} could not be retried"),
            },
            Api::Rejected { message, .. } => Self::UnexpectedResponse { message },
            Api::NotEchoed => Self::UnexpectedResponse {
                message: "rule missing from the router's list after submission".into(),
            },
        }
    }
}
