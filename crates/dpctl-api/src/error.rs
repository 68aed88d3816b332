use thiserror::Error;

/// Top-level error type for the `dpctl-api` crate.
///
/// Covers every failure mode of the CyberController HTTP surface:
/// authentication, transport, and response decoding. `dpctl-core` maps
/// these into per-operation outcomes or batch-level aborts.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, locked account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session cookie no longer accepted and re-login did not recover it.
    #[error("Session expired -- re-authentication failed")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller responses ────────────────────────────────────────
    /// The controller answered with a non-success status code. The raw
    /// body is preserved verbatim for diagnosis (duplicate names,
    /// constraint violations, and similar rejections surface here).
    #[error("Controller rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// HTTP succeeded but the body was not parseable as expected.
    #[error("Invalid response body: {message}")]
    InvalidResponse { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is gone and
    /// re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The HTTP status behind this error, if one exists.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
