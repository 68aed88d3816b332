//! CLI error types with miette diagnostics.
//!
//! Maps engine and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use dpctl_config::ConfigError;
use dpctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach controller: {message}")]
    #[diagnostic(
        code(dpctl::connection_failed),
        help(
            "Check that the CyberController is running and accessible.\n\
             Self-signed certificates are accepted by default; see --insecure."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(dpctl::auth_failed),
        help("Verify the username and password for this profile.\n\
              Store a password with: dpctl config set-password")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(dpctl::no_credentials),
        help(
            "Add username/password to the profile, set DPCTL_USERNAME and\n\
             DPCTL_PASSWORD, or run: dpctl config set-password"
        )
    )]
    NoCredentials { profile: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dpctl::profile_not_found),
        help("Check available profiles with: dpctl config show")
    )]
    ProfileNotFound { name: String },

    #[error("No target device specified")]
    #[diagnostic(
        code(dpctl::no_device),
        help("Pass --device <ip>, set DPCTL_DEVICE, or add `device` to the profile.")
    )]
    NoDevice,

    // ── Batch ────────────────────────────────────────────────────────
    #[error("Batch failed: all {attempted} operation(s) were rejected")]
    #[diagnostic(code(dpctl::batch_failed))]
    BatchFailed { attempted: usize },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Controller rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(dpctl::api_error))]
    ApiError { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dpctl::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid batch file {path}: {reason}")]
    #[diagnostic(code(dpctl::batch_file), help("Check the YAML structure and field names."))]
    BatchFile { path: String, reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(dpctl::json))]
    Json(#[from] serde_json::Error),

    // ── Passthrough engine errors ────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(dpctl::engine))]
    Engine(CoreError),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. }
            | Self::BatchFile { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoDevice => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Error conversions ────────────────────────────────────────────────

impl From<dpctl_api::Error> for CliError {
    fn from(err: dpctl_api::Error) -> Self {
        match err {
            dpctl_api::Error::Authentication { message } => Self::AuthFailed { message },
            dpctl_api::Error::SessionExpired => Self::AuthFailed {
                message: "session expired and re-login failed".into(),
            },
            dpctl_api::Error::Rejected { status, body } => Self::ApiError {
                status,
                message: body,
            },
            dpctl_api::Error::Transport(e) => Self::ConnectionFailed {
                message: e.to_string(),
            },
            other => Self::ConnectionFailed {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport(api) => api.into(),
            CoreError::RemoteRejected { status, body } => Self::ApiError {
                status,
                message: body,
            },
            CoreError::Validation { message } => Self::Validation {
                field: "batch".into(),
                reason: message,
            },
            other => Self::Engine(other),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound { name: profile },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Validation {
                field: "config".into(),
                reason: other.to_string(),
            },
        }
    }
}
