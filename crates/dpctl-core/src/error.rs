// ── Core error types ──
//
// Per-operation failures (enum mismatches, unresolved names, controller
// rejections) are folded into `OperationOutcome`s by the executor and
// never abort a batch. Only batch-level preconditions -- a failed index
// registry fetch, missing connection -- surface as `CoreError` from the
// batch runner itself.

use thiserror::Error;

use crate::model::EntityKind;

/// Unified error type for the orchestration engine.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Planning errors ──────────────────────────────────────────────
    /// A friendly value doesn't match any allowed enumeration entry.
    #[error("invalid value '{value}' for {kind} attribute '{key}' (allowed: {allowed})")]
    InvalidEnumValue {
        kind: EntityKind,
        key: String,
        value: String,
        allowed: String,
    },

    /// A name-based reference couldn't be matched against the live table.
    #[error("{kind} '{name}' not found on device")]
    UnresolvedReference { kind: EntityKind, name: String },

    // ── Batch preconditions ──────────────────────────────────────────
    /// The one-per-batch registry read failed; nothing was executed.
    #[error("failed to fetch '{table}' for name resolution: {message}")]
    RegistryFetch { table: String, message: String },

    /// Caller input failed validation before any operation was planned.
    #[error("validation failed: {message}")]
    Validation { message: String },

    // ── Execution errors ─────────────────────────────────────────────
    /// Transport-level failure from the HTTP client.
    #[error(transparent)]
    Transport(#[from] dpctl_api::Error),

    /// The controller completed the request with a non-success status.
    #[error("controller rejected operation (HTTP {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    /// HTTP succeeded but the body wasn't parseable as expected.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl CoreError {
    /// The HTTP status associated with this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            Self::Transport(e) => e.http_status(),
            _ => None,
        }
    }
}
