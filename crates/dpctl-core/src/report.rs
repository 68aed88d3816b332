// ── Result aggregation ──
//
// Per-operation outcomes roll up into one batch-level report with a
// three-way status: every operation failed → Failed, a mix → PartialSuccess
// with `changed` still true (some writes landed), all succeeded (or the
// batch was empty) → Success.

use serde::Serialize;

use crate::model::EntityRef;
use crate::plan::{Method, ResolvedOperation};
use crate::translate::ApiAttributes;

/// Terminal state of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// What happened to one planned operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub entity: EntityRef,
    pub description: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationOutcome {
    pub fn succeeded(op: &ResolvedOperation, http_status: u16, body: Option<String>) -> Self {
        Self {
            entity: op.entity.clone(),
            description: op.description.clone(),
            status: OutcomeStatus::Succeeded,
            http_status: Some(http_status),
            response_body: body,
            error: None,
        }
    }

    pub fn failed(
        op: &ResolvedOperation,
        http_status: Option<u16>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            entity: op.entity.clone(),
            description: op.description.clone(),
            status: OutcomeStatus::Failed,
            http_status,
            response_body: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Batch-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatchStatus {
    Success,
    PartialSuccess,
    Failed,
}

/// Operation counts for the summary line.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// The full result of one executed batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// True when at least one write landed on the device.
    pub changed: bool,
    pub summary: BatchSummary,
    pub outcomes: Vec<OperationOutcome>,
    /// Deduplicated error messages, in first-occurrence order.
    pub errors: Vec<String>,
}

impl BatchReport {
    /// Roll outcomes up into the three-way batch verdict.
    pub fn aggregate(outcomes: Vec<OperationOutcome>) -> Self {
        let attempted = outcomes.len();
        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        let succeeded = attempted - failed;

        let status = if attempted > 0 && failed == attempted {
            BatchStatus::Failed
        } else if failed > 0 {
            BatchStatus::PartialSuccess
        } else {
            BatchStatus::Success
        };

        let mut errors: Vec<String> = Vec::new();
        for outcome in outcomes.iter().filter(|o| o.is_failure()) {
            let message = match &outcome.error {
                Some(e) => format!("{}: {e}", outcome.entity),
                None => outcome.entity.to_string(),
            };
            if !errors.contains(&message) {
                errors.push(message);
            }
        }

        Self {
            status,
            changed: succeeded > 0,
            summary: BatchSummary { attempted, succeeded, failed },
            outcomes,
            errors,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == BatchStatus::Failed
    }
}

// ── Dry-run preview ──────────────────────────────────────────────────

/// One operation as it would be sent, for preview output.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedOperation {
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ApiAttributes>,
    pub entity: EntityRef,
    pub description: String,
    /// Set when the operation would fail before any request is sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ResolvedOperation> for PlannedOperation {
    fn from(op: &ResolvedOperation) -> Self {
        Self {
            method: op.method,
            path: op.path.clone(),
            body: op.body.clone(),
            entity: op.entity.clone(),
            description: op.description.clone(),
            error: op.precondition_failure.clone(),
        }
    }
}

/// A dry-run of a batch: the exact operations, none of them executed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPreview {
    pub device: String,
    pub operations: Vec<PlannedOperation>,
    /// Errors already known at planning time.
    pub errors: Vec<String>,
}

impl BatchPreview {
    pub fn from_plan(device: impl Into<String>, plan: &[ResolvedOperation]) -> Self {
        let operations: Vec<PlannedOperation> = plan.iter().map(Into::into).collect();
        let mut errors = Vec::new();
        for op in &operations {
            if let Some(e) = &op.error {
                let message = format!("{}: {e}", op.entity);
                if !errors.contains(&message) {
                    errors.push(message);
                }
            }
        }
        Self { device: device.into(), operations, errors }
    }
}
