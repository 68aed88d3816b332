// ── Batch executor ──
//
// Runs a plan strictly in order, one operation at a time. Failures are
// isolated: a rejected or unreachable operation records a failed outcome
// and the loop moves on, so one bad entity never takes the rest of the
// batch down with it.

use serde_json::Value;
use tracing::{debug, info, warn};

use dpctl_api::{ApiResponse, CcClient, paths};

use crate::plan::{Method, ResolvedOperation};
use crate::report::{OperationOutcome, OutcomeStatus};
use crate::translate::ApiAttributes;

/// Knobs for one executor run.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Re-read a table before operations that flagged it (see
    /// [`ResolvedOperation::refresh_before`]). The controller caches
    /// table reads and can otherwise reject the second of two
    /// back-to-back creates as a duplicate index.
    pub refresh_between_writes: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self { refresh_between_writes: true }
    }
}

/// Execute every operation in `plan` sequentially and collect outcomes.
///
/// Pre-failed operations (unresolved names, translation errors) are
/// recorded as failures without touching the network.
pub async fn execute(
    client: &CcClient,
    device: &str,
    plan: &[ResolvedOperation],
    options: ExecutorOptions,
) -> Vec<OperationOutcome> {
    let mut outcomes = Vec::with_capacity(plan.len());

    for op in plan {
        if let Some(reason) = &op.precondition_failure {
            warn!(entity = %op.entity, reason, "skipping unresolvable operation");
            outcomes.push(OperationOutcome::failed(op, None, reason.clone()));
            continue;
        }

        if options.refresh_between_writes {
            if let Some(table) = op.refresh_before {
                refresh_table(client, device, table).await;
            }
        }

        debug!(method = %op.method, path = %op.path, "executing");
        let outcome = match send(client, op).await {
            Ok(resp) => interpret(op, &resp),
            Err(e) => {
                warn!(entity = %op.entity, error = %e, "operation failed in transport");
                OperationOutcome::failed(op, e.http_status(), e.to_string())
            }
        };

        if outcome.status == OutcomeStatus::Failed {
            info!(entity = %op.entity, "operation failed, continuing batch");
        }
        outcomes.push(outcome);
    }

    outcomes
}

/// Re-read a table to defeat the controller's read cache.
///
/// Best-effort: a failed refresh only degrades the duplicate-index
/// workaround, so errors are logged and swallowed.
pub async fn refresh_table(client: &CcClient, device: &str, table: &str) {
    let path = paths::config_path(device, table, &[]);
    match client.get(&path).await {
        Ok(resp) => debug!(table, status = resp.status, "refreshed table state"),
        Err(e) => debug!(table, error = %e, "table refresh failed, continuing"),
    }
}

async fn send(
    client: &CcClient,
    op: &ResolvedOperation,
) -> Result<ApiResponse, dpctl_api::Error> {
    let body = op.body.as_ref().map(attributes_to_json);
    match op.method {
        Method::Get => client.get(&op.path).await,
        Method::Post => client.post(&op.path, body.as_ref()).await,
        Method::Put => {
            let body = body.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            client.put(&op.path, &body).await
        }
        Method::Delete => client.delete(&op.path, body.as_ref()).await,
    }
}

fn attributes_to_json(attrs: &ApiAttributes) -> Value {
    let map: serde_json::Map<String, Value> = attrs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

/// Map a raw controller response to an outcome for `op`.
///
/// An acceptable status code is still a failure when the body carries
/// `{"status": "error"}` (the controller returns 200 for a number of
/// rejected table writes) or when a non-empty body is not JSON at all,
/// which this API only produces when a proxy or maintenance page got in
/// the way.
fn interpret(op: &ResolvedOperation, resp: &ApiResponse) -> OperationOutcome {
    if !status_accepted(op.method, resp.status) {
        return OperationOutcome::failed(
            op,
            Some(resp.status),
            format!("HTTP {}: {}", resp.status, truncate(&resp.body)),
        );
    }

    if resp.body.trim().is_empty() {
        return OperationOutcome::succeeded(op, resp.status, None);
    }

    match serde_json::from_str::<Value>(&resp.body) {
        Ok(value) => {
            if let Some(message) = embedded_error_value(&value) {
                OperationOutcome::failed(op, Some(resp.status), message)
            } else {
                OperationOutcome::succeeded(op, resp.status, Some(resp.body.clone()))
            }
        }
        Err(e) => OperationOutcome::failed(
            op,
            Some(resp.status),
            format!("response was not valid JSON ({e}): {}", truncate(&resp.body)),
        ),
    }
}

fn status_accepted(method: Method, status: u16) -> bool {
    match method {
        Method::Get => status == 200,
        Method::Post | Method::Put => matches!(status, 200 | 201),
        Method::Delete => matches!(status, 200 | 204),
    }
}

/// Error reported inside a 2xx JSON body, if any.
pub(crate) fn embedded_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    embedded_error_value(&value)
}

fn embedded_error_value(value: &Value) -> Option<String> {
    if value.get("status").and_then(Value::as_str) == Some("error") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), ToOwned::to_owned);
        return Some(message);
    }
    None
}

fn truncate(body: &str) -> &str {
    let limit = 500;
    match body.char_indices().nth(limit) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, EntityRef};
    use crate::report::OutcomeStatus;

    fn op() -> ResolvedOperation {
        ResolvedOperation {
            method: Method::Post,
            path: "/mgmt/device/byip/10.1.1.1/config/rsNetFloodProfileTable/p".into(),
            body: None,
            entity: EntityRef::new(EntityKind::BdosProfile, "p"),
            sequence_index: 0,
            description: "Create bdos_profile 'p'".into(),
            precondition_failure: None,
            refresh_before: None,
        }
    }

    #[test]
    fn empty_accepted_body_is_success() {
        let outcome = interpret(&op(), &ApiResponse { status: 200, body: String::new() });
        assert_eq!(outcome.status, OutcomeStatus::Succeeded);
        assert_eq!(outcome.response_body, None);
    }

    #[test]
    fn non_json_accepted_body_is_failure_not_a_crash() {
        let outcome = interpret(
            &op(),
            &ApiResponse { status: 200, body: "<html>gateway error</html>".into() },
        );
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(outcome.error.as_deref().is_some_and(|e| e.contains("not valid JSON")));
    }

    #[test]
    fn accepted_statuses_per_verb() {
        assert!(status_accepted(Method::Post, 200));
        assert!(status_accepted(Method::Post, 201));
        assert!(!status_accepted(Method::Post, 204));
        assert!(status_accepted(Method::Delete, 204));
        assert!(!status_accepted(Method::Delete, 404));
        assert!(status_accepted(Method::Get, 200));
        assert!(!status_accepted(Method::Get, 302));
    }

    #[test]
    fn embedded_error_detected_only_for_error_status() {
        assert_eq!(
            embedded_error(r#"{"status": "error", "message": "duplicate index"}"#),
            Some("duplicate index".to_owned())
        );
        assert_eq!(embedded_error(r#"{"status": "ok"}"#), None);
        assert_eq!(embedded_error("not json"), None);
        // Error without a message falls back to the raw object.
        assert!(embedded_error(r#"{"status": "error"}"#).is_some());
    }
}
