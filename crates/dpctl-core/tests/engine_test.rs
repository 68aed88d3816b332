// Integration tests for the batch engine against a mocked controller.
#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dpctl_api::{CcClient, TransportConfig};
use dpctl_core::{
    BatchRunner, BatchStatus, DeleteBatch, DesiredBatch, ExecutorOptions, OutcomeStatus,
};

const DEVICE: &str = "10.1.1.1";
const ATTACK_TABLE: &str = "/mgmt/device/byip/10.1.1.1/config/rsIDSConnectionLimitAttackTable";

// ── Helpers ─────────────────────────────────────────────────────────

async fn connect(server: &MockServer) -> CcClient {
    Mock::given(method("POST"))
        .and(path("/mgmt/system/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(server)
        .await;

    let base: Url = server.uri().parse().unwrap();
    CcClient::connect_url(
        base,
        "radware".into(),
        SecretString::from("secret"),
        &TransportConfig::default(),
    )
    .await
    .unwrap()
}

fn ok_body() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" }))
}

fn protections_batch() -> DesiredBatch {
    serde_yaml::from_str(
        r"
cl_protections:
  - name: limit_a
    index: 450001
    protocol: tcp
  - name: limit_b
    index: 450002
    protocol: udp
  - name: limit_c
    index: 450003
    protocol: tcp
",
    )
    .unwrap()
}

fn no_refresh() -> ExecutorOptions {
    ExecutorOptions { refresh_between_writes: false }
}

// ── Failure isolation and aggregation ───────────────────────────────

#[tokio::test]
async fn one_rejection_does_not_stop_the_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ATTACK_TABLE}/450001")))
        .respond_with(ok_body())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{ATTACK_TABLE}/450002")))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "status": "error", "message": "duplicate entry" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The third operation still runs after the rejection.
    Mock::given(method("POST"))
        .and(path(format!("{ATTACK_TABLE}/450003")))
        .respond_with(ok_body())
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE).with_options(no_refresh());
    let report = runner.run_create(&protections_batch()).await.unwrap();

    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert!(report.changed);
    assert_eq!(report.summary.attempted, 3);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);

    // Outcomes keep plan order.
    let names: Vec<_> = report.outcomes.iter().map(|o| o.entity.name.as_str()).collect();
    assert_eq!(names, vec!["limit_a", "limit_b", "limit_c"]);
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
    assert!(report.errors[0].contains("limit_b"));
}

#[tokio::test]
async fn all_rejections_make_the_batch_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ATTACK_TABLE}/450001")))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let batch: DesiredBatch = serde_yaml::from_str(
        r"
cl_protections:
  - name: only
    index: 450001
    protocol: tcp
",
    )
    .unwrap();

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE).with_options(no_refresh());
    let report = runner.run_create(&batch).await.unwrap();

    assert_eq!(report.status, BatchStatus::Failed);
    assert!(!report.changed);
    assert_eq!(report.outcomes[0].http_status, Some(500));
}

#[tokio::test]
async fn two_hundred_with_embedded_error_counts_as_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ATTACK_TABLE}/450001")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "error", "message": "index in use" })),
        )
        .mount(&server)
        .await;

    let batch: DesiredBatch = serde_yaml::from_str(
        r"
cl_protections:
  - name: clashing
    index: 450001
    protocol: tcp
",
    )
    .unwrap();

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE).with_options(no_refresh());
    let report = runner.run_create(&batch).await.unwrap();

    assert_eq!(report.status, BatchStatus::Failed);
    assert!(report.errors[0].contains("index in use"));
}

// ── Staleness workaround ────────────────────────────────────────────

#[tokio::test]
async fn sibling_creates_refresh_the_attack_table_between_writes() {
    let server = MockServer::start().await;

    // One refresh read per create after the first.
    Mock::given(method("GET"))
        .and(path(ATTACK_TABLE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "rsIDSConnectionLimitAttackTable": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("^/mgmt/device/byip/.*"))
        .respond_with(ok_body())
        .expect(3)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE);
    let report = runner.run_create(&protections_batch()).await.unwrap();

    assert_eq!(report.status, BatchStatus::Success);
}

// ── Delete resolution ───────────────────────────────────────────────

#[tokio::test]
async fn delete_by_name_resolves_once_and_isolates_misses() {
    let server = MockServer::start().await;

    // Exactly one registry read for the whole batch.
    Mock::given(method("GET"))
        .and(path(ATTACK_TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rsIDSConnectionLimitAttackTable": [
                { "rsIDSConnectionLimitAttackName": "limit_a", "rsIDSConnectionLimitAttackId": "450001" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{ATTACK_TABLE}/450001")))
        .respond_with(ok_body())
        .expect(1)
        .mount(&server)
        .await;

    let batch: DeleteBatch = serde_yaml::from_str(
        r#"
cl_protections: ["limit_a", "ghost"]
"#,
    )
    .unwrap();

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE);
    let report = runner.run_delete(&batch).await.unwrap();

    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.summary.succeeded, 1);
    // The unresolved name is reported, not silently dropped.
    assert_eq!(report.outcomes[1].entity.name, "ghost");
    assert!(report.outcomes[1].error.as_ref().unwrap().contains("not found"));
}

#[tokio::test]
async fn registry_fetch_failure_aborts_before_any_delete() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTACK_TABLE))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ok_body())
        .expect(0)
        .mount(&server)
        .await;

    let batch: DeleteBatch = serde_yaml::from_str(r#"cl_protections: ["limit_a"]"#).unwrap();

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE);
    let err = runner.run_delete(&batch).await.unwrap_err();

    assert!(err.to_string().contains("rsIDSConnectionLimitAttackTable"));
}

// ── Dry run ─────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_create_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{ATTACK_TABLE}/450001")))
        .respond_with(ok_body())
        .expect(0)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE);
    let preview = runner.preview_create(&protections_batch());

    assert_eq!(preview.operations.len(), 3);
    assert_eq!(preview.device, DEVICE);
    assert!(preview.errors.is_empty());
    assert!(preview.operations[0].path.ends_with("/rsIDSConnectionLimitAttackTable/450001"));
}

#[tokio::test]
async fn preview_delete_validates_indices_without_deleting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTACK_TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rsIDSConnectionLimitAttackTable": [
                { "rsIDSConnectionLimitAttackName": "limit_a", "rsIDSConnectionLimitAttackId": "450001" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ok_body())
        .expect(0)
        .mount(&server)
        .await;

    let batch: DeleteBatch = serde_yaml::from_str("cl_protections: [450001, 999]").unwrap();

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE);
    let preview = runner.preview_delete(&batch).await.unwrap();

    assert_eq!(preview.operations.len(), 2);
    assert!(preview.operations[0].error.is_none());
    assert!(preview.operations[1].error.as_ref().unwrap().contains("999"));
    assert_eq!(preview.errors.len(), 1);
}

// ── Policy activation ───────────────────────────────────────────────

#[tokio::test]
async fn apply_policy_updates_posts_the_update_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/updatepolicies"))
        .respond_with(ok_body())
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server).await;
    BatchRunner::new(&client, DEVICE)
        .apply_policy_updates()
        .await
        .unwrap();
}

#[tokio::test]
async fn apply_policy_updates_surfaces_embedded_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/updatepolicies"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "error", "message": "device busy" })),
        )
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let err = BatchRunner::new(&client, DEVICE)
        .apply_policy_updates()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("device busy"));
}

#[tokio::test]
async fn apply_policy_updates_rejects_plain_text_failure_phrases() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/updatepolicies"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Operation denied by device"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let err = BatchRunner::new(&client, DEVICE)
        .apply_policy_updates()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("denied"));
}

// ── Mixed-kind ordering ─────────────────────────────────────────────

#[tokio::test]
async fn create_orders_protections_before_profiles_before_policies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("^/mgmt/device/byip/.*"))
        .respond_with(ok_body())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ATTACK_TABLE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "rsIDSConnectionLimitAttackTable": [] })),
        )
        .mount(&server)
        .await;

    let batch: DesiredBatch = serde_yaml::from_str(
        r"
security_policies:
  - name: pol
    action: block
cl_profiles:
  - name: web
    protections: [limit_a]
cl_protections:
  - name: limit_a
    index: 450001
    protocol: tcp
",
    )
    .unwrap();

    let client = connect(&server).await;
    let runner = BatchRunner::new(&client, DEVICE);
    let report = runner.run_create(&batch).await.unwrap();

    assert_eq!(report.status, BatchStatus::Success);
    let described: Vec<_> = report.outcomes.iter().map(|o| o.description.as_str()).collect();
    assert!(described[0].contains("protection"));
    assert!(described[1].contains("profile"));
    assert!(described[2].contains("policy"));
}
