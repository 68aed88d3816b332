// Integration tests for `CcClient` using wiremock.
#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dpctl_api::{CcClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn login_mock() -> Mock {
    Mock::given(method("POST"))
        .and(path("/mgmt/system/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
}

async fn connect(server: &MockServer) -> CcClient {
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

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn login_sends_credentials_and_checks_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/system/user/login"))
        .and(body_partial_json(json!({ "username": "radware" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    connect(&server).await;
}

#[tokio::test]
async fn login_rejects_error_status_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/system/user/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "error", "message": "bad credentials" })),
        )
        .mount(&server)
        .await;

    let base: Url = server.uri().parse().unwrap();
    let err = CcClient::connect_url(
        base,
        "radware".into(),
        SecretString::from("wrong"),
        &TransportConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
}

// ── Verb helpers ────────────────────────────────────────────────────

#[tokio::test]
async fn get_returns_raw_status_and_decodable_body() {
    let server = MockServer::start().await;
    login_mock().mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/rsIDSConnectionLimitAttackTable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rsIDSConnectionLimitAttackTable": [
                { "rsIDSConnectionLimitAttackName": "limit_http", "rsIDSConnectionLimitAttackId": "450001" }
            ]
        })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let resp = client
        .get("/mgmt/device/byip/10.1.1.1/config/rsIDSConnectionLimitAttackTable")
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    let body = resp.json().unwrap();
    assert_eq!(
        body["rsIDSConnectionLimitAttackTable"][0]["rsIDSConnectionLimitAttackId"],
        "450001"
    );
}

#[tokio::test]
async fn non_json_body_is_a_decode_error_not_a_panic() {
    let server = MockServer::start().await;
    login_mock().mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/updatepolicies"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let resp = client
        .get("/mgmt/device/byip/10.1.1.1/config/updatepolicies")
        .await
        .unwrap();

    let err = resp.json().unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }));
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    login_mock().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/rsNetFloodProfileTable/dup"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "status": "error", "message": "entry already exists" })),
        )
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let resp = client
        .post(
            "/mgmt/device/byip/10.1.1.1/config/rsNetFloodProfileTable/dup",
            Some(&json!({ "rsNetFloodProfileName": "dup" })),
        )
        .await
        .unwrap();

    assert_eq!(resp.status, 500);
    assert!(resp.body.contains("already exists"));
}

// ── Session renewal ─────────────────────────────────────────────────

#[tokio::test]
async fn forbidden_triggers_one_relogin_and_retry() {
    let server = MockServer::start().await;

    // Login succeeds both at connect time and at renewal.
    login_mock().expect(2).mount(&server).await;

    // First GET hits an expired session, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/rsBWMNetworkTable"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/device/byip/10.1.1.1/config/rsBWMNetworkTable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rsBWMNetworkTable": [] })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let resp = client
        .get("/mgmt/device/byip/10.1.1.1/config/rsBWMNetworkTable")
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
}

// ── Device lock ─────────────────────────────────────────────────────

#[tokio::test]
async fn lock_device_posts_and_decodes() {
    let server = MockServer::start().await;
    login_mock().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/mgmt/system/config/tree/device/byip/10.1.1.1/lock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let body = client.lock_device("10.1.1.1").await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unlock_device_failure_preserves_body() {
    let server = MockServer::start().await;
    login_mock().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/mgmt/system/config/tree/device/byip/10.1.1.1/unlock"))
        .respond_with(ResponseTemplate::new(409).set_body_string("locked by another session"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let err = client.unlock_device("10.1.1.1").await.unwrap_err();

    match err {
        Error::Rejected { status, body } => {
            assert_eq!(status, 409);
            assert!(body.contains("another session"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}
