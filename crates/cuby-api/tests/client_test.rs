#![allow(clippy::unwrap_used)]
// Integration tests for `CubyClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cuby_api::{AcMode, Credentials, CubyClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "tok-123";

fn credentials() -> Credentials {
    Credentials::new("test@example.com", "test_password")
}

fn client_for(uri: &str) -> CubyClient {
    CubyClient::with_client(reqwest::Client::new(), Url::parse(uri).unwrap(), credentials())
        .unwrap()
}

async fn setup() -> (MockServer, CubyClient) {
    let server = MockServer::start().await;
    let client = client_for(&server.uri());
    (server, client)
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/token/test@example.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "token": TOKEN })),
        )
        .mount(server)
        .await;
}

/// A base URL nothing is listening on.
fn dead_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn device_state() -> serde_json::Value {
    json!({
        "power": true,
        "mode": "cool",
        "target_temperature": 24,
        "current_temperature": 26,
        "fan_mode": "auto",
        "swing": "off"
    })
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/token/test@example.com"))
        .and(body_json(json!({ "password": "test_password", "expiration": 0 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "token": TOKEN })),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.authenticate().await);
    assert!(client.has_token());
}

#[tokio::test]
async fn test_authenticate_sends_expiration() {
    let server = MockServer::start().await;
    let client = CubyClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        credentials().with_expiration(3600),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(body_json(json!({ "password": "test_password", "expiration": 3600 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "token": TOKEN })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
}

#[tokio::test]
async fn test_authenticate_false_on_non_200() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    assert!(!client.authenticate().await);
    assert!(!client.has_token());
    assert!(matches!(
        client.login().await,
        Err(Error::Authentication { .. })
    ));
}

#[tokio::test]
async fn test_authenticate_false_on_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(!client.authenticate().await);
    assert!(matches!(
        client.login().await,
        Err(Error::Authentication { .. })
    ));
}

#[tokio::test]
async fn test_token_endpoint_outage_is_not_an_auth_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.login().await.unwrap_err();
    assert!(!err.is_auth_error());
    assert!(err.is_transient());
    assert!(matches!(err, Error::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_token_forbidden_is_an_auth_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    assert!(client.login().await.unwrap_err().is_auth_error());
}

#[tokio::test]
async fn test_authenticate_false_without_ok_marker() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "error", "token": TOKEN })),
        )
        .mount(&server)
        .await;

    assert!(!client.authenticate().await);
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_authenticate_false_on_network_error() {
    let client = client_for(&dead_uri());

    assert!(!client.authenticate().await);
    assert!(matches!(client.login().await, Err(Error::Transport(_))));
}

// ── Lazy token handling ─────────────────────────────────────────────

#[tokio::test]
async fn test_get_devices_authenticates_lazily() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "dev1", "name": "Living Room", "model": "Cuby S", "firmware_version": "1.2.0" },
            { "id": "dev2" }
        ])))
        .mount(&server)
        .await;

    let devices = client.get_devices().await;

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "dev1");
    assert_eq!(devices[0].name.as_deref(), Some("Living Room"));
    assert_eq!(devices[0].firmware_version.as_deref(), Some("1.2.0"));
    assert_eq!(devices[1].display_name(), "Cuby AC dev2");
}

#[tokio::test]
async fn test_concurrent_first_calls_authenticate_once() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/token/test@example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "token": TOKEN }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/dev1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_state()))
        .mount(&server)
        .await;

    let (devices, state) = tokio::join!(
        client.try_get_devices(),
        client.try_get_device_state("dev1")
    );

    assert!(devices.unwrap().is_empty());
    assert_eq!(state.unwrap().mode.as_deref(), Some("cool"));
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.try_get_devices().await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_data_call_fails_when_auth_fails() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        client.try_get_devices().await,
        Err(Error::Authentication { .. })
    ));
    assert!(client.get_devices().await.is_empty());
}

// ── State getters ───────────────────────────────────────────────────

#[tokio::test]
async fn test_get_device_state() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/dev1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_state()))
        .mount(&server)
        .await;

    let state = client.get_device_state("dev1").await;

    assert_eq!(state.power, Some(true));
    assert_eq!(state.parsed_mode().unwrap().unwrap(), AcMode::Cool);
    assert_eq!(state.target_temperature, Some(24.0));
    assert_eq!(state.current_temperature, Some(26.0));
    assert_eq!(state.swing.as_deref(), Some("off"));
}

#[tokio::test]
async fn test_state_getters_empty_on_http_error() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    assert!(client.get_device_state("dev1").await.is_empty());
    assert!(client.get_device_info("dev1").await.is_empty());
    assert!(client.get_devices().await.is_empty());

    match client.try_get_device_state("dev1").await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal error");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_state_getters_empty_on_malformed_body() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(client.get_device_state("dev1").await.is_empty());
    assert!(client.get_devices().await.is_empty());
    assert!(matches!(
        client.try_get_device_info("dev1").await,
        Err(Error::Deserialization { .. })
    ));
}

#[tokio::test]
async fn test_state_getters_empty_on_network_error() {
    let client = client_for(&dead_uri());

    assert!(client.get_device_state("dev1").await.is_empty());
    assert!(client.get_device_info("dev1").await.is_empty());
    assert!(client.get_devices().await.is_empty());
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.try_get_device_info("missing").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
}

#[tokio::test]
async fn test_get_device_info() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/dev1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dev1",
            "wifi_signal": -65,
            "online": true,
            "firmware_version": "1.0.0",
            "ip": "10.0.0.12"
        })))
        .mount(&server)
        .await;

    let info = client.get_device_info("dev1").await;

    assert_eq!(info.wifi_signal, Some(-65));
    assert_eq!(info.online, Some(true));
    assert_eq!(info.extra.get("ip"), Some(&json!("10.0.0.12")));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_timeout(Duration::from_millis(200));
    let client =
        CubyClient::with_base_url(Url::parse(&server.uri()).unwrap(), credentials(), &transport)
            .unwrap();

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "token": TOKEN }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.login().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got: {err:?}");
    assert!(err.is_transient());
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_devices_skips_failed_state() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": "dev1" }, { "id": "dev2" }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/dev1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_state()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/dev2/state"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let discovered = client.discover_devices().await.unwrap();

    assert_eq!(discovered.len(), 1);
    assert_eq!(discovered[0].device.id, "dev1");
    assert_eq!(discovered[0].state.power, Some(true));
}

// ── Control ─────────────────────────────────────────────────────────

async fn expect_state_post(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/v2/devices/dev1/state"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_temperature_clamped_high() {
    let (server, client) = setup().await;
    mount_token(&server).await;
    expect_state_post(&server, json!({ "temperature": 30.0 })).await;

    assert!(client.set_ac_temperature("dev1", 40.0).await);
}

#[tokio::test]
async fn test_temperature_clamped_low() {
    let (server, client) = setup().await;
    mount_token(&server).await;
    expect_state_post(&server, json!({ "temperature": 16.0 })).await;

    assert!(client.set_ac_temperature("dev1", 5.0).await);
}

#[tokio::test]
async fn test_valid_values_pass_through() {
    let (server, client) = setup().await;
    mount_token(&server).await;
    expect_state_post(&server, json!({ "mode": "fan_only" })).await;
    expect_state_post(&server, json!({ "fan_mode": "high" })).await;
    expect_state_post(&server, json!({ "swing": "vertical" })).await;
    expect_state_post(&server, json!({ "power": false })).await;

    assert!(client.set_ac_mode("dev1", "fan_only").await);
    assert!(client.set_ac_fan_mode("dev1", "high").await);
    assert!(client.set_ac_swing_mode("dev1", "vertical").await);
    assert!(client.set_ac_power("dev1", false).await);
}

#[tokio::test]
async fn test_invalid_values_never_reach_transport() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!client.set_ac_mode("dev1", "turbo").await);
    assert!(!client.set_ac_mode("dev1", "off").await);
    assert!(!client.set_ac_fan_mode("dev1", "hurricane").await);
    assert!(!client.set_ac_swing_mode("dev1", "diagonal").await);
    assert!(!client.set_ac_temperature("dev1", f64::NAN).await);

    let err = client.try_set_ac_mode("dev1", "turbo").await.unwrap_err();
    assert!(err.is_rejected_locally());
}

#[tokio::test]
async fn test_full_state_drops_unknown_keys() {
    let (server, client) = setup().await;
    mount_token(&server).await;
    expect_state_post(&server, json!({ "power": true })).await;

    let input = json!({ "power": true, "bogus": 1 });
    assert!(client.set_ac_full_state("dev1", input.as_object().unwrap()).await);
}

#[tokio::test]
async fn test_full_state_without_known_keys_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let input = json!({ "bogus": 1, "color": "blue" });
    assert!(!client.set_ac_full_state("dev1", input.as_object().unwrap()).await);
    assert!(matches!(
        client.try_set_ac_full_state("dev1", input.as_object().unwrap()).await,
        Err(Error::EmptyUpdate)
    ));
}

#[tokio::test]
async fn test_set_state_failure_is_false() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v2/devices/dev1/state"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "busy" })))
        .mount(&server)
        .await;

    assert!(!client.set_ac_power("dev1", true).await);
    assert!(matches!(
        client.try_set_ac_power("dev1", true).await,
        Err(Error::Api { status: 400, .. })
    ));
}
