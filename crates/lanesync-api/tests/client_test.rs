#![allow(clippy::unwrap_used)]
// Integration tests for `PrinterClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanesync_api::{Error, PrinterClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PrinterClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PrinterClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Status snapshot ─────────────────────────────────────────────────

#[tokio::test]
async fn test_afc_status_unwraps_colon_key() {
    let (server, client) = setup().await;

    let body = json!({
        "result": {
            "status:": {
                "AFC": {
                    "system": { "current_load": "lane1" },
                    "Turtle_1": { "lane1": { "prep": true, "load": true } }
                }
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let status = client.afc_status().await.unwrap();
    assert_eq!(status["system"]["current_load"], "lane1");
    assert_eq!(status["Turtle_1"]["lane1"]["prep"], true);
}

#[tokio::test]
async fn test_afc_status_accepts_plain_status_key() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": { "AFC": { "system": {} } } }
        })))
        .mount(&server)
        .await;

    let status = client.afc_status().await.unwrap();
    assert!(status.contains_key("system"));
}

#[tokio::test]
async fn test_afc_status_missing_section() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .mount(&server)
        .await;

    let result = client.afc_status().await;
    assert!(
        matches!(result, Err(Error::UnexpectedShape(_))),
        "expected UnexpectedShape, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rpc_error_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not Found" }
        })))
        .mount(&server)
        .await;

    let err = client.afc_status().await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/printer/objects/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = client.list_objects().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Object directory ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_objects() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/printer/objects/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "objects": ["AFC", "oams_manager", "oams oams1", 7] }
        })))
        .mount(&server)
        .await;

    let objects = client.list_objects().await.unwrap();
    assert_eq!(objects, vec!["AFC", "oams_manager", "oams oams1"]);
}

#[tokio::test]
async fn test_query_object() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/printer/objects/query"))
        .and(body_json(json!({ "objects": { "oams oams1": ["fps_value"] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": { "oams oams1": { "fps_value": 0.42 } } }
        })))
        .mount(&server)
        .await;

    let status = client
        .query_object("oams oams1", &["fps_value"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status["fps_value"], 0.42);
}

#[tokio::test]
async fn test_query_object_missing_entry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/printer/objects/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": {} }
        })))
        .mount(&server)
        .await;

    assert!(client.query_object("ghost", &[]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_query_objects_batches_names() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/printer/objects/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": {
                "filament_switch_sensor a": { "filament_detected": true },
                "filament_switch_sensor b": { "filament_detected": false }
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let names = vec![
        "filament_switch_sensor a".to_string(),
        "filament_switch_sensor b".to_string(),
    ];
    let status = client.query_objects(&names).await.unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status["filament_switch_sensor a"]["filament_detected"], true);
}

#[tokio::test]
async fn test_query_objects_empty_skips_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client.query_objects(&[]).await.unwrap().is_empty());
}

// ── Directives ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_gcode() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/printer/gcode/script"))
        .and(body_json(json!({ "script": "CHANGE_TOOL LANE=lane1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client.run_gcode("CHANGE_TOOL LANE=lane1").await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let base_url = Url::parse("http://127.0.0.1:9").unwrap();
    let client = PrinterClient::with_client(reqwest::Client::new(), base_url);

    let err = client.afc_status().await.unwrap_err();
    assert!(err.is_transient(), "expected transient error, got: {err:?}");
}
