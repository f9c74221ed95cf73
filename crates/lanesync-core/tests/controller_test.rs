#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` against a wiremock printer host.
//
// These run in real time: wiremock does socket I/O, so paused time would
// race the HTTP timeout.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanesync_core::{
    Command, ConnectionState, Controller, ControllerConfig, CoreError, Intent, LaneField,
    LaneStatus,
};

// ── Helpers ─────────────────────────────────────────────────────────

const DEBOUNCE: Duration = Duration::from_millis(40);

fn afc(lane1: &Value) -> Value {
    json!({
        "result": {
            "status": {
                "AFC": {
                    "system": {
                        "current_load": null,
                        "current_toolchange": 0,
                        "number_of_toolchanges": 0,
                        "led_state": false,
                        "hubs": { "Turtle_1": { "state": false } }
                    },
                    "Turtle_1": {
                        "system": { "type": "Box_Turtle" },
                        "lane1": lane1,
                        "lane2": { "lane": 2, "prep": false, "load": false }
                    }
                }
            }
        }
    })
}

async fn mount_status(server: &MockServer, lane1: &Value) {
    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(afc(lane1)))
        .mount(server)
        .await;
}

async fn mount_objects(server: &MockServer, objects: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/printer/objects/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "objects": objects } })),
        )
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> ControllerConfig {
    let mut config = ControllerConfig::new(Url::parse(&server.uri()).unwrap());
    config.refresh_interval = Duration::ZERO;
    config.sensor_poll_interval = Duration::ZERO;
    config.rebuild_debounce = DEBOUNCE;
    config
}

async fn connected(lane1: &Value) -> (MockServer, Controller) {
    let server = MockServer::start().await;
    mount_status(&server, lane1).await;
    mount_objects(&server, &["AFC", "filament_switch_sensor virtual_bypass"]).await;

    let controller = Controller::new(config(&server));
    controller.connect().await.unwrap();
    (server, controller)
}

/// Replace the served snapshot.
async fn serve(server: &MockServer, lane1: &Value) {
    server.reset().await;
    mount_status(server, lane1).await;
}

/// Everything received until the channel stays quiet for `quiet`.
async fn drain(rx: &mut broadcast::Receiver<Intent>, quiet: Duration) -> Vec<Intent> {
    let mut intents = Vec::new();
    while let Ok(Ok(intent)) = tokio::time::timeout(quiet, rx.recv()).await {
        intents.push(intent);
    }
    intents
}

// ── Connection lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn test_connect_publishes_initial_model() {
    let (_server, controller) = connected(&json!({ "lane": 1, "prep": true, "load": true })).await;

    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Connected);
    let model = controller.model();
    assert_eq!(model.units.len(), 1);
    assert_eq!(model.lane("lane1").unwrap().status(), LaneStatus::Loaded);
    assert_eq!(model.lane("lane2").unwrap().status(), LaneStatus::Unloaded);
    assert!(controller.last_refresh().is_some());
    assert_eq!(
        controller.sensors().await,
        vec!["filament_switch_sensor virtual_bypass".to_owned()]
    );
}

#[tokio::test]
async fn test_connect_failure_sets_failed_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server));
    assert!(controller.connect().await.is_err());
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_missing_object_list_is_not_fatal() {
    let server = MockServer::start().await;
    mount_status(&server, &json!({ "lane": 1 })).await;

    let controller = Controller::new(config(&server));
    controller.connect().await.unwrap();
    assert!(controller.sensors().await.is_empty());
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_delivers_rebuild_after_debounce() {
    let (server, controller) = connected(&json!({ "lane": 1, "prep": true, "load": false })).await;
    let mut rx = controller.intents();

    serve(&server, &json!({ "lane": 1, "prep": true, "load": true })).await;
    assert_eq!(controller.refresh().await.unwrap(), 3);

    // Immediate intents arrive first; the rebuild follows the debounce.
    let intents = drain(&mut rx, DEBOUNCE * 5).await;
    assert_eq!(
        intents,
        vec![
            Intent::RecolorLaneStatus {
                lane: "lane1".into(),
                status: LaneStatus::Loaded
            },
            Intent::UpdateLaneField {
                lane: "lane1".into(),
                field: LaneField::Load
            },
            Intent::RebuildLaneView {
                lane: "lane1".into(),
                status: LaneStatus::Loaded
            },
        ]
    );
    assert_eq!(controller.model().lane("lane1").unwrap().status(), LaneStatus::Loaded);
}

#[tokio::test]
async fn test_rapid_changes_coalesce_into_one_rebuild() {
    let (server, controller) = connected(&json!({ "lane": 1, "prep": true, "load": false })).await;
    let mut rx = controller.intents();

    serve(&server, &json!({ "lane": 1, "prep": true, "load": true })).await;
    controller.refresh().await.unwrap();
    serve(
        &server,
        &json!({ "lane": 1, "prep": true, "load": true, "tool_loaded": true }),
    )
    .await;
    controller.refresh().await.unwrap();

    let rebuilds: Vec<Intent> = drain(&mut rx, DEBOUNCE * 5)
        .await
        .into_iter()
        .filter(Intent::is_rebuild)
        .collect();
    assert_eq!(
        rebuilds,
        vec![Intent::RebuildLaneView {
            lane: "lane1".into(),
            status: LaneStatus::Tooled
        }]
    );
    assert_eq!(controller.pending_rebuilds(), 0);
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_model() {
    let (server, controller) = connected(&json!({ "lane": 1, "prep": true, "load": true })).await;

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(controller.refresh().await.is_err());
    assert_eq!(controller.model().lane("lane1").unwrap().status(), LaneStatus::Loaded);
}

#[tokio::test]
async fn test_unchanged_refresh_is_silent() {
    let lane1 = json!({ "lane": 1, "prep": true, "load": true, "material": "PLA" });
    let (_server, controller) = connected(&lane1).await;
    let mut rx = controller.intents();

    assert_eq!(controller.refresh().await.unwrap(), 0);
    assert!(drain(&mut rx, DEBOUNCE * 2).await.is_empty());
}

// ── Sensors ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sensor_poll_reports_only_changes() {
    let (server, controller) = connected(&json!({ "lane": 1 })).await;
    Mock::given(method("GET"))
        .and(path("/printer/objects/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "status": {
                    "filament_switch_sensor virtual_bypass": { "filament_detected": true }
                }
            }
        })))
        .mount(&server)
        .await;
    let mut rx = controller.intents();

    assert_eq!(controller.poll_sensors().await.unwrap(), 2);
    assert_eq!(
        drain(&mut rx, DEBOUNCE).await,
        vec![
            Intent::UpdateSensor {
                sensor: "filament_switch_sensor virtual_bypass".into(),
                detected: true
            },
            Intent::UpdateVirtualBypass { enabled: true },
        ]
    );

    assert_eq!(controller.poll_sensors().await.unwrap(), 0);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_sends_directive_for_known_lane() {
    let (server, controller) = connected(&json!({ "lane": 1, "prep": true })).await;
    Mock::given(method("POST"))
        .and(path("/printer/gcode/script"))
        .and(body_json(json!({ "script": "CHANGE_TOOL LANE=lane1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    controller
        .execute(Command::ChangeTool {
            lane: "lane1".into(),
        })
        .await
        .unwrap();

    let err = controller
        .execute(Command::ChangeTool {
            lane: "lane9".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::LaneNotFound { ref name } if name == "lane9"));

    let err = controller
        .execute(Command::SetColor {
            lane: "lane1".into(),
            color: "blue".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
}

#[tokio::test]
async fn test_execute_after_disconnect_fails() {
    let (_server, controller) = connected(&json!({ "lane": 1 })).await;
    controller.disconnect().await;

    let err = controller.execute(Command::Calibrate).await.unwrap_err();
    assert!(matches!(err, CoreError::ControllerDisconnected));
    assert_eq!(
        *controller.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}

// ── Background polling ──────────────────────────────────────────────

#[tokio::test]
async fn test_disconnect_stops_background_fetches() {
    let server = MockServer::start().await;
    mount_status(&server, &json!({ "lane": 1 })).await;
    mount_objects(&server, &["AFC"]).await;

    let mut cfg = config(&server);
    cfg.refresh_interval = Duration::from_millis(20);
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    controller.disconnect().await;
    let seen = server.received_requests().await.unwrap().len();
    assert!(seen > 2, "expected background refreshes, saw {seen} requests");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), seen);
}

#[tokio::test]
async fn test_reconnect_replaces_background_polls() {
    let server = MockServer::start().await;
    mount_status(&server, &json!({ "lane": 1 })).await;
    mount_objects(&server, &["AFC"]).await;

    let mut cfg = config(&server);
    cfg.refresh_interval = Duration::from_millis(100);
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();
    controller.connect().await.unwrap();

    tokio::time::sleep(Duration::from_millis(550)).await;
    controller.disconnect().await;

    let fetches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/printer/afc/status")
        .count();
    // Two connect fetches plus one poll loop's worth (~5), not two loops' worth.
    assert!(
        (3..=9).contains(&fetches),
        "expected a single refresh loop, saw {fetches} status fetches"
    );
}

#[tokio::test]
async fn test_oneshot_runs_closure_without_polling() {
    let server = MockServer::start().await;
    mount_status(&server, &json!({ "lane": 1, "prep": true, "load": true })).await;
    mount_objects(&server, &["AFC"]).await;

    let mut cfg = config(&server);
    cfg.refresh_interval = Duration::from_millis(10);
    let lanes = Controller::oneshot(cfg, |controller| async move {
        Ok(controller.model().lanes().count())
    })
    .await
    .unwrap();

    assert_eq!(lanes, 2);
    // One status fetch plus the object list.
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// ── Auxiliary values ────────────────────────────────────────────────

fn ams_status(current_load: Option<&str>) -> Value {
    json!({
        "result": {
            "status": {
                "AFC": {
                    "system": { "current_load": current_load },
                    "AMS_1": {
                        "system": { "type": "OpenAMS" },
                        "lane4": { "lane": 1, "prep": true, "load": true, "map": "T1" }
                    }
                }
            }
        }
    })
}

async fn mount_ams(server: &MockServer, current_load: Option<&str>, fps: f64) {
    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ams_status(current_load)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/printer/objects/query"))
        .and(body_json(json!({ "objects": { "oams_manager": [] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": { "oams_manager": {
                "FPS T1": { "current_group": "T1", "current_oams": "oams1" }
            } } }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/printer/objects/query"))
        .and(body_json(json!({ "objects": { "oams oams1": ["fps_value"] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": { "oams oams1": { "fps_value": fps } } }
        })))
        .mount(server)
        .await;
}

async fn aux_queries(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/printer/objects/query")
        .count()
}

#[tokio::test]
async fn test_current_load_change_refetches_aux_value() {
    let server = MockServer::start().await;
    mount_ams(&server, None, 0.25).await;
    mount_objects(&server, &["AFC", "oams_manager", "oams oams1"]).await;

    let mut cfg = config(&server);
    cfg.aux_cache_ttl = Duration::from_secs(60);
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();

    assert_eq!(controller.lane_aux_value("lane4").await.unwrap(), Some(0.25));
    assert_eq!(controller.lane_aux_value("lane4").await.unwrap(), Some(0.25));
    assert_eq!(aux_queries(&server).await, 2, "second read should be cached");

    // An unchanged refresh keeps the cache.
    controller.refresh().await.unwrap();
    assert_eq!(controller.lane_aux_value("lane4").await.unwrap(), Some(0.25));
    assert_eq!(aux_queries(&server).await, 2);

    server.reset().await;
    mount_ams(&server, Some("lane4"), 0.75).await;
    controller.refresh().await.unwrap();

    assert_eq!(controller.lane_aux_value("lane4").await.unwrap(), Some(0.75));
    // The reset cleared the request log: manager and unit were both fetched again.
    assert_eq!(aux_queries(&server).await, 2);
}
