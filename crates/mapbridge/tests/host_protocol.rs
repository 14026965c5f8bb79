//! Full host round-trips: JSON lines in, JSON lines out.

use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

use mapbridge::{run_host, HostConfig};
use mapbridge_core::BridgeConfig;
use serde_json::{json, Value};

fn config() -> HostConfig {
    HostConfig::default().with_bridge(
        BridgeConfig::default()
            .with_settle_delay(Duration::ZERO)
            .with_ready_timeout(Some(Duration::from_secs(5))),
    )
}

fn script(requests: &[Value]) -> String {
    requests
        .iter()
        .map(|request| format!("{request}\n"))
        .collect()
}

/// Runs the host and splits its output into replies by id and pushes.
fn run(requests: &[Value]) -> (HashMap<u64, Value>, Vec<Value>) {
    let output = run_host(&config(), Cursor::new(script(requests)), Vec::new()).unwrap();
    let mut replies = HashMap::new();
    let mut pushes = Vec::new();

    for line in String::from_utf8(output).unwrap().lines() {
        let message: Value = serde_json::from_str(line).unwrap();
        match message.get("id").and_then(Value::as_u64) {
            Some(id) => {
                assert!(replies.insert(id, message["result"].clone()).is_none());
            }
            None => pushes.push(message),
        }
    }
    (replies, pushes)
}

fn request(id: u64, op: &str, params: Value) -> Value {
    json!({"id": id, "op": op, "params": params})
}

#[test]
fn test_every_request_gets_one_reply() {
    let (replies, pushes) = run(&[
        request(1, "update_map", json!({"map_id": 1})),
        request(2, "update_marker", json!({"map_id": 1, "marker_id": 1, "coordinate": [0, 0]})),
        request(3, "delete_marker", json!({"map_id": 1, "marker_id": 1})),
        request(4, "delete_marker", json!({"map_id": 1, "marker_id": 1})),
    ]);

    assert_eq!(replies.len(), 4);
    assert_eq!(replies[&1], Value::Null);
    assert_eq!(replies[&2], Value::Null);
    assert_eq!(replies[&3], Value::Null);
    assert_eq!(
        replies[&4],
        json!("Marker with id 1 not found when deleting marker from map 1")
    );
    assert!(pushes.is_empty());
}

#[test]
fn test_marker_after_map_delete_is_refused() {
    let (replies, _) = run(&[
        request(
            1,
            "update_map",
            json!({"map_id": 1, "options": {"tile_layer": {
                "url": "https://tiles/{z}/{x}/{y}",
                "attribution": "tiles",
                "max_zoom": 18
            }}}),
        ),
        request(2, "delete_map", json!({"map_id": 1})),
        request(3, "update_marker", json!({"map_id": 1, "marker_id": 5, "coordinate": [10, 20]})),
    ]);

    assert_eq!(replies[&1], Value::Null);
    assert_eq!(replies[&2], Value::Null);
    assert_eq!(
        replies[&3],
        json!("Map with id 1 not found when updating marker 5")
    );
}

#[test]
fn test_popup_needs_registered_body() {
    let (replies, _) = run(&[
        request(1, "update_map", json!({"map_id": 1})),
        request(2, "update_marker", json!({"map_id": 1, "marker_id": 5, "coordinate": [1, 1]})),
        request(3, "update_popup", json!({"marker_id": 5, "body_id": 9})),
        request(4, "register_element", json!({"element_id": "mapbridge-popup-9"})),
        request(5, "update_popup", json!({"marker_id": 5, "body_id": 9})),
        request(6, "update_marker", json!({"map_id": 1, "marker_id": 5, "coordinate": [2, 2]})),
    ]);

    let missing = replies[&3].as_str().unwrap();
    assert!(missing.contains("mapbridge-popup-9"), "{missing}");
    assert_eq!(replies[&4], Value::Null);
    assert_eq!(replies[&5], Value::Null);
    assert_eq!(replies[&6], Value::Null);
}

#[test]
fn test_click_is_pushed_to_subscriber() {
    let (replies, pushes) = run(&[
        request(1, "update_map", json!({"map_id": 1})),
        request(2, "on_map_click", json!({"map_id": 1})),
        request(3, "simulate_click", json!({"map_id": 1, "coordinate": [1.5, 2.5]})),
        request(4, "simulate_move", json!({"map_id": 1, "center": [3, 4], "zoom": 5})),
    ]);

    assert!(replies.values().all(Value::is_null), "{replies:?}");
    assert_eq!(
        pushes,
        vec![json!({"event": "click", "map_id": 1, "data": [1.5, 2.5]})]
    );
}

#[test]
fn test_early_subscription_completes_once_map_exists() {
    let (replies, _) = run(&[
        request(1, "on_map_move", json!({"map_id": 1})),
        request(2, "update_map", json!({"map_id": 1})),
    ]);

    assert_eq!(replies[&1], Value::Null);
    assert_eq!(replies[&2], Value::Null);
}

#[test]
fn test_orphaned_subscription_is_cancelled_at_shutdown() {
    let (replies, _) = run(&[request(1, "on_map_click", json!({"map_id": 9}))]);

    assert_eq!(replies[&1], json!("wait for map-9 was cancelled"));
}

#[test]
fn test_bad_requests_are_answered_not_fatal() {
    let (replies, _) = run(&[
        request(1, "teleport", json!({})),
        request(2, "delete_map", json!({"map": 1})),
        request(3, "simulate_click", json!({"map_id": 4, "coordinate": [0, 0]})),
        request(4, "update_map", json!({"map_id": 4})),
    ]);

    assert!(replies[&1].as_str().unwrap().contains("unknown operation"));
    assert!(replies[&2].as_str().unwrap().contains("delete_map"));
    assert_eq!(
        replies[&3],
        json!("Map with id 4 not found when simulating click")
    );
    assert_eq!(replies[&4], Value::Null);
}
