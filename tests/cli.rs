//! The `safe-routes` binary answers bad input with the failure payload.

use std::path::Path;
use std::process::{Command, Output};

fn run_with_request(dir: &Path, body: &str) -> Output {
    let input = dir.join("request.json");
    std::fs::write(&input, body).unwrap();
    Command::new(env!("CARGO_BIN_EXE_safe-routes"))
        .arg(&input)
        .env("SAFE_ROUTES_DATA_DIR", dir.join("data"))
        .env("OSRM_SERVER", "http://127.0.0.1:1")
        .env("OSRM_TIMEOUT_SECS", "1")
        .output()
        .expect("run safe-routes")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("JSON on stdout")
}

#[test]
fn test_wrongly_typed_coordinate_prints_failure_payload() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_with_request(
        dir.path(),
        r#"{"start_lat": "12.97", "start_lon": 77.59, "end_lat": 12.93, "end_lon": 77.62}"#,
    );

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid request: Malformed request: "), "{error}");
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[test]
fn test_invalid_json_prints_failure_payload() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_with_request(dir.path(), "{\"start_lat\": 12.97,");

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("Malformed request"));
}

#[test]
fn test_missing_coordinate_prints_failure_payload() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_with_request(
        dir.path(),
        r#"{"start_lat": 12.97, "start_lon": 77.59, "end_lat": 12.93}"#,
    );

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Invalid request: Missing required field: end_lon");
}
