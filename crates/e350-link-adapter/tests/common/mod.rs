/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for e350-link-adapter tests

use e350_link_adapter::{ClientConfig, DeviceClient};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> DeviceClient {
    DeviceClient::with_config(ClientConfig::default(), &server.uri()).expect("client init")
}

/// Status frame from a finished tightening cycle
#[allow(dead_code)]
pub fn tightened_frame() -> Value {
    json!({
        "mode": 1, "mode_text": "RS485/232", "fault": 0, "di": 5, "do": 0, "aux": 0,
        "last": {
            "torque_mNm": 1200, "angle_decideg": 450,
            "time_ms_hi": 0, "time_ms_lo": 1500, "result": 0
        }
    })
}

/// Task-parameter read where task 1 only overrides the angle low half
#[allow(dead_code)]
pub fn task_params_body() -> Value {
    json!({
        "task": {
            "method": { "addr": 57632, "raw": null },
            "torque": { "addr": 57634, "raw": null },
            "speed": { "addr": 57682, "raw": 350 },
            "angle_lo": { "addr": 57640, "raw": 900 },
            "angle_hi": { "addr": 57641, "raw": null },
            "time_ms": { "addr": 57650, "raw": 3000 }
        },
        "globals": { "method": 1, "torque_mNm": 2500, "speed_rpm": 300 }
    })
}

/// Encode JSON values as a server-sent-events body
#[allow(dead_code)]
pub fn sse_body(frames: &[Value]) -> String {
    frames
        .iter()
        .map(|frame| format!("data: {}\n\n", frame))
        .collect()
}
