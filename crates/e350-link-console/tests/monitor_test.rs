/*
[INPUT]:  Mock push channel and operation log
[OUTPUT]: Test results for the live monitor
[POS]:    Integration tests - monitor lifecycle
[UPDATE]: When monitor output or shutdown changes
*/

mod common;

use std::time::Duration;

use common::{client_for, setup_mock_server};
use e350_link_console::Monitor;
use e350_link_console::config::MonitorConfig;
use serde_json::json;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn monitor_prints_status_and_log() {
    let server = setup_mock_server().await;
    let frame = json!({ "mode": 1, "mode_text": "RS485/232", "fault": 0, "di": 1, "do": 0, "aux": 0 });
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(format!("data: {}\n\n", frame), "text/event-stream"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                { "ts": "10:00:00", "kind": "aux", "msg": "clear" },
                { "ts": "10:00:01", "kind": "mode", "msg": "rs=1" }
            ]
        })))
        .mount(&server)
        .await;

    let config = MonitorConfig {
        poll_interval_ms: 50,
        reconnect_max_backoff_secs: 1,
    };
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        trigger.cancel();
    });

    let mut out = Vec::new();
    let report = assert_ok!(Monitor::new(client_for(&server), config).run(shutdown, &mut out).await);
    let text = String::from_utf8(out).expect("utf-8 output");

    assert!(text.contains("mode=RS485/232 fault=OK"));
    assert_eq!(text.matches("[10:00:00] aux: clear").count(), 1);
    assert_eq!(text.matches("[10:00:01] mode: rs=1").count(), 1);
    assert_eq!(text.matches("mode=RS485/232").count(), 1);
    assert!(report.stream.frames_applied >= 1);
    assert!(report.poll.polls_ok >= 2);
}
