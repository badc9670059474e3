/*
[INPUT]:  Decoded snapshots, log events and command responses
[OUTPUT]: One-line operator text
[POS]:    Presentation layer - plain text rendering
[UPDATE]: When the console output format changes
*/

use e350_link_adapter::{
    FreeRunReadback, FreeRunSetResponse, OperationLogEvent, SaveTaskParamsResponse, StatusSnapshot,
    TaskParameterForm,
};

pub fn snapshot_line(snapshot: &StatusSnapshot) -> String {
    let display = snapshot.display();
    let mut line = format!(
        "mode={} fault={} speed={} task={} di={} do={} aux={}",
        display.mode,
        display.fault,
        display.speed,
        display.task_current,
        display.digital_inputs,
        display.digital_outputs,
        display.aux_mask,
    );

    if let Some(last) = display.last {
        line.push_str(&format!(
            " | last torque={} N·m angle={}° time={} ms result={}",
            last.torque, last.angle, last.time_ms, last.result
        ));
    }
    if !snapshot.free_run.is_empty() {
        line.push_str(&format!(" | {}", readback_text(&snapshot.free_run)));
    }
    line
}

pub fn event_line(event: &OperationLogEvent) -> String {
    if event.extra.is_null() {
        format!("[{}] {}: {}", event.timestamp, event.kind, event.message)
    } else {
        format!(
            "[{}] {}: {} {}",
            event.timestamp, event.kind, event.message, event.extra
        )
    }
}

pub fn free_run_set_line(response: &FreeRunSetResponse) -> String {
    let written_rpm = optional(response.written.rpm);
    let written_torque = optional(response.written.torque_mnm);
    let limit = match response.limit_written {
        Some(true) => " limit=written",
        Some(false) => " limit=rejected",
        None => "",
    };
    format!(
        "written rpm={} torque_mNm={}{} | {}",
        written_rpm,
        written_torque,
        limit,
        readback_text(&response.readback)
    )
}

pub fn task_form_lines(task: u8, form: &TaskParameterForm) -> Vec<String> {
    vec![
        format!("task {}", task),
        format!("  method  = {}", form.method),
        format!("  torque  = {} N·m", form.torque),
        format!("  speed   = {} rpm", form.speed),
        format!("  angle   = {}", form.angle),
        format!("  time_ms = {}", form.time_ms),
    ]
}

pub fn save_report_lines(response: &SaveTaskParamsResponse) -> Vec<String> {
    let mut lines = vec![format!("saved ok={}", response.ok)];
    for (field, report) in response.failed_fields() {
        lines.push(format!(
            "  {} failed: {}",
            field,
            report.error.as_deref().unwrap_or("unknown error")
        ));
    }
    lines
}

fn readback_text(readback: &FreeRunReadback) -> String {
    format!(
        "readback rpm={} torque_limit={}",
        optional(readback.speed_rpm()),
        optional(readback.fr_torque_limit)
    )
}

fn optional(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_line_with_last_cycle() {
        let frame = serde_json::from_value(json!({
            "mode": 1, "mode_text": "RS485/232", "fault": 10, "di": 5, "do": 0, "aux": 8,
            "last": { "torque_mNm": 1500, "angle_decideg": 450, "time_ms_lo": 1500, "result": 2 }
        }))
        .unwrap();
        let line = snapshot_line(&StatusSnapshot::from_frame(&frame));
        assert!(line.starts_with("mode=RS485/232 fault=0x000a speed=0 task=—"));
        assert!(line.contains("aux=0x0008"));
        assert!(line.contains("torque=1.500 N·m"));
        assert!(line.contains("result=STRIP"));
    }

    #[test]
    fn test_event_line_extra() {
        let event = OperationLogEvent {
            timestamp: "12:00:00".into(),
            kind: "aux".into(),
            message: "set bit".into(),
            extra: json!({ "bit": 3 }),
        };
        assert_eq!(event_line(&event), "[12:00:00] aux: set bit {\"bit\":3}");
    }
}
