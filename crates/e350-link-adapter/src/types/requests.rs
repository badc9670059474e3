/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::TaskAction;

/// Body for commands that take no arguments (`{}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRequest {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetModeRequest {
    pub rs: bool,
}

/// Aux (virtual DI) mutation: either one bit or the whole mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuxRequest {
    SetBit { bit: u8, value: bool },
    SetMask { mask: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeRunSetRequest {
    pub rpm: i32,
    /// Torque limit in N·m; the server converts to mN·m.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torque: Option<f64>,
}

/// Task parameter save body.
///
/// Fields that failed to parse are sent as `null` and left untouched by the
/// server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaveTaskParamsRequest {
    pub task: u8,
    pub method: Option<i64>,
    pub torque: Option<f64>,
    pub speed: Option<i64>,
    pub angle: Option<i64>,
    pub time_ms: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTaskRequest {
    pub task: u8,
    pub action: TaskAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aux_request_shapes() {
        let bit = AuxRequest::SetBit { bit: 3, value: true };
        assert_eq!(serde_json::to_value(bit).unwrap(), json!({ "bit": 3, "value": true }));

        let mask = AuxRequest::SetMask { mask: 0 };
        assert_eq!(serde_json::to_value(mask).unwrap(), json!({ "mask": 0 }));
    }

    #[test]
    fn test_empty_request_is_empty_object() {
        assert_eq!(serde_json::to_value(EmptyRequest {}).unwrap(), json!({}));
    }

    #[test]
    fn test_save_request_keeps_nulls() {
        let req = SaveTaskParamsRequest {
            task: 1,
            method: None,
            torque: Some(2.5),
            speed: Some(300),
            angle: Some(0),
            time_ms: Some(0),
        };
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({ "task": 1, "method": null, "torque": 2.5, "speed": 300, "angle": 0, "time_ms": 0 })
        );
    }

    #[test]
    fn test_run_task_tighten_shape() {
        let req = RunTaskRequest {
            task: 2,
            action: TaskAction::Tighten,
            hold_ms: Some(1000),
            rpm: None,
        };
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({ "task": 2, "action": "tighten", "hold_ms": 1000 })
        );
    }
}
