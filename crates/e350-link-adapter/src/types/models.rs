/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Task parameter, global default and operation log models
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient::lenient_opt_i64;

/// One task register as read back by the server.
///
/// `raw == None` means the task inherits the global default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamField {
    #[serde(default)]
    pub addr: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub raw: Option<i64>,
}

impl ParamField {
    pub fn raw(raw: i64) -> Self {
        Self {
            addr: None,
            raw: Some(raw),
        }
    }

    pub fn inherit() -> Self {
        Self::default()
    }
}

/// Per-task overrides, in wire-raw units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParameterSet {
    #[serde(default)]
    pub method: ParamField,
    #[serde(default)]
    pub torque: ParamField,
    #[serde(default)]
    pub speed: ParamField,
    #[serde(default)]
    pub angle_lo: ParamField,
    #[serde(default)]
    pub angle_hi: ParamField,
    #[serde(default)]
    pub time_ms: ParamField,
}

/// Global tightening defaults applied where a task field is unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub method: Option<i64>,
    #[serde(rename = "torque_mNm", default, deserialize_with = "lenient_opt_i64")]
    pub torque_mnm: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub speed_rpm: Option<i64>,
}

/// One entry of the server's operation log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationLogEvent {
    #[serde(rename = "ts", default)]
    pub timestamp: String,
    #[serde(default)]
    pub kind: String,
    #[serde(rename = "msg", default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extra: Value,
}
