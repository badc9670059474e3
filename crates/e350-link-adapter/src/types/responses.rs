/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient::{lenient_i64, lenient_opt_i64};
use super::models::{GlobalDefaults, OperationLogEvent, TaskParameterSet};
use super::status::{FreeRunReadback, StatusFrame, StatusSnapshot};
use crate::codec;

/// Plain acknowledgement (`{"ok": true}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub status: StatusFrame,
}

impl RestartResponse {
    /// Device state read right after the restart.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::from_frame(&self.status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultResetResponse {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub fault: i64,
}

impl FaultResetResponse {
    pub fn fault_code(&self) -> u16 {
        codec::to_u16(self.fault)
    }
}

/// Authoritative aux mask after a mutation, when the server reports one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxResponse {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub mask: Option<i64>,
}

impl AuxResponse {
    pub fn mask(&self) -> Option<u16> {
        self.mask.map(codec::to_u16)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRunWritten {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub rpm: Option<i64>,
    #[serde(rename = "torque_mNm", default, deserialize_with = "lenient_opt_i64")]
    pub torque_mnm: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRunSetResponse {
    #[serde(default)]
    pub written: FreeRunWritten,
    #[serde(default)]
    pub readback: FreeRunReadback,
    /// `None` when no torque limit was requested.
    #[serde(default)]
    pub limit_written: Option<bool>,
}

/// Aux mask after free-run start/stop toggled DI4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRunAuxResponse {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub aux: i64,
}

impl FreeRunAuxResponse {
    pub fn aux_mask(&self) -> u16 {
        codec::to_u16(self.aux)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParamsResponse {
    #[serde(default)]
    pub task: TaskParameterSet,
    #[serde(default)]
    pub globals: GlobalDefaults,
}

/// Server's per-register write outcome for a task save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWriteReport {
    #[serde(default)]
    pub addr: Option<u32>,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveTaskParamsResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub details: BTreeMap<String, FieldWriteReport>,
    #[serde(default)]
    pub globals: Option<GlobalDefaults>,
}

impl SaveTaskParamsResponse {
    /// Registers the server could not write.
    pub fn failed_fields(&self) -> impl Iterator<Item = (&str, &FieldWriteReport)> {
        self.details
            .iter()
            .filter(|(_, report)| !report.ok)
            .map(|(field, report)| (field.as_str(), report))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationLog {
    #[serde(default)]
    pub events: Option<Vec<OperationLogEvent>>,
}

impl OperationLog {
    pub fn into_events(self) -> Vec<OperationLogEvent> {
        self.events.unwrap_or_default()
    }
}
