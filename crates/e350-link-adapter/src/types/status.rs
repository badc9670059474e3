/*
[INPUT]:  Push-channel / status-endpoint JSON frames
[OUTPUT]: StatusFrame (wire shape) and StatusSnapshot (canonical decoded state)
[POS]:    Data layer - device status model
[UPDATE]: When the status frame gains fields or the decoding rules change
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient::{is_truthy, lenient_i64, lenient_object, lenient_opt_i64};
use crate::codec::{self, TighteningResult};

/// One status frame as the server sends it.
///
/// Every field is optional on the wire; absent or garbled values decode to
/// the codec defaults instead of failing the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusFrame {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub mode: i64,
    #[serde(default)]
    pub mode_text: Option<Value>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub fault: i64,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub speed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub task_current: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub di: i64,
    #[serde(rename = "do", default, deserialize_with = "lenient_i64")]
    pub digital_out: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub aux: i64,
    #[serde(default, deserialize_with = "lenient_object")]
    pub last: Option<LastCycleFrame>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub fr_speed_raw: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub fr_speed_signed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub fr_torque_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl StatusFrame {
    /// Heartbeat/error frames carry a truthy `error` and never update state.
    pub fn is_error(&self) -> bool {
        self.error.as_ref().is_some_and(is_truthy)
    }
}

/// Raw registers of the last fastening cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastCycleFrame {
    #[serde(rename = "torque_mNm", default, deserialize_with = "lenient_i64")]
    pub torque_mnm: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub angle_decideg: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub time_ms_hi: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub time_ms_lo: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub result: i64,
}

/// Free-run setpoint readback (speed register E138, torque limit E139).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRunReadback {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub fr_speed_raw: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub fr_speed_signed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub fr_torque_limit: Option<i64>,
}

impl FreeRunReadback {
    /// Signed free-run speed, derived from the raw register when the server
    /// did not send the signed reading.
    pub fn speed_rpm(&self) -> Option<i64> {
        self.fr_speed_signed.or_else(|| {
            self.fr_speed_raw
                .map(|raw| i64::from(codec::signed16(codec::to_u16(raw))))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fr_speed_raw.is_none() && self.fr_speed_signed.is_none() && self.fr_torque_limit.is_none()
    }
}

/// Decoded result of the last fastening cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastCycle {
    pub torque_mnm: i64,
    pub angle_decideg: i64,
    pub time_ms_hi: u16,
    pub time_ms_lo: u16,
    pub result: TighteningResult,
}

impl LastCycle {
    pub fn time_ms(&self) -> u32 {
        codec::combine_u32(self.time_ms_hi, self.time_ms_lo)
    }
}

impl From<&LastCycleFrame> for LastCycle {
    fn from(frame: &LastCycleFrame) -> Self {
        Self {
            torque_mnm: frame.torque_mnm,
            angle_decideg: frame.angle_decideg,
            time_ms_hi: codec::to_u16(frame.time_ms_hi),
            time_ms_lo: codec::to_u16(frame.time_ms_lo),
            result: TighteningResult::from_code(frame.result),
        }
    }
}

/// Canonical device state.
///
/// Built from exactly one frame; nothing carries over from the previous
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub mode: i64,
    pub mode_text: String,
    pub fault: u16,
    pub speed: i64,
    pub task_current: Option<i64>,
    pub digital_inputs: u16,
    pub digital_outputs: u16,
    pub aux_mask: u16,
    pub last: Option<LastCycle>,
    pub free_run: FreeRunReadback,
}

impl StatusSnapshot {
    pub fn from_frame(frame: &StatusFrame) -> Self {
        let mode_text = match frame.mode_text.as_ref().filter(|text| is_truthy(text)) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => frame.mode.to_string(),
        };

        Self {
            mode: frame.mode,
            mode_text,
            fault: codec::to_u16(frame.fault),
            speed: frame.speed.unwrap_or(0),
            task_current: frame.task_current,
            digital_inputs: codec::to_u16(frame.di),
            digital_outputs: codec::to_u16(frame.digital_out),
            aux_mask: codec::to_u16(frame.aux),
            last: frame.last.as_ref().map(LastCycle::from),
            free_run: FreeRunReadback {
                fr_speed_raw: frame.fr_speed_raw,
                fr_speed_signed: frame.fr_speed_signed,
                fr_torque_limit: frame.fr_torque_limit,
            },
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.fault != 0
    }

    /// Operator-facing rendering of every field.
    pub fn display(&self) -> StatusDisplay {
        StatusDisplay {
            mode: self.mode_text.clone(),
            fault: codec::format_fault(i64::from(self.fault)),
            speed: self.speed.to_string(),
            task_current: self
                .task_current
                .map(|task| task.to_string())
                .unwrap_or_else(|| "—".to_string()),
            digital_inputs: codec::format_bits16(i64::from(self.digital_inputs)),
            digital_outputs: codec::format_bits16(i64::from(self.digital_outputs)),
            aux_mask: codec::format_hex16(i64::from(self.aux_mask)),
            last: self.last.map(|last| LastCycleDisplay {
                torque: codec::format_torque(last.torque_mnm),
                angle: codec::format_angle(last.angle_decideg),
                time_ms: last.time_ms(),
                result: last.result.to_string(),
            }),
        }
    }
}

impl From<&StatusFrame> for StatusSnapshot {
    fn from(frame: &StatusFrame) -> Self {
        Self::from_frame(frame)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDisplay {
    pub mode: String,
    pub fault: String,
    pub speed: String,
    pub task_current: String,
    pub digital_inputs: String,
    pub digital_outputs: String,
    pub aux_mask: String,
    pub last: Option<LastCycleDisplay>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastCycleDisplay {
    pub torque: String,
    pub angle: String,
    pub time_ms: u32,
    pub result: String,
}
