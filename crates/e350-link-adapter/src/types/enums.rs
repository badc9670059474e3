/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskAction {
    #[serde(rename = "tighten")]
    Tighten,
    #[serde(rename = "freerun")]
    FreeRun,
}

/// Control source selected on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Hardwired digital I/O
    Io,
    /// Serial RS485/232, required for any command from this client
    Serial,
}

impl ControlMode {
    pub fn is_serial(self) -> bool {
        matches!(self, ControlMode::Serial)
    }
}
