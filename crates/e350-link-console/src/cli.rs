/*
[INPUT]:  Command-line arguments
[OUTPUT]: Parsed console subcommands
[POS]:    CLI layer - argument definitions
[UPDATE]: When adding or changing subcommands
*/

use clap::{Subcommand, ValueEnum};
use e350_link_adapter::ControlMode;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Follow live status and the operation log until Ctrl-C
    Watch,
    #[command(flatten)]
    Device(DeviceCommand),
}

/// One request/response exchange with the device.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Read the status once
    Status,
    /// Switch control source
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Fault reset, serial mode, port re-open
    Restart,
    FaultReset,
    /// Virtual digital inputs
    Aux {
        #[command(subcommand)]
        action: AuxCommand,
    },
    /// Free-run setpoints and control
    FreeRun {
        #[command(subcommand)]
        action: FreeRunCommand,
    },
    /// Task parameters and task start
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Print the latest operation log batch
    Ops,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// RS485/232
    Rs,
    /// Digital I/O
    Io,
}

impl From<ModeArg> for ControlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rs => ControlMode::Serial,
            ModeArg::Io => ControlMode::Io,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AuxCommand {
    /// Flip one bit (0-15) of the current mask
    Toggle { bit: u8 },
    /// Set every bit to 0
    Clear,
    /// Write the whole mask (decimal or 0x-prefixed hex)
    Set {
        #[arg(value_parser = parse_mask)]
        mask: u16,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum FreeRunCommand {
    /// Write speed (rpm, signed) and optional torque limit (N·m)
    Set {
        #[arg(allow_hyphen_values = true)]
        rpm: i32,
        #[arg(long)]
        torque: Option<f64>,
    },
    Start,
    Stop,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// Show effective parameters of a task
    Load { task: u8 },
    /// Load a task, apply the given edits, save it
    Save {
        task: u8,
        #[arg(long)]
        method: Option<String>,
        /// N·m
        #[arg(long, allow_hyphen_values = true)]
        torque: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        speed: Option<String>,
        #[arg(long)]
        angle: Option<String>,
        #[arg(long = "time-ms")]
        time_ms: Option<String>,
    },
    /// Tighten with the task; blank hold means 1000 ms
    Run {
        task: u8,
        #[arg(long, default_value = "")]
        hold: String,
    },
    /// Select the task and enter free-run
    FreeRun {
        task: u8,
        #[arg(long, allow_hyphen_values = true)]
        rpm: Option<i32>,
    },
}

pub fn parse_mask(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    parsed.map_err(|err| format!("invalid 16-bit mask '{}': {}", value, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mask() {
        assert_eq!(parse_mask("0x0008"), Ok(8));
        assert_eq!(parse_mask("255"), Ok(255));
        assert!(parse_mask("0x10000").is_err());
        assert!(parse_mask("-1").is_err());
    }
}
