/*
[INPUT]:  Public API exports for e350-link-console crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod cli;
pub mod commands;
pub mod config;
pub mod monitor;
pub mod render;

// Re-export main types for convenience
pub use cli::{Command, DeviceCommand};
pub use config::ConsoleConfig;
pub use monitor::{Monitor, MonitorReport};
