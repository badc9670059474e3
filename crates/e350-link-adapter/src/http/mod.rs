/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - command API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod commands;
pub mod error;

pub use error::{LinkError, Result};

pub use client::{ClientConfig, DEFAULT_BASE_URL, DeviceClient};
pub use commands::FREE_RUN_RPM_LIMIT;
