/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public E350 link adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod aux_mask;
pub mod codec;
pub mod http;
pub mod oplog;
pub mod stream;
pub mod tasks;
pub mod types;

pub use aux_mask::{AuxMaskController, AuxMaskState};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    DEFAULT_BASE_URL,
    DeviceClient,
    FREE_RUN_RPM_LIMIT,
    LinkError,
    Result,
};

pub use oplog::{DEFAULT_POLL_INTERVAL, OperationLogPoller, PollStats, PollStatsSnapshot};

// Re-export commonly used types from stream
pub use stream::{FrameOutcome, StatusStream, StreamStats, StreamStatsSnapshot};

pub use tasks::{
    DEFAULT_HOLD_MS,
    EffectiveParameters,
    LoadedTask,
    MAX_TASK_ID,
    TaskId,
    TaskParameterForm,
    TaskParameterResolver,
};

// Re-export all types
pub use types::*;
