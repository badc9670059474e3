/*
[INPUT]:  Operator commands (mode, restart, aux, free-run, task parameters, run)
[OUTPUT]: Typed command responses under the uniform success/failure contract
[POS]:    HTTP layer - mutating endpoints and their reads
[UPDATE]: When adding new endpoints or changing request/response shapes
*/

use tracing::info;

use crate::http::{DeviceClient, Result};
use crate::types::{
    Ack, AuxRequest, AuxResponse, ControlMode, EmptyRequest, FaultResetResponse,
    FreeRunAuxResponse, FreeRunSetRequest, FreeRunSetResponse, OperationLog, RestartResponse,
    RunTaskRequest, SaveTaskParamsRequest, SaveTaskParamsResponse, SetModeRequest, StatusFrame,
    TaskParamsResponse,
};

/// Free-run speed range accepted by the device; the server clamps to it.
pub const FREE_RUN_RPM_LIMIT: i32 = 2000;

impl DeviceClient {
    /// Read the current status once
    ///
    /// GET /api/status
    pub async fn status(&self) -> Result<StatusFrame> {
        self.get_json("/api/status").await
    }

    /// Switch the device between I/O and serial control
    ///
    /// POST /api/set_mode
    pub async fn set_mode(&self, mode: ControlMode) -> Result<Ack> {
        let req = SetModeRequest {
            rs: mode.is_serial(),
        };
        let ack = self.post_json("/api/set_mode", &req).await?;
        info!(rs = req.rs, "control mode set");
        Ok(ack)
    }

    /// Soft restart: fault reset, serial mode, port re-open, fresh status
    ///
    /// POST /api/restart
    pub async fn restart(&self) -> Result<RestartResponse> {
        let response: RestartResponse = self.post_json("/api/restart", &EmptyRequest {}).await?;
        info!(
            mode = response.status.mode,
            fault = response.status.fault,
            "device restarted"
        );
        Ok(response)
    }

    /// POST /api/fault_reset
    pub async fn fault_reset(&self) -> Result<FaultResetResponse> {
        let response: FaultResetResponse =
            self.post_json("/api/fault_reset", &EmptyRequest {}).await?;
        info!(fault = response.fault_code(), "fault reset");
        Ok(response)
    }

    /// Mutate the aux (virtual DI) mask
    ///
    /// POST /api/aux
    pub async fn set_aux(&self, req: AuxRequest) -> Result<AuxResponse> {
        self.post_json("/api/aux", &req).await
    }

    /// Write free-run speed and optional torque limit
    ///
    /// POST /api/fr_set
    pub async fn free_run_set(&self, rpm: i32, torque_nm: Option<f64>) -> Result<FreeRunSetResponse> {
        let req = FreeRunSetRequest {
            rpm,
            torque: torque_nm,
        };
        self.post_json("/api/fr_set", &req).await
    }

    /// POST /api/fr_start
    pub async fn free_run_start(&self) -> Result<FreeRunAuxResponse> {
        self.post_json("/api/fr_start", &EmptyRequest {}).await
    }

    /// POST /api/fr_stop
    pub async fn free_run_stop(&self) -> Result<FreeRunAuxResponse> {
        self.post_json("/api/fr_stop", &EmptyRequest {}).await
    }

    /// Read one task's overrides and the global defaults
    ///
    /// GET /api/task_params?task={task}
    pub async fn task_params(&self, task: u8) -> Result<TaskParamsResponse> {
        let endpoint = format!("/api/task_params?task={}", task);
        self.get_json(&endpoint).await
    }

    /// POST /api/task_params
    pub async fn save_task_params(&self, req: &SaveTaskParamsRequest) -> Result<SaveTaskParamsResponse> {
        let response: SaveTaskParamsResponse = self.post_json("/api/task_params", req).await?;
        info!(
            task = req.task,
            failed = response.failed_fields().count(),
            "task parameters saved"
        );
        Ok(response)
    }

    /// POST /api/run_task
    pub async fn run_task(&self, req: &RunTaskRequest) -> Result<Ack> {
        let ack = self.post_json("/api/run_task", req).await?;
        info!(task = req.task, action = ?req.action, "task started");
        Ok(ack)
    }

    /// Latest batch of operation log events
    ///
    /// GET /api/ops
    pub async fn operation_log(&self) -> Result<OperationLog> {
        self.get_json("/api/ops").await
    }
}
