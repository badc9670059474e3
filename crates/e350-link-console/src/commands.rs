/*
[INPUT]:  Parsed device subcommand, device client
[OUTPUT]: Operator output lines or the command error
[POS]:    CLI layer - command dispatch
[UPDATE]: When adding subcommands or changing their output
*/

use e350_link_adapter::{
    AuxMaskController, ControlMode, DeviceClient, FREE_RUN_RPM_LIMIT, Result, StatusSnapshot, TaskParameterResolver,
    codec,
};
use tracing::warn;

use crate::cli::{AuxCommand, DeviceCommand, FreeRunCommand, TaskCommand};
use crate::render;

/// Execute one subcommand. Failures are returned untouched so the caller
/// can show the device's error text.
pub async fn execute(client: &DeviceClient, command: &DeviceCommand) -> Result<Vec<String>> {
    match command {
        DeviceCommand::Status => {
            let frame = client.status().await?;
            Ok(vec![render::snapshot_line(&StatusSnapshot::from_frame(&frame))])
        }
        DeviceCommand::Mode { mode } => {
            let mode: ControlMode = (*mode).into();
            client.set_mode(mode).await?;
            let code = if mode.is_serial() { 1 } else { 0 };
            Ok(vec![format!("mode={}", codec::mode_label(code).unwrap_or("?"))])
        }
        DeviceCommand::Restart => {
            let response = client.restart().await?;
            Ok(vec![
                "restarted".to_string(),
                render::snapshot_line(&response.snapshot()),
            ])
        }
        DeviceCommand::FaultReset => {
            let response = client.fault_reset().await?;
            Ok(vec![format!(
                "fault={}",
                codec::format_fault(i64::from(response.fault_code()))
            )])
        }
        DeviceCommand::Aux { action } => execute_aux(client, action).await,
        DeviceCommand::FreeRun { action } => execute_free_run(client, action).await,
        DeviceCommand::Task { action } => execute_task(client, action).await,
        DeviceCommand::Ops => {
            let events = client.operation_log().await?.into_events();
            Ok(events.iter().map(render::event_line).collect())
        }
    }
}

async fn execute_aux(client: &DeviceClient, action: &AuxCommand) -> Result<Vec<String>> {
    let mut controller = AuxMaskController::new(client.clone());
    match action {
        AuxCommand::Toggle { bit } => {
            // the toggle direction comes from the device's current mask
            let frame = client.status().await?;
            controller.observe_snapshot(&StatusSnapshot::from_frame(&frame));
            controller.toggle(*bit).await?;
        }
        AuxCommand::Clear => {
            controller.clear().await?;
        }
        AuxCommand::Set { mask } => {
            controller.set_mask(*mask).await?;
        }
    }
    Ok(vec![format!("aux={}", controller.display())])
}

async fn execute_free_run(client: &DeviceClient, action: &FreeRunCommand) -> Result<Vec<String>> {
    match action {
        FreeRunCommand::Set { rpm, torque } => {
            if rpm.abs() > FREE_RUN_RPM_LIMIT {
                warn!(rpm, limit = FREE_RUN_RPM_LIMIT, "free-run speed beyond device range; it will be clamped");
            }
            let response = client.free_run_set(*rpm, *torque).await?;
            Ok(vec![render::free_run_set_line(&response)])
        }
        FreeRunCommand::Start => {
            let response = client.free_run_start().await?;
            Ok(vec![format!("aux={}", codec::format_hex16(i64::from(response.aux_mask())))])
        }
        FreeRunCommand::Stop => {
            let response = client.free_run_stop().await?;
            Ok(vec![format!("aux={}", codec::format_hex16(i64::from(response.aux_mask())))])
        }
    }
}

async fn execute_task(client: &DeviceClient, action: &TaskCommand) -> Result<Vec<String>> {
    let resolver = TaskParameterResolver::new(client.clone());
    match action {
        TaskCommand::Load { task } => {
            let loaded = resolver.load(*task).await?;
            Ok(render::task_form_lines(*task, &loaded.form()))
        }
        TaskCommand::Save {
            task,
            method,
            torque,
            speed,
            angle,
            time_ms,
        } => {
            let mut form = resolver.load(*task).await?.form();
            apply_edit(&mut form.method, method);
            apply_edit(&mut form.torque, torque);
            apply_edit(&mut form.speed, speed);
            apply_edit(&mut form.angle, angle);
            apply_edit(&mut form.time_ms, time_ms);

            let response = resolver.save(*task, &form).await?;
            Ok(render::save_report_lines(&response))
        }
        TaskCommand::Run { task, hold } => {
            resolver.run(*task, hold).await?;
            Ok(vec!["OK".to_string()])
        }
        TaskCommand::FreeRun { task, rpm } => {
            resolver.run_free_run(*task, *rpm).await?;
            Ok(vec!["OK".to_string()])
        }
    }
}

fn apply_edit(field: &mut String, edit: &Option<String>) {
    if let Some(value) = edit {
        *field = value.clone();
    }
}
