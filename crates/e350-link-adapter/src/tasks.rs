/*
[INPUT]:  Task id, per-task overrides, global defaults, operator-edited fields
[OUTPUT]: Effective parameters, editable form values, save/run requests
[POS]:    Domain layer - task parameter override resolution
[UPDATE]: When task registers, unit conversions or the task id range change
*/

use std::fmt;

use tracing::debug;

use crate::codec;
use crate::http::{DeviceClient, LinkError, Result};
use crate::types::{
    Ack, GlobalDefaults, RunTaskRequest, SaveTaskParamsRequest, SaveTaskParamsResponse,
    TaskAction, TaskParameterSet,
};

/// Highest task id; the task is selected through two virtual DI bits.
pub const MAX_TASK_ID: u8 = 3;

/// Hold duration used when the operator leaves the field blank.
pub const DEFAULT_HOLD_MS: i64 = 1000;

/// Validated task id (`0..=MAX_TASK_ID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u8);

impl TaskId {
    pub fn new(id: u8) -> Result<Self> {
        if id > MAX_TASK_ID {
            return Err(LinkError::InvalidTask(id));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TaskId {
    type Error = LinkError;

    fn try_from(id: u8) -> Result<Self> {
        Self::new(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters in effect for one task, wire-raw units.
///
/// `None` means neither the task nor the globals define the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectiveParameters {
    pub method: Option<i64>,
    pub torque_mnm: Option<i64>,
    pub speed_rpm: Option<i64>,
    pub angle: u32,
    pub time_ms: i64,
}

impl EffectiveParameters {
    /// Task override wins; the global default fills the gap.
    ///
    /// Angle and time have no global default. Angle needs both halves,
    /// otherwise it is 0.
    pub fn resolve(task: &TaskParameterSet, globals: &GlobalDefaults) -> Self {
        let angle = match (task.angle_lo.raw, task.angle_hi.raw) {
            (Some(lo), Some(hi)) => codec::combine_u32(codec::to_u16(hi), codec::to_u16(lo)),
            _ => 0,
        };

        Self {
            method: task.method.raw.or(globals.method),
            torque_mnm: task.torque.raw.or(globals.torque_mnm),
            speed_rpm: task.speed.raw.or(globals.speed_rpm),
            angle,
            time_ms: task.time_ms.raw.unwrap_or(0),
        }
    }

    /// Values as the operator edits them: torque in N·m, the rest raw.
    pub fn to_form(&self) -> TaskParameterForm {
        TaskParameterForm {
            method: self.method.map(|m| m.to_string()).unwrap_or_default(),
            torque: self.torque_mnm.map(codec::format_torque).unwrap_or_default(),
            speed: self.speed_rpm.map(|s| s.to_string()).unwrap_or_default(),
            angle: self.angle.to_string(),
            time_ms: self.time_ms.to_string(),
        }
    }
}

/// Editable task parameters as text, the way an operator types them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskParameterForm {
    pub method: String,
    /// N·m
    pub torque: String,
    pub speed: String,
    pub angle: String,
    pub time_ms: String,
}

impl TaskParameterForm {
    /// Build the save body.
    ///
    /// Blank torque, speed, angle and time count as `0`; a blank method has
    /// no default. Unparsable fields go out as `null`. Torque is sent as
    /// the edited N·m value, without scaling back to mN·m.
    pub fn to_save_request(&self, task: TaskId) -> SaveTaskParamsRequest {
        SaveTaskParamsRequest {
            task: task.get(),
            method: parse_int_prefix(&self.method),
            torque: parse_float_prefix(or_zero(&self.torque)),
            speed: parse_int_prefix(or_zero(&self.speed)),
            angle: parse_int_prefix(or_zero(&self.angle)),
            time_ms: parse_int_prefix(or_zero(&self.time_ms)),
        }
    }
}

/// One loaded task: what the device holds and what is in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTask {
    pub task: TaskId,
    pub overrides: TaskParameterSet,
    pub globals: GlobalDefaults,
    pub effective: EffectiveParameters,
}

impl LoadedTask {
    pub fn form(&self) -> TaskParameterForm {
        self.effective.to_form()
    }
}

/// Tighten request; a blank hold means [`DEFAULT_HOLD_MS`], an unparsable
/// one is left out so the device default applies.
pub fn tighten_request(task: TaskId, hold_ms: &str) -> RunTaskRequest {
    let hold = if hold_ms.is_empty() {
        Some(DEFAULT_HOLD_MS)
    } else {
        parse_int_prefix(hold_ms)
    };

    RunTaskRequest {
        task: task.get(),
        action: TaskAction::Tighten,
        hold_ms: hold,
        rpm: None,
    }
}

/// Loads, saves and runs tasks through the command API.
///
/// Nothing is cached; every load reads the device again.
#[derive(Debug, Clone)]
pub struct TaskParameterResolver {
    client: DeviceClient,
}

impl TaskParameterResolver {
    pub fn new(client: DeviceClient) -> Self {
        Self { client }
    }

    pub async fn load(&self, task: u8) -> Result<LoadedTask> {
        let task = TaskId::new(task)?;
        let response = self.client.task_params(task.get()).await?;
        let effective = EffectiveParameters::resolve(&response.task, &response.globals);
        debug!(%task, ?effective, "task parameters resolved");

        Ok(LoadedTask {
            task,
            overrides: response.task,
            globals: response.globals,
            effective,
        })
    }

    pub async fn save(&self, task: u8, form: &TaskParameterForm) -> Result<SaveTaskParamsResponse> {
        let task = TaskId::new(task)?;
        let request = form.to_save_request(task);
        self.client.save_task_params(&request).await
    }

    /// Select the task and pulse start for `hold_ms` (operator text).
    pub async fn run(&self, task: u8, hold_ms: &str) -> Result<Ack> {
        let task = TaskId::new(task)?;
        self.client.run_task(&tighten_request(task, hold_ms)).await
    }

    /// Select the task and enter free-run, optionally writing a speed first.
    pub async fn run_free_run(&self, task: u8, rpm: Option<i32>) -> Result<Ack> {
        let task = TaskId::new(task)?;
        let request = RunTaskRequest {
            task: task.get(),
            action: TaskAction::FreeRun,
            hold_ms: None,
            rpm,
        };
        self.client.run_task(&request).await
    }
}

fn or_zero(value: &str) -> &str {
    if value.is_empty() { "0" } else { value }
}

/// Leading-integer parse: whitespace, optional sign, digits; trailing text
/// is ignored. `None` when no digit leads.
fn parse_int_prefix(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Leading-decimal parse with the same tolerance as [`parse_int_prefix`].
/// Non-finite results are `None`.
fn parse_float_prefix(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamField;
    use rstest::rstest;

    fn globals() -> GlobalDefaults {
        GlobalDefaults {
            method: Some(1),
            torque_mnm: Some(2500),
            speed_rpm: Some(300),
        }
    }

    #[test]
    fn test_task_id_range() {
        assert_eq!(TaskId::new(3).unwrap().get(), 3);
        assert!(matches!(TaskId::new(4), Err(LinkError::InvalidTask(4))));
    }

    #[test]
    fn test_torque_falls_back_to_global() {
        let task = TaskParameterSet {
            torque: ParamField::inherit(),
            ..Default::default()
        };
        let form = EffectiveParameters::resolve(&task, &globals()).to_form();
        assert_eq!(form.torque, "2.500");
        assert_eq!(form.method, "1");
        assert_eq!(form.speed, "300");
    }

    #[test]
    fn test_task_override_wins() {
        let task = TaskParameterSet {
            torque: ParamField::raw(1800),
            speed: ParamField::raw(450),
            time_ms: ParamField::raw(2000),
            ..Default::default()
        };
        let effective = EffectiveParameters::resolve(&task, &globals());
        assert_eq!(effective.torque_mnm, Some(1800));
        assert_eq!(effective.speed_rpm, Some(450));
        assert_eq!(effective.time_ms, 2000);
        assert_eq!(effective.to_form().torque, "1.800");
    }

    #[test]
    fn test_partial_angle_is_zero() {
        let task = TaskParameterSet {
            angle_lo: ParamField::raw(100),
            angle_hi: ParamField::inherit(),
            ..Default::default()
        };
        assert_eq!(EffectiveParameters::resolve(&task, &globals()).angle, 0);

        let task = TaskParameterSet {
            angle_lo: ParamField::raw(2),
            angle_hi: ParamField::raw(1),
            ..Default::default()
        };
        assert_eq!(EffectiveParameters::resolve(&task, &globals()).angle, 65538);
    }

    #[test]
    fn test_missing_global_leaves_field_blank() {
        let effective =
            EffectiveParameters::resolve(&TaskParameterSet::default(), &GlobalDefaults::default());
        let form = effective.to_form();
        assert_eq!(form.method, "");
        assert_eq!(form.torque, "");
        assert_eq!(form.angle, "0");
        assert_eq!(form.time_ms, "0");
    }

    #[test]
    fn test_save_sends_torque_unscaled() {
        let form = TaskParameterForm {
            method: "1".into(),
            torque: "2.500".into(),
            speed: "300".into(),
            angle: "".into(),
            time_ms: "".into(),
        };
        let req = form.to_save_request(TaskId::new(1).unwrap());
        assert_eq!(req.torque, Some(2.5));
        assert_eq!(req.speed, Some(300));
        assert_eq!(req.angle, Some(0));
        assert_eq!(req.time_ms, Some(0));
        assert_eq!(req.method, Some(1));
    }

    #[test]
    fn test_save_blank_method_is_null() {
        let form = TaskParameterForm {
            speed: "abc".into(),
            ..Default::default()
        };
        let req = form.to_save_request(TaskId::new(0).unwrap());
        assert_eq!(req.method, None);
        assert_eq!(req.speed, None);
        assert_eq!(req.torque, Some(0.0));
    }

    #[rstest]
    #[case("42", Some(42))]
    #[case("  -7rpm", Some(-7))]
    #[case("+5", Some(5))]
    #[case("3.9", Some(3))]
    #[case("x1", None)]
    #[case("-", None)]
    #[case("", None)]
    fn test_parse_int_prefix(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_int_prefix(input), expected);
    }

    #[rstest]
    #[case("2.5", Some(2.5))]
    #[case(" 1.25Nm", Some(1.25))]
    #[case(".5", Some(0.5))]
    #[case("3.", Some(3.0))]
    #[case("1e3", Some(1000.0))]
    #[case("2e", Some(2.0))]
    #[case("-0.8", Some(-0.8))]
    #[case(".", None)]
    #[case("abc", None)]
    fn test_parse_float_prefix(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_float_prefix(input), expected);
    }

    #[test]
    fn test_tighten_hold_defaults() {
        let task = TaskId::new(2).unwrap();
        assert_eq!(tighten_request(task, "").hold_ms, Some(1000));
        assert_eq!(tighten_request(task, "1500").hold_ms, Some(1500));
        assert_eq!(tighten_request(task, "soon").hold_ms, None);
        assert_eq!(tighten_request(task, "").action, TaskAction::Tighten);
    }
}
