//! Configuration validation.
//!
//! Everything the engine would otherwise reject at startup is caught here, so
//! a file that passes `validate` runs.

use crate::schema::{
    CalibrationDef, ChannelCalibrationDef, ControllerProject, LATEST_VERSION, LoopDef, PlantDef,
    RunDef, WaveformDef,
};
use lf_core::TankId;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and positive"))
    }
}

/// A loop period must also fit a non-zero `Duration`.
fn period(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    let field = field.into();
    positive(field.as_str(), value)?;
    match std::time::Duration::try_from_secs_f64(value) {
        Ok(d) if !d.is_zero() => Ok(()),
        Ok(_) => Err(invalid(field, value, "must be at least one nanosecond")),
        Err(_) => Err(invalid(field, value, "is too large")),
    }
}

fn non_negative(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and non-negative"))
    }
}

fn finite(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

pub fn validate_project(project: &ControllerProject) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_run(&project.run)?;

    let mut tanks = HashSet::new();
    for def in &project.loops {
        if !tanks.insert(def.tank) {
            return Err(ValidationError::DuplicateId {
                id: def.tank.to_string(),
                context: "loops".to_string(),
            });
        }
        validate_loop(def)?;
    }
    for tank in TankId::ALL {
        if !tanks.contains(&tank) {
            return Err(ValidationError::MissingReference {
                id: tank.to_string(),
                context: "loops".to_string(),
            });
        }
    }

    validate_calibration(&project.calibration)?;

    if project.export.file_prefix.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "export.file_prefix".to_string(),
            value: project.export.file_prefix.clone(),
            reason: "must not be empty".to_string(),
        });
    }
    if project.display.enabled && project.display.buffer == 0 {
        return Err(ValidationError::InvalidValue {
            field: "display.buffer".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1 when the display is enabled".to_string(),
        });
    }

    validate_plant(&project.plant)
}

fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    period("run.period_s", run.period_s)?;
    if !(0.0..=1.0).contains(&run.fail_safe_position) {
        return Err(invalid(
            "run.fail_safe_position",
            run.fail_safe_position,
            "must be within 0..=1",
        ));
    }
    if let Some(limit) = run.max_run_duration_s {
        positive("run.max_run_duration_s", limit)?;
    }
    Ok(())
}

fn validate_loop(def: &LoopDef) -> Result<(), ValidationError> {
    let ctx = |field: &str| format!("loops[{}].{field}", def.tank);

    non_negative(ctx("gains.kp"), def.gains.kp)?;
    non_negative(ctx("gains.ki"), def.gains.ki)?;
    non_negative(ctx("gains.kd"), def.gains.kd)?;

    finite(ctx("out_min"), def.out_min)?;
    finite(ctx("out_max"), def.out_max)?;
    if def.out_min >= def.out_max {
        return Err(invalid(ctx("out_min"), def.out_min, "must be less than out_max"));
    }

    finite(ctx("setpoint.base"), def.setpoint.base)?;
    if let Some(transition) = &def.setpoint.transition {
        non_negative(ctx("setpoint.transition.activation_time_s"), transition.activation_time_s)?;
        match transition.waveform {
            WaveformDef::Step { value } => finite(ctx("setpoint.transition.value"), value)?,
            WaveformDef::Sinusoid {
                amplitude,
                frequency_hz,
            } => {
                finite(ctx("setpoint.transition.amplitude"), amplitude)?;
                positive(ctx("setpoint.transition.frequency_hz"), frequency_hz)?;
            }
        }
    }
    Ok(())
}

fn validate_channel(field: String, cal: &ChannelCalibrationDef) -> Result<(), ValidationError> {
    finite(format!("{field}.v_min"), cal.v_min)?;
    finite(format!("{field}.v_max"), cal.v_max)?;
    if cal.v_min == cal.v_max {
        return Err(invalid(
            format!("{field}.v_max"),
            cal.v_max,
            "must differ from v_min",
        ));
    }
    Ok(())
}

fn validate_calibration(cal: &CalibrationDef) -> Result<(), ValidationError> {
    for (i, channel) in cal.tank_levels.iter().enumerate() {
        validate_channel(format!("calibration.tank_levels[{i}]"), channel)?;
    }
    for (i, channel) in cal.valve_feedback.iter().enumerate() {
        validate_channel(format!("calibration.valve_feedback[{i}]"), channel)?;
    }
    Ok(())
}

fn validate_plant(plant: &PlantDef) -> Result<(), ValidationError> {
    for (i, tank) in plant.tanks.iter().enumerate() {
        positive(format!("plant.tanks[{i}].inflow_gain"), tank.inflow_gain)?;
        positive(
            format!("plant.tanks[{i}].outflow_coefficient"),
            tank.outflow_coefficient,
        )?;
        if !(0.0..=100.0).contains(&tank.initial_level) {
            return Err(invalid(
                format!("plant.tanks[{i}].initial_level"),
                tank.initial_level,
                "must be within 0..=100",
            ));
        }
    }
    positive("plant.valve_tau_s", plant.valve_tau_s)?;
    positive("plant.valve_rate_limit", plant.valve_rate_limit)?;
    positive("plant.substep_s", plant.substep_s)?;
    non_negative("plant.noise_volts", plant.noise_volts)
}
