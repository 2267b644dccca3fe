//! Compile a validated project into runtime objects.

use crate::engine::{EngineConfig, TankLoop};
use crate::error::{AppError, AppResult};
use lf_controls::{
    OutputLimits, PidController, PidGains, SampleConfig, SetpointProfile, Transition, Waveform,
};
use lf_core::TankId;
use lf_io::{Calibration, ChannelCalibration, Scale};
use lf_project::{
    CalibrationDef, ChannelCalibrationDef, ControllerProject, IntegratorDef, LoopDef, PlantDef,
    SetpointDef, WaveformDef,
};
use lf_sim::{
    FirstOrderActuator, IntegratorType, PlantOptions, SimulatedPlant, TankParams, TwoTankModel,
};
use std::time::Duration;

fn channel(def: &ChannelCalibrationDef, scale: Scale) -> AppResult<ChannelCalibration> {
    let cal = ChannelCalibration::new(def.v_min, def.v_max, scale)?;
    Ok(match def.decimals {
        Some(places) => cal.with_decimals(places),
        None => cal,
    })
}

pub fn build_calibration(def: &CalibrationDef) -> AppResult<Calibration> {
    Ok(Calibration {
        tank_levels: [
            channel(&def.tank_levels[0], Scale::Percent)?,
            channel(&def.tank_levels[1], Scale::Percent)?,
        ],
        valve_feedback: [
            channel(&def.valve_feedback[0], Scale::Fraction)?,
            channel(&def.valve_feedback[1], Scale::Fraction)?,
        ],
    })
}

fn build_setpoint(def: &SetpointDef) -> AppResult<SetpointProfile> {
    let Some(transition) = &def.transition else {
        return Ok(SetpointProfile::constant(def.base));
    };
    let waveform = match transition.waveform {
        WaveformDef::Step { value } => Waveform::Step { value },
        WaveformDef::Sinusoid {
            amplitude,
            frequency_hz,
        } => Waveform::sinusoid_hz(amplitude, frequency_hz),
    };
    Ok(SetpointProfile::with_transition(
        def.base,
        Transition {
            activation_time: transition.activation_time_s,
            waveform,
        },
    )?)
}

fn build_loop(def: &LoopDef) -> AppResult<TankLoop> {
    let gains = PidGains::new(def.gains.kp, def.gains.ki, def.gains.kd)?;
    let limits = OutputLimits::new(def.out_min, def.out_max)?;
    let setpoint = build_setpoint(&def.setpoint)?;
    let pid = PidController::new(gains, limits, setpoint.value(0.0));
    Ok(TankLoop::new(def.tank, pid, setpoint))
}

/// One loop per tank, in tank order.
pub fn build_loops(project: &ControllerProject) -> AppResult<[TankLoop; 2]> {
    let find = |tank: TankId| {
        project
            .loop_for(tank)
            .ok_or_else(|| AppError::Config(format!("no loop configured for {tank}")))
            .and_then(build_loop)
    };
    Ok([find(TankId::A)?, find(TankId::B)?])
}

pub fn engine_config(project: &ControllerProject) -> AppResult<EngineConfig> {
    let sample = SampleConfig::new(project.run.period_s)?;
    let max_run_duration = project
        .run
        .max_run_duration_s
        .map(Duration::try_from_secs_f64)
        .transpose()
        .map_err(|e| AppError::Config(format!("max_run_duration_s: {e}")))?;
    Ok(EngineConfig {
        sample,
        fail_safe_position: project.run.fail_safe_position,
        max_run_duration,
    })
}

pub fn build_plant(def: &PlantDef, calibration: Calibration) -> AppResult<SimulatedPlant> {
    let tank = |i: usize| {
        let t = &def.tanks[i];
        TankParams::new(t.inflow_gain, t.outflow_coefficient, t.initial_level)
    };
    let model = TwoTankModel::new(
        [tank(0)?, tank(1)?],
        FirstOrderActuator::new(def.valve_tau_s, def.valve_rate_limit)?,
    );
    let options = PlantOptions {
        substep: def.substep_s,
        integrator: match def.integrator {
            IntegratorDef::Rk4 => IntegratorType::RK4,
            IntegratorDef::ForwardEuler => IntegratorType::ForwardEuler,
        },
        noise_volts: def.noise_volts,
        seed: def.seed,
    };
    Ok(SimulatedPlant::new(model, calibration, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::{ValveId, volts};

    #[test]
    fn reference_project_compiles() {
        let project = ControllerProject::reference();
        let loops = build_loops(&project).unwrap();
        assert_eq!(loops[0].tank, TankId::A);
        assert_eq!(loops[1].tank, TankId::B);
        assert_eq!(loops[0].pid.gains().kp, 0.08);
        assert_eq!(loops[1].setpoint.value(199.0), 35.0);
        assert!((loops[1].setpoint.value(250.0) - 40.0).abs() < 1e-9);

        let config = engine_config(&project).unwrap();
        assert_eq!(config.sample.dt(), 1.0);
        assert_eq!(config.fail_safe_position, 1.0);
        assert_eq!(config.max_run_duration, None);
    }

    #[test]
    fn calibration_matches_reference_rig() {
        let cal = build_calibration(&CalibrationDef::default()).unwrap();
        assert_eq!(cal, Calibration::reference());
        let valve = cal.valve(ValveId::A);
        assert_eq!(valve.apply(volts(2.96)).unwrap(), 1.0);
    }

    #[test]
    fn loops_are_ordered_by_tank_not_file_order() {
        let mut project = ControllerProject::reference();
        project.loops.reverse();
        let loops = build_loops(&project).unwrap();
        assert_eq!(loops[0].tank, TankId::A);
    }

    #[test]
    fn plant_builds_from_defaults() {
        let plant = build_plant(&PlantDef::default(), Calibration::reference()).unwrap();
        assert_eq!(plant.time(), 0.0);
    }
}
