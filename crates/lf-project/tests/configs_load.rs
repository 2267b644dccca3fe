use lf_project::{ControllerProject, WaveformDef, load};
use std::path::Path;

#[test]
fn shipped_configs_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs");
    for name in ["two_tank.yaml", "step_disturbance.yaml"] {
        load(&root.join(name)).unwrap_or_else(|e| panic!("Failed to load {name}: {e}"));
    }
}

#[test]
fn two_tank_config_matches_reference() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs");
    let project = load(&root.join("two_tank.yaml")).unwrap();
    assert_eq!(project, ControllerProject::reference());
}

#[test]
fn step_config_uses_step_waveform() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs");
    let project = load(&root.join("step_disturbance.yaml")).unwrap();
    let transition = project.loops[1].setpoint.transition.as_ref().unwrap();
    assert_eq!(transition.waveform, WaveformDef::Step { value: 51.0 });
    assert_eq!(project.run.max_run_duration_s, Some(900.0));
}
