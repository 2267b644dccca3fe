use lf_app::{
    AppError, ClockMode, RunOptions, StopReason, display_channel, execute_run, load_run_summary,
};
use lf_core::{StopSignal, TankId};
use lf_project::ControllerProject;
use lf_results::{load_csv, load_manifest};

fn accelerated(seconds: f64, dir: &std::path::Path) -> RunOptions {
    RunOptions {
        clock: ClockMode::Accelerated,
        max_run_duration_s: Some(seconds),
        export_dir: Some(dir.to_path_buf()),
    }
}

#[test]
fn simulated_run_settles_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let project = ControllerProject::reference();

    let report = execute_run(
        &project,
        &accelerated(600.0, dir.path()),
        StopSignal::new(),
        None,
    )
    .unwrap();

    assert_eq!(report.stop_reason, StopReason::DurationLimit);
    assert_eq!(report.history.len(), 600);
    assert!(report.fail_safe.is_ok());

    let last = report.history.last().unwrap();
    let tank_a = last.loop_sample(TankId::A);
    assert!(
        (tank_a.measurement - 35.0).abs() < 0.5,
        "tank A ended at {}",
        tank_a.measurement
    );
    // Tank B follows a moving setpoint but stays in the neighborhood.
    let tank_b = last.loop_sample(TankId::B);
    assert!((tank_b.measurement - tank_b.setpoint).abs() < 5.0);

    let exported = report.export.as_ref().unwrap();
    assert!(exported.csv_path.starts_with(dir.path()));
    assert_eq!(exported.record_count, 600);
    assert_eq!(load_csv(&exported.csv_path).unwrap(), report.history);

    let manifest = load_manifest(exported.manifest_path.as_ref().unwrap()).unwrap();
    assert_eq!(manifest.record_count, 600);
    assert_eq!(manifest.project_name, project.name);
    assert_eq!(manifest.stop_reason, "run duration limit reached");
    assert_eq!(manifest.run_id.len(), 64);

    let summary = load_run_summary(&exported.csv_path, [1.0; 2]).unwrap();
    assert_eq!(summary.record_count, 600);
    assert_eq!(summary.time_range, (0.0, 599.0));
}

#[test]
fn display_receives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let (display, rx) = display_channel(1024);

    let report = execute_run(
        &ControllerProject::reference(),
        &accelerated(20.0, dir.path()),
        StopSignal::new(),
        Some(Box::new(display)),
    )
    .unwrap();

    let shown: Vec<_> = rx.try_iter().collect();
    assert_eq!(shown.len(), 20);
    assert_eq!(shown, report.history.records());
}

#[test]
fn accelerated_run_needs_a_limit() {
    let dir = tempfile::tempdir().unwrap();
    let options = RunOptions {
        clock: ClockMode::Accelerated,
        max_run_duration_s: None,
        export_dir: Some(dir.path().to_path_buf()),
    };
    let result = execute_run(
        &ControllerProject::reference(),
        &options,
        StopSignal::new(),
        None,
    );
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn invalid_project_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = ControllerProject::reference();
    project.run.period_s = 0.0;

    let result = execute_run(
        &project,
        &accelerated(10.0, dir.path()),
        StopSignal::new(),
        None,
    );
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn unrepresentable_periods_are_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    for period_s in [1e20, 1e-10] {
        let mut project = ControllerProject::reference();
        project.run.period_s = period_s;

        let result = execute_run(
            &project,
            &accelerated(10.0, dir.path()),
            StopSignal::new(),
            None,
        );
        assert!(
            matches!(result, Err(AppError::Validation(_))),
            "period {period_s} gave {result:?}"
        );
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn pre_stopped_run_still_exports_a_header() {
    let dir = tempfile::tempdir().unwrap();
    let stop = StopSignal::new();
    stop.trigger();

    let report = execute_run(
        &ControllerProject::reference(),
        &accelerated(10.0, dir.path()),
        stop,
        None,
    )
    .unwrap();

    assert_eq!(report.stop_reason, StopReason::Operator);
    let exported = report.export.unwrap();
    assert!(load_csv(&exported.csv_path).unwrap().is_empty());
}
