use clap::{Parser, Subcommand, ValueEnum};
use lf_app::{
    AppError, AppResult, ClockMode, RunOptions, RunReport, RunSummary, display_channel,
    execute_run, extract_loop_series, format_record, project_service, query,
};
use lf_core::{StopSignal, TankId};
use lf_project::ControllerProject;
use lf_results::LoopSample;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "levelflow")]
#[command(about = "LevelFlow - two-tank level control loop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Write the reference rig project to a file
    Init {
        /// Where to write the project YAML
        project_path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Run the control loop until Ctrl-C or the duration limit
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Run on virtual time as fast as possible (needs --duration)
        #[arg(long)]
        fast: bool,
        /// Stop after this many seconds of loop time
        #[arg(long)]
        duration: Option<f64>,
        /// Export directory, overriding the project
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Do not print live telemetry
        #[arg(long)]
        no_display: bool,
    },
    /// Summarize an exported run
    Summarize {
        /// Exported CSV file
        csv_path: PathBuf,
        /// Valve command upper limit used for saturation
        #[arg(long, default_value_t = 1.0)]
        upper_limit: f64,
    },
    /// Export one loop variable from a run as `time_s,value`
    ExportSeries {
        /// Exported CSV file
        csv_path: PathBuf,
        #[arg(value_enum)]
        tank: TankArg,
        #[arg(value_enum)]
        variable: Variable,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TankArg {
    A,
    B,
}

impl From<TankArg> for TankId {
    fn from(arg: TankArg) -> Self {
        match arg {
            TankArg::A => TankId::A,
            TankArg::B => TankId::B,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Variable {
    Setpoint,
    Measurement,
    Command,
    Feedback,
}

impl Variable {
    fn get(self, sample: &LoopSample) -> f64 {
        match self {
            Variable::Setpoint => sample.setpoint,
            Variable::Measurement => sample.measurement,
            Variable::Command => sample.command,
            Variable::Feedback => sample.feedback,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Logs go to stderr so the live display owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Init {
            project_path,
            force,
        } => cmd_init(&project_path, force),
        Commands::Run {
            project_path,
            fast,
            duration,
            export_dir,
            no_display,
        } => {
            let options = RunOptions {
                clock: if fast {
                    ClockMode::Accelerated
                } else {
                    ClockMode::RealTime
                },
                max_run_duration_s: duration,
                export_dir,
            };
            cmd_run(&project_path, options, !no_display).await
        }
        Commands::Summarize {
            csv_path,
            upper_limit,
        } => cmd_summarize(&csv_path, upper_limit),
        Commands::ExportSeries {
            csv_path,
            tank,
            variable,
            output,
        } => cmd_export_series(&csv_path, tank.into(), variable, output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_init(project_path: &Path, force: bool) -> AppResult<()> {
    if project_path.exists() && !force {
        return Err(AppError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            project_path.display()
        )));
    }
    project_service::save_project(project_path, &ControllerProject::reference())?;
    println!("✓ Wrote reference project to {}", project_path.display());
    Ok(())
}

async fn cmd_run(project_path: &Path, options: RunOptions, show_display: bool) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let show_display = show_display && project.display.enabled;
    println!("Running project: {}", project.name);
    println!("  period = {:.3} s", project.run.period_s);
    let upper_limits = query::upper_limits(&project);

    let stop = StopSignal::new();
    let stop_on_signal = stop.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("stop requested");
        stop_on_signal.trigger();
    });

    let (display, printer) = if show_display {
        let (sink, rx) = display_channel(project.display.buffer);
        let printer = thread::spawn(move || {
            for record in rx {
                print!("\r{}", format_record(&record));
                let _ = io::stdout().flush();
            }
            println!();
        });
        (Some(Box::new(sink) as Box<dyn lf_app::DisplaySink>), Some(printer))
    } else {
        (None, None)
    };

    let report = tokio::task::spawn_blocking(move || execute_run(&project, &options, stop, display))
        .await
        .map_err(|e| AppError::Simulation(format!("control loop task failed: {e}")))?;

    // The engine dropped its sender, so the printer drains and exits.
    if let Some(printer) = printer
        && printer.join().is_err()
    {
        warn!("display thread panicked");
    }

    let report = report?;
    print_report(&report, upper_limits);

    match report.fault() {
        Some(fault) => Err(AppError::Engine(fault.clone())),
        None => Ok(()),
    }
}

fn print_report(report: &RunReport, upper_limits: [f64; 2]) {
    println!("\nStopped: {}", report.stop_reason);

    let stats = &report.stats;
    println!("\nCycle summary:");
    println!("  Iterations: {}", stats.iterations);
    println!("  Overruns:   {}", stats.overruns);
    println!("  Mean work:  {:.3} ms", stats.mean_work().as_secs_f64() * 1e3);
    println!("  Max work:   {:.3} ms", stats.max_work.as_secs_f64() * 1e3);

    match &report.fail_safe {
        Ok(()) => println!("  Fail-safe:  sent"),
        Err(e) => println!("  Fail-safe:  FAILED ({e})"),
    }
    match &report.export {
        Ok(exported) => {
            println!("✓ Exported {} records to {}", exported.record_count, exported.csv_path.display());
            if let Some(manifest) = &exported.manifest_path {
                println!("  Manifest: {}", manifest.display());
            }
        }
        Err(e) => println!("✗ Export failed: {e}"),
    }

    if let Ok(summary) = query::get_run_summary(&report.history, upper_limits) {
        print_summary(&summary);
    }
}

fn cmd_summarize(csv_path: &Path, upper_limit: f64) -> AppResult<()> {
    println!("Loading run: {}", csv_path.display());
    let summary = query::load_run_summary(csv_path, [upper_limit; 2])?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\nRun Summary:");
    println!("  Records: {}", summary.record_count);
    println!(
        "  Time range: {:.3} - {:.3} s",
        summary.time_range.0, summary.time_range.1
    );
    for tank in TankId::ALL {
        let m = &summary.loops[tank.index()];
        println!("\nTank {}:", tank.number());
        print_metric("Mean |error|", m.mean_abs_error, "%");
        print_metric("Final error", m.steady_state_error, "%");
        print_metric("Max overshoot", m.max_overshoot, "%");
        print_metric("Settling (2%)", m.settling_time_2pct_s, "s");
        print_metric("Max command", m.max_command, "");
        print_metric("Saturated", m.saturation_pct_upper, "% of time");
    }
}

fn print_metric(label: &str, value: Option<f64>, unit: &str) {
    match value {
        Some(v) => println!("  {label:<14} {v:.3} {unit}"),
        None => println!("  {label:<14} n/a"),
    }
}

fn cmd_export_series(
    csv_path: &Path,
    tank: TankId,
    variable: Variable,
    output: Option<&Path>,
) -> AppResult<()> {
    let history = lf_results::load_csv(csv_path)?;
    let series = extract_loop_series(&history, tank, |s| variable.get(s));

    let mut csv = String::from("time_s,value\n");
    for (t, val) in &series {
        csv.push_str(&format!("{},{}\n", t, val));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            series.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        tokio::select! {
            _ = ctrl_c() => {},
            _ = terminate() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
    }
}

async fn ctrl_c() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(?err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(err) => {
            warn!(?err, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}
