use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};

use wlan_lab_abstract::{HarnessPlan, SimulationEngine};
use wlan_lab_harness::{Experiment, HarnessReport, PlotExporter, SweepReport};
use wlan_lab_loader::EngineLoader;
use wlan_lab_loader::spec::engine_by_name;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Sweep {
    /// Average throughput against backbone data rate.
    Backbone,
    /// Throughput against number of stations, with and without RTS/CTS.
    Stations,
    /// Non-streamer throughput against a streamer's data rate.
    Streamer,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Wireless LAN throughput sweeps")]
struct Args {
    /// TOML file overriding the default sweep parameters.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Directory receiving the gnuplot command files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Sweeps to run, in order. Runs all three when omitted.
    #[arg(long, value_enum)]
    sweep: Vec<Sweep>,

    /// Simulation engine: 'fluid' or 'process'.
    #[arg(long, default_value = "fluid")]
    engine: String,

    /// Program run once per trial by the 'process' engine.
    #[arg(long)]
    engine_program: Option<PathBuf>,

    /// Extra argument passed to the engine program (repeatable).
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Write a JSON trace of every completed sweep.
    #[arg(long)]
    trace_out: Option<PathBuf>,

    /// Log every flow and per-station throughput.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn sweeps(&self) -> Vec<Sweep> {
        if self.sweep.is_empty() {
            vec![Sweep::Backbone, Sweep::Stations, Sweep::Streamer]
        } else {
            self.sweep.clone()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("wlan-lab starting…");

    let plan = match &args.plan {
        Some(path) => load_plan(path)?,
        None => HarnessPlan::default(),
    };

    let loader = EngineLoader::builder().build()?;
    let descriptor = engine_by_name(
        &args.engine,
        args.engine_program.clone(),
        args.engine_args.clone(),
    )?;
    let mut engine = loader.load(descriptor)?;
    let exporter = PlotExporter::new(&args.out_dir);

    let mut report = HarnessReport::default();
    for sweep in args.sweeps() {
        let experiment = build_experiment(sweep, &plan)?;
        match run_sweep(&experiment, engine.as_mut(), &exporter) {
            Ok(sweep_report) => report.sweeps.push(sweep_report),
            Err(err) => {
                error!("Sweep {} aborted; no dataset written", experiment.name);
                if let Some(trace_path) = &args.trace_out {
                    write_trace(trace_path, &report)?;
                }
                return Err(err);
            }
        }
    }

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }
    info!("Finished {} sweeps.", report.sweeps.len());
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn build_experiment(sweep: Sweep, plan: &HarnessPlan) -> Result<Experiment> {
    let experiment = match sweep {
        Sweep::Backbone => Experiment::backbone(&plan.backbone_sweep())
            .context("Invalid backbone sweep in plan")?,
        Sweep::Stations => Experiment::stations(&plan.station_sweep()),
        Sweep::Streamer => Experiment::streamer(&plan.streamer_sweep()),
    };
    Ok(experiment)
}

fn run_sweep(
    experiment: &Experiment,
    engine: &mut dyn SimulationEngine,
    exporter: &PlotExporter,
) -> Result<SweepReport> {
    let report = experiment
        .run(engine)
        .with_context(|| format!("Sweep {} failed", experiment.name))?;
    exporter.write(&report.plot).with_context(|| {
        format!(
            "Failed to write plot {} into {}",
            report.plot.command_file(),
            exporter.out_dir().display()
        )
    })?;
    info!(
        "Sweep {} complete: {} trials, {} points",
        experiment.name,
        report.trials.len(),
        report.point_count()
    );
    Ok(report)
}

fn load_plan(path: &Path) -> Result<HarnessPlan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    let plan: HarnessPlan = toml::from_str(&content).context("Failed to parse plan file")?;
    Ok(plan)
}

fn write_trace(path: &Path, report: &HarnessReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize sweep trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}
