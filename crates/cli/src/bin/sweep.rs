use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Parser;
use commercial_sizing::export::{self, sweep as export_sweep};
use commercial_sizing::model::Sweep;
use commercial_sizing::solver::GpSolver;

#[path = "common/scenario.rs"]
mod scenario;

/// Re-solve a mission while sweeping one (or two) fixed quantities and write the results as CSV.
#[derive(Parser, Debug)]
#[command(author, version, about = "Parameter sweeps over the commercial mission")]
struct Cli {
    /// Mission file or directory of mission files (defaults to the built-in baseline)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mission name within the configuration (case-insensitive)
    #[arg(long)]
    mission: Option<String>,

    /// Quantity to sweep
    #[arg(long, default_value = "ReqRng")]
    quantity: String,

    /// Element index for vector quantities
    #[arg(long)]
    index: Option<usize>,

    /// Unit of the swept values
    #[arg(long, default_value = "miles")]
    unit: String,

    /// First swept value
    #[arg(long)]
    start: f64,

    /// Last swept value
    #[arg(long)]
    end: f64,

    /// Number of evenly spaced values
    #[arg(long, default_value_t = 5)]
    count: usize,

    /// Second quantity; when given the sweep becomes a contour over both
    #[arg(long, requires_all = ["y_start", "y_end"])]
    y_quantity: Option<String>,

    #[arg(long, default_value = "-")]
    y_unit: String,

    #[arg(long)]
    y_start: Option<f64>,

    #[arg(long)]
    y_end: Option<f64>,

    #[arg(long, default_value_t = 5)]
    y_count: usize,

    /// Scalar outputs to record (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "W_total,W_ftotal")]
    outputs: Vec<String>,

    /// Stop at the first failed point instead of recording a gap
    #[arg(long, default_value_t = false)]
    abort_on_failure: bool,

    /// Output CSV file (use '-' for stdout)
    #[arg(long, default_value = "-")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    scenario::init_tracing();
    let cli = Cli::parse();
    if cli.count == 0 {
        bail!("--count must be at least 1");
    }

    let mut aircraft = scenario::load(cli.config.as_deref(), cli.mission.as_deref(), None)?;
    let solver = GpSolver::default();
    let x = Sweep {
        index: cli.index,
        ..Sweep::new(
            cli.quantity.as_str(),
            cli.unit.as_str(),
            Sweep::linspace(cli.start, cli.end, cli.count),
        )
        .skip_failures(!cli.abort_on_failure)
    };

    let mut writer = export::writer_for_path(&cli.output)?;
    match &cli.y_quantity {
        Some(y_quantity) => {
            let (y_start, y_end) = cli
                .y_start
                .zip(cli.y_end)
                .ok_or_else(|| anyhow!("--y-start and --y-end are required for a contour"))?;
            let y = Sweep::new(
                y_quantity.as_str(),
                cli.y_unit.as_str(),
                Sweep::linspace(y_start, y_end, cli.y_count),
            )
            .skip_failures(!cli.abort_on_failure);
            let output = cli
                .outputs
                .first()
                .ok_or_else(|| anyhow!("at least one output is required"))?;
            let result = aircraft.model_mut().contour(&x, &y, &solver)?;
            export_sweep::write_contour(&mut writer, &result, output)?;
        }
        None => {
            let result = aircraft.model_mut().sweep(&x, &solver)?;
            let outputs: Vec<&str> = cli.outputs.iter().map(String::as_str).collect();
            export_sweep::write_sweep(&mut writer, &result, &outputs)?;
            let gaps = result.gaps();
            if !gaps.is_empty() {
                eprintln!("{} of {} points failed: {:?}", gaps.len(), result.points.len(), gaps);
            }
        }
    }

    Ok(())
}
