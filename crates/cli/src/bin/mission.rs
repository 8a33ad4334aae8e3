use std::path::PathBuf;

use clap::Parser;
use commercial_sizing::export::{self, solution as export_solution, table};
use commercial_sizing::model::Solution;
use commercial_sizing::solver::{GpSolver, SolverOptions};
use tracing::info;

#[path = "common/scenario.rs"]
mod scenario;

/// Size a commercial aircraft for one mission and print its flight profile.
#[derive(Parser, Debug)]
#[command(author, version, about = "Commercial mission sizing (GP/SP)")]
struct Cli {
    /// Mission file or directory of mission files (defaults to the built-in baseline)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mission name within the configuration (case-insensitive)
    #[arg(long)]
    mission: Option<String>,

    /// Override the required range in statute miles
    #[arg(long)]
    range: Option<f64>,

    /// Write the full solution as JSON (use '-' for stdout)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the solution as CSV (use '-' for stdout)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the per-segment profile as CSV (use '-' for stdout)
    #[arg(long)]
    profile_csv: Option<PathBuf>,

    /// Number of constraint sensitivities to print
    #[arg(long, default_value_t = 5)]
    sensitivities: usize,

    /// Barrier duality-gap tolerance
    #[arg(long, default_value_t = 1e-7)]
    tolerance: f64,
}

fn main() -> anyhow::Result<()> {
    scenario::init_tracing();
    let cli = Cli::parse();

    let aircraft = scenario::load(cli.config.as_deref(), cli.mission.as_deref(), cli.range)?;
    let solver = GpSolver::new(SolverOptions {
        tolerance: cli.tolerance,
        ..SolverOptions::default()
    });
    info!(mission = aircraft.name(), "solving");
    let solution = aircraft.solve(&solver)?;
    let profile = aircraft.profile(&solution);

    println!("=== Mission Profile ===");
    println!("Mission        : {}", aircraft.name());
    println!(
        "Weights        : total = {:.0} lbf, fuel = {:.0} lbf, empty = {:.0} lbf, payload = {:.0} lbf",
        scalar(&solution, "W_total"),
        scalar(&solution, "W_ftotal"),
        scalar(&solution, "W_e"),
        scalar(&solution, "W_payload"),
    );
    println!(
        "Range          : required = {:.0} mi, flown = {:.1} mi, block time = {:.1} min",
        scalar(&solution, "ReqRng"),
        profile.total_range_miles(),
        profile.total_time_min(),
    );
    println!(
        "Solver         : {} approximation(s), cost = {:.1} N",
        solution.iterations, solution.cost
    );
    println!();
    println!(
        "{:>4} {:<8} {:>9} {:>7} {:>8} {:>9} {:>9} {:>11}",
        "seg", "phase", "alt [ft]", "V [kt]", "t [min]", "rng [mi]", "fuel [lbf]", "W_end [lbf]"
    );
    for row in &profile.rows {
        println!(
            "{:>4} {:<8} {:>9.0} {:>7.1} {:>8.2} {:>9.1} {:>9.0} {:>11.0}",
            row.slot,
            row.phase.name(),
            row.altitude_ft,
            row.speed_kts,
            row.time_min,
            row.range_miles,
            row.fuel_lbf,
            row.end_weight_lbf,
        );
    }

    if cli.sensitivities > 0 && !solution.sensitivities.is_empty() {
        let mut duals: Vec<(&String, &f64)> = solution.sensitivities.iter().collect();
        duals.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        println!();
        println!("Sensitivities  :");
        for (name, value) in duals.into_iter().take(cli.sensitivities) {
            println!("  {name:<32} {value:>10.4}");
        }
    }
    for warning in &solution.warnings {
        eprintln!("warning: {warning}");
    }

    if let Some(path) = &cli.json {
        let mut writer = export::writer_for_path(path)?;
        export_solution::write_json(&mut writer, &solution)?;
    }
    if let Some(path) = &cli.csv {
        let mut writer = export::writer_for_path(path)?;
        export_solution::write_csv(&mut writer, &solution)?;
    }
    if let Some(path) = &cli.profile_csv {
        let mut writer = export::writer_for_path(path)?;
        table::write_rows(&mut writer, &profile.rows)?;
    }

    Ok(())
}

fn scalar(solution: &Solution, name: &str) -> f64 {
    solution.scalar(name).unwrap_or(f64::NAN)
}
