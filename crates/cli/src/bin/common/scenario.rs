//! Mission loading and logging setup shared by the command-line tools.

use std::path::Path;

use anyhow::Context;
use commercial_sizing::config::{MissionConfig, load_missions};
use commercial_sizing::mission::CommercialAircraft;
use commercial_sizing::mission::scenario;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the mission definition: the named (or first) entry of `config`, or the built-in
/// baseline when no file is given. `range_miles` overrides the required range.
pub fn load(
    config: Option<&Path>,
    mission: Option<&str>,
    range_miles: Option<f64>,
) -> anyhow::Result<CommercialAircraft> {
    let mut configs = match config {
        Some(path) => load_missions(path)
            .with_context(|| format!("loading missions from {}", path.display()))?,
        None => vec![MissionConfig::default()],
    };
    if let Some(range) = range_miles {
        for cfg in &mut configs {
            cfg.profile.range_miles = range;
        }
    }
    Ok(scenario::select(&configs, mission)?)
}
