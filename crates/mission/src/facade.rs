//! Re-exported APIs for consumers of the mission crate.

pub use crate::mission::profile::{FlightProfile, SegmentRow};
pub use crate::mission::segments::{Family, LayoutError, Phase, SegmentCounts, SegmentLayout};
pub use crate::mission::variables::MissionVariables;
pub use crate::mission::{CommercialAircraft, MissionError};

pub mod scenario {
    use sizing_config::{ConfigError, MissionConfig};
    use thiserror::Error;

    use crate::mission::{CommercialAircraft, MissionError};

    /// Errors surfaced when loading and assembling missions from files.
    #[derive(Debug, Error)]
    pub enum ScenarioError {
        #[error("configuration error: {0}")]
        Config(#[from] ConfigError),
        #[error("mission '{name}' could not be assembled: {source}")]
        Mission {
            name: String,
            #[source]
            source: MissionError,
        },
        #[error("mission '{0}' not found")]
        NotFound(String),
    }

    /// Assemble one mission, tagging failures with its name.
    pub fn from_config(config: &MissionConfig) -> Result<CommercialAircraft, ScenarioError> {
        CommercialAircraft::build(config).map_err(|source| ScenarioError::Mission {
            name: config.name.clone(),
            source,
        })
    }

    /// Select a mission by optional name (case-insensitive), defaulting to the first entry.
    pub fn select(
        configs: &[MissionConfig],
        requested: Option<&str>,
    ) -> Result<CommercialAircraft, ScenarioError> {
        let chosen = match requested {
            Some(name) => configs
                .iter()
                .find(|cfg| cfg.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| ScenarioError::NotFound(name.to_string()))?,
            None => configs
                .first()
                .ok_or_else(|| ScenarioError::NotFound("<any>".to_string()))?,
        };
        from_config(chosen)
    }

    /// Load missions from a file or directory and assemble the requested one.
    pub fn load(
        path: &std::path::Path,
        requested: Option<&str>,
    ) -> Result<CommercialAircraft, ScenarioError> {
        let configs = sizing_config::load_missions(path)?;
        select(&configs, requested)
    }
}
