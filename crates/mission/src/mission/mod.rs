//! Commercial mission assembly: lays out segments, declares the quantities, builds the phase
//! groups and links them into one model minimising take-off weight.

pub mod climb;
pub mod constraints;
pub mod cruise;
pub mod profile;
pub mod segments;
pub mod variables;

use sizing_config::MissionConfig;
use sizing_model::{Model, ModelError, Registry, Solution, SolveError, Solver};
use tracing::debug;

use self::profile::FlightProfile;
use self::segments::{Family, LayoutError, Phase, SegmentCounts, SegmentLayout};
use self::variables::MissionVariables;

/// Top-level mission assembly error.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("segment layout failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("model assembly failed: {0}")]
    Model(#[from] ModelError),
    #[error("phase '{phase}' is not modelled yet and must have zero segments (got {count})")]
    UnsupportedPhase { phase: &'static str, count: usize },
    #[error("phase '{phase}' needs at least one {required} segment")]
    MissingPhase {
        phase: &'static str,
        required: &'static str,
    },
    #[error("mission has no segments")]
    EmptyMission,
}

/// A linked commercial mission model and the layout it was built for.
#[derive(Debug, Clone)]
pub struct CommercialAircraft {
    name: String,
    layout: SegmentLayout,
    model: Model,
}

impl CommercialAircraft {
    /// Build the mission described by `config`.
    pub fn build(config: &MissionConfig) -> Result<Self, MissionError> {
        let counts = SegmentCounts::from_config(&config.segments);
        let layout = SegmentLayout::build(&counts)?;
        validate(&layout)?;

        let mut registry = Registry::new();
        let vars = MissionVariables::declare(&mut registry, &layout, config)?;

        let mut groups = vec![constraints::mission_group(&vars, &layout)?];
        for phase in [Phase::Climb1, Phase::Climb2] {
            if layout.count(phase) > 0 {
                groups.push(climb::climb_group(phase, &vars, &layout)?);
            }
        }
        groups.push(cruise::cruise_group(&registry, &vars, &layout, config)?);

        let objective = vars.w_total.clone();
        let model = Model::link(registry, objective, groups)?;
        debug!(
            mission = %config.name,
            segments = layout.total(),
            constraints = model.constraints().count(),
            "commercial mission assembled"
        );

        Ok(Self {
            name: config.name.clone(),
            layout,
            model,
        })
    }

    /// The 3/3/3 segment, 3000 mile reference mission.
    pub fn baseline() -> Result<Self, MissionError> {
        Self::build(&MissionConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Mutable access for substitutions and sweeps.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn solve(&self, solver: &dyn Solver) -> Result<Solution, SolveError> {
        self.model.solve(solver)
    }

    pub fn profile(&self, solution: &Solution) -> FlightProfile {
        FlightProfile::from_solution(&self.layout, solution)
    }
}

fn validate(layout: &SegmentLayout) -> Result<(), MissionError> {
    for phase in Phase::ALL {
        let count = layout.count(phase);
        if count > 0 && !phase.is_modelled() {
            return Err(MissionError::UnsupportedPhase {
                phase: phase.name(),
                count,
            });
        }
    }
    if layout.total() == 0 {
        return Err(MissionError::EmptyMission);
    }
    if layout.count(Phase::Cruise2) > 0 && layout.family_count(Family::Climb) == 0 {
        return Err(MissionError::MissingPhase {
            phase: Phase::Cruise2.name(),
            required: "climb",
        });
    }
    Ok(())
}
