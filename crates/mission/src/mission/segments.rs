//! Segment index builder: contiguous slot ranges for every flight phase in fixed global order.

use std::ops::Range;

use serde::Serialize;
use sizing_config::SegmentsConfig;
use thiserror::Error;

/// Flight phases in the order their segments are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Takeoff,
    Climb1,
    Transition,
    Climb2,
    Cruise1,
    CruiseClimb,
    Cruise2,
    Descent,
    Landing,
    ReserveClimb,
    ReserveDescent,
    ReserveLanding,
    ReserveHold,
}

/// Phases whose segments share one family-indexed vector (`RngClimb`, `dhft`, `RngCruise`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Climb,
    Cruise,
}

impl Phase {
    pub const ALL: [Phase; 13] = [
        Phase::Takeoff,
        Phase::Climb1,
        Phase::Transition,
        Phase::Climb2,
        Phase::Cruise1,
        Phase::CruiseClimb,
        Phase::Cruise2,
        Phase::Descent,
        Phase::Landing,
        Phase::ReserveClimb,
        Phase::ReserveDescent,
        Phase::ReserveLanding,
        Phase::ReserveHold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Takeoff => "takeoff",
            Phase::Climb1 => "climb1",
            Phase::Transition => "transition",
            Phase::Climb2 => "climb2",
            Phase::Cruise1 => "cruise1",
            Phase::CruiseClimb => "cruise_climb",
            Phase::Cruise2 => "cruise2",
            Phase::Descent => "descent",
            Phase::Landing => "landing",
            Phase::ReserveClimb => "reserve_climb",
            Phase::ReserveDescent => "reserve_descent",
            Phase::ReserveLanding => "reserve_landing",
            Phase::ReserveHold => "reserve_hold",
        }
    }

    pub fn family(self) -> Option<Family> {
        match self {
            Phase::Climb1 | Phase::Climb2 | Phase::CruiseClimb => Some(Family::Climb),
            Phase::Cruise1 | Phase::Cruise2 => Some(Family::Cruise),
            _ => None,
        }
    }

    /// Phases that carry a constraint group; every other phase must stay empty.
    pub fn is_modelled(self) -> bool {
        matches!(self, Phase::Climb1 | Phase::Climb2 | Phase::Cruise2)
    }
}

/// Requested number of segments per phase. Counts are signed so that bad input is reported
/// instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentCounts {
    pub takeoff: i64,
    pub climb1: i64,
    pub transition: i64,
    pub climb2: i64,
    pub cruise1: i64,
    pub cruise_climb: i64,
    pub cruise2: i64,
    pub descent: i64,
    pub landing: i64,
    pub reserve_climb: i64,
    pub reserve_descent: i64,
    pub reserve_landing: i64,
    pub reserve_hold: i64,
}

impl SegmentCounts {
    /// Three climb-below-10k, three climb and three cruise segments.
    pub fn baseline() -> Self {
        Self {
            climb1: 3,
            climb2: 3,
            cruise2: 3,
            ..Self::default()
        }
    }

    pub fn from_config(config: &SegmentsConfig) -> Self {
        Self {
            takeoff: config.takeoff,
            climb1: config.climb1,
            transition: config.transition,
            climb2: config.climb2,
            cruise1: config.cruise1,
            cruise_climb: config.cruise_climb,
            cruise2: config.cruise2,
            descent: config.descent,
            landing: config.landing,
            reserve_climb: config.reserve_climb,
            reserve_descent: config.reserve_descent,
            reserve_landing: config.reserve_landing,
            reserve_hold: config.reserve_hold,
        }
    }

    pub fn get(&self, phase: Phase) -> i64 {
        match phase {
            Phase::Takeoff => self.takeoff,
            Phase::Climb1 => self.climb1,
            Phase::Transition => self.transition,
            Phase::Climb2 => self.climb2,
            Phase::Cruise1 => self.cruise1,
            Phase::CruiseClimb => self.cruise_climb,
            Phase::Cruise2 => self.cruise2,
            Phase::Descent => self.descent,
            Phase::Landing => self.landing,
            Phase::ReserveClimb => self.reserve_climb,
            Phase::ReserveDescent => self.reserve_descent,
            Phase::ReserveLanding => self.reserve_landing,
            Phase::ReserveHold => self.reserve_hold,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("phase '{phase}' has a negative segment count ({count})")]
    NegativeCount { phase: &'static str, count: i64 },
}

/// Slot ranges per phase. Ranges are disjoint, ordered, and together cover `0..total()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLayout {
    ranges: Vec<(Phase, Range<usize>)>,
}

impl SegmentLayout {
    pub fn build(counts: &SegmentCounts) -> Result<Self, LayoutError> {
        let mut ranges = Vec::with_capacity(Phase::ALL.len());
        let mut next = 0usize;
        for phase in Phase::ALL {
            let count = counts.get(phase);
            let len = usize::try_from(count).map_err(|_| LayoutError::NegativeCount {
                phase: phase.name(),
                count,
            })?;
            ranges.push((phase, next..next + len));
            next += len;
        }
        Ok(Self { ranges })
    }

    pub fn range(&self, phase: Phase) -> Range<usize> {
        self.ranges
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, r)| r.clone())
            .unwrap_or(0..0)
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.range(phase).len()
    }

    /// `Nseg`
    pub fn total(&self) -> usize {
        self.ranges.last().map_or(0, |(_, r)| r.end)
    }

    /// `Nclimb` or `Ncruise`.
    pub fn family_count(&self, family: Family) -> usize {
        self.ranges
            .iter()
            .filter(|(p, _)| p.family() == Some(family))
            .map(|(_, r)| r.len())
            .sum()
    }

    pub fn phase_of(&self, slot: usize) -> Option<Phase> {
        self.ranges
            .iter()
            .find(|(_, r)| r.contains(&slot))
            .map(|(p, _)| *p)
    }

    /// Position of `slot` within its phase.
    pub fn local_index(&self, slot: usize) -> Option<usize> {
        let phase = self.phase_of(slot)?;
        Some(slot - self.range(phase).start)
    }

    /// Number of family elements laid out before `phase`; zero for phases outside a family.
    pub fn family_offset(&self, phase: Phase) -> usize {
        let Some(family) = phase.family() else {
            return 0;
        };
        self.ranges
            .iter()
            .take_while(|(p, _)| *p != phase)
            .filter(|(p, _)| p.family() == Some(family))
            .map(|(_, r)| r.len())
            .sum()
    }

    /// Position of `slot` within its family vector, counting earlier family phases first.
    pub fn family_index(&self, slot: usize) -> Option<usize> {
        let phase = self.phase_of(slot)?;
        phase.family()?;
        Some(self.family_offset(phase) + self.local_index(slot)?)
    }

    /// Last slot of the last non-empty phase of `family`.
    pub fn last_family_slot(&self, family: Family) -> Option<usize> {
        self.ranges
            .iter()
            .filter(|(p, r)| p.family() == Some(family) && !r.is_empty())
            .map(|(_, r)| r.end - 1)
            .max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, Range<usize>)> + '_ {
        self.ranges.iter().map(|(p, r)| (*p, r.clone()))
    }
}
