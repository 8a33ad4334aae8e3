//! Per-segment flight profile extracted from a solved mission.

use serde::Serialize;
use sizing_model::Solution;

use super::segments::{Family, Phase, SegmentLayout};

/// One row of the profile table. Values are in the declared units of the mission quantities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub slot: usize,
    pub phase: Phase,
    pub altitude_ft: f64,
    pub speed_kts: f64,
    pub time_min: f64,
    pub elapsed_min: f64,
    pub range_miles: f64,
    pub fuel_lbf: f64,
    pub start_weight_lbf: f64,
    pub end_weight_lbf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightProfile {
    pub rows: Vec<SegmentRow>,
}

impl FlightProfile {
    /// Tabulate `solution` slot by slot. Elements missing from the solution come out as NaN.
    pub fn from_solution(layout: &SegmentLayout, solution: &Solution) -> Self {
        let hft = column(solution, "hft");
        let v = column(solution, "V");
        let tmin = column(solution, "tmin");
        let rng_climb = column(solution, "RngClimb");
        let rng_cruise = column(solution, "RngCruise");
        let w_fuel = column(solution, "W_fuel");
        let w_start = column(solution, "W_start");
        let w_end = column(solution, "W_end");

        let mut elapsed = 0.0;
        let mut rows = Vec::with_capacity(layout.total());
        for (phase, range) in layout.iter() {
            for slot in range {
                let time_min = pick(tmin, slot);
                elapsed += time_min;
                let range_miles = match (phase.family(), layout.family_index(slot)) {
                    (Some(Family::Climb), Some(c)) => pick(rng_climb, c),
                    (Some(Family::Cruise), Some(c)) => pick(rng_cruise, c),
                    _ => f64::NAN,
                };
                rows.push(SegmentRow {
                    slot,
                    phase,
                    altitude_ft: pick(hft, slot),
                    speed_kts: pick(v, slot),
                    time_min,
                    elapsed_min: elapsed,
                    range_miles,
                    fuel_lbf: pick(w_fuel, slot),
                    start_weight_lbf: pick(w_start, slot),
                    end_weight_lbf: pick(w_end, slot),
                });
            }
        }
        Self { rows }
    }

    pub fn total_fuel_lbf(&self) -> f64 {
        self.rows.iter().map(|r| r.fuel_lbf).sum()
    }

    pub fn total_range_miles(&self) -> f64 {
        self.rows.iter().map(|r| r.range_miles).sum()
    }

    pub fn total_time_min(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.elapsed_min)
    }
}

fn column<'a>(solution: &'a Solution, name: &str) -> &'a [f64] {
    solution.vector(name).unwrap_or(&[])
}

fn pick(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(f64::NAN)
}
