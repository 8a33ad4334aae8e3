//! Mission-wide group: atmosphere, unit pass-throughs, weight build-up and range closure.

use sizing_model::{Constraint, ConstraintGroup, ModelError, Posynomial};

use super::segments::{Family, Phase, SegmentLayout};
use super::variables::MissionVariables;

/// Build the constraints that tie every segment together.
pub fn mission_group(
    vars: &MissionVariables,
    layout: &SegmentLayout,
) -> Result<ConstraintGroup, ModelError> {
    let nseg = layout.total();
    let mut group = ConstraintGroup::new("mission");

    for i in 0..nseg {
        group.add(Constraint::eq(
            format!("speed_of_sound[{i}]"),
            vars.a.at(i),
            (&vars.gamma * &vars.r * vars.t.at(i)).sqrt(),
        )?)?;
        group.add(Constraint::eq(
            format!("altitude_units[{i}]"),
            vars.hft.at(i),
            vars.h.at(i),
        )?)?;
        group.add(Constraint::eq(
            format!("time_units[{i}]"),
            vars.tmin.at(i),
            vars.thr.at(i),
        )?)?;
    }

    // weight build-up
    group.add(
        Constraint::le(
            "takeoff_weight",
            &vars.w_e + &vars.w_payload + &vars.w_ftotal,
            &vars.w_total,
        )?
        .tight(),
    )?;
    group.add(Constraint::eq("initial_weight", vars.w_start.at(0), &vars.w_total)?)?;
    group.add(
        Constraint::le(
            "landing_weight",
            &vars.w_e + &vars.w_payload,
            vars.w_end.at(nseg - 1),
        )?
        .tight(),
    )?;
    group.add(
        Constraint::ge(
            "total_fuel",
            &vars.w_ftotal,
            Posynomial::sum((0..nseg).map(|i| vars.w_fuel.at(i))),
        )?
        .tight(),
    )?;
    for i in 1..nseg {
        group.add(Constraint::eq(
            format!("weight_continuity[{i}]"),
            vars.w_start.at(i),
            vars.w_end.at(i - 1),
        )?)?;
    }
    for i in 0..nseg {
        group.add(
            Constraint::ge(
                format!("fuel_burn[{i}]"),
                vars.w_start.at(i),
                vars.w_end.at(i) + vars.w_fuel.at(i),
            )?
            .tight(),
        )?;
    }

    // range closure
    let climb_range = Posynomial::sum((0..vars.rng_climb.len()).map(|i| vars.rng_climb.at(i)));
    let cruise_range = Posynomial::sum((0..vars.rng_cruise.len()).map(|i| vars.rng_cruise.at(i)));
    group.add(
        Constraint::ge("total_range", climb_range + &cruise_range, &vars.req_rng)?
            .tight()
            .signomial(),
    )?;
    if !cruise_range.is_empty() {
        group.add(
            Constraint::ge("cruise_range", &vars.req_rng_cruise, cruise_range)?.tight(),
        )?;
    }

    // altitude schedule
    let climb1 = layout.range(Phase::Climb1);
    if let Some(last) = climb1.last() {
        group.add(Constraint::eq(
            "climb1_ceiling",
            vars.hft.at(last),
            &vars.alt10k,
        )?)?;
    }
    if let Some(top) = layout.last_family_slot(Family::Climb) {
        for k in layout.range(Phase::Cruise2) {
            group.add(Constraint::eq(
                format!("level_off[{k}]"),
                vars.hft.at(k),
                vars.hft.at(top),
            )?)?;
        }
    }

    Ok(group)
}
