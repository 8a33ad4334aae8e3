//! Climb phases: thrust-limited climb at fixed thrust and climb TSFC.
//!
//! Climb1 runs under the 250 kt limit up to 10,000 ft, climb2 carries on to the cruise altitude.
//! Both use the same per-segment relations; only the speed ceiling differs.

use sizing_model::{Constraint, ConstraintGroup, ModelError, Monomial};

use super::segments::{Phase, SegmentLayout};
use super::variables::MissionVariables;

/// Build the constraint group of one climb phase. An empty phase yields an empty group.
pub fn climb_group(
    phase: Phase,
    vars: &MissionVariables,
    layout: &SegmentLayout,
) -> Result<ConstraintGroup, ModelError> {
    let speed_limit = match phase {
        Phase::Climb1 => &vars.climbspeed,
        _ => &vars.climbspeed2,
    };
    let offset = layout.family_offset(phase);
    let mut group = ConstraintGroup::new(phase.name());

    for (local, i) in layout.range(phase).enumerate() {
        let c = offset + local;
        let v = vars.v.at(i);
        let w = vars.w_start.at(i);
        let rho = vars.rho.at(i);
        let rc = vars.rc.at(i);
        let thr = vars.thr.at(i);
        let theta = vars.theta.at(i);

        group.add(Constraint::le(format!("speed_limit[{i}]"), &v, speed_limit)?)?;
        group.add(Constraint::ge(format!("stall[{i}]"), &v, &vars.v_stall)?)?;

        // excess power over weight, parabolic drag polar
        let parasite = 0.5 * (v.powf(3.0) * &rho * &vars.s * &vars.cd0 / &w);
        let induced = 2.0 * (&vars.k * &w / (&vars.s * &rho * &v));
        group.add(
            Constraint::le(
                format!("climb_rate[{i}]"),
                &rc + parasite + induced,
                &v * &vars.thrust / &w,
            )?
            .tight(),
        )?;
        group.add(Constraint::eq(format!("climb_angle[{i}]"), &theta * &v, &rc)?)?;
        group.add(Constraint::eq(
            format!("altitude_gain[{i}]"),
            vars.dhft.at(c),
            vars.tmin.at(i) * &rc,
        )?)?;

        // small-angle ground distance
        group.add(
            Constraint::le(
                format!("climb_range[{i}]"),
                vars.rng_climb.at(c) + 0.5 * (&thr * &v * theta.powf(2.0)),
                &thr * &v,
            )?
            .tight(),
        )?;
        group.add(Constraint::eq(
            format!("climb_fuel[{i}]"),
            vars.w_fuel.at(i),
            &vars.g * vars.tsfc.at(i) * &thr * &vars.thrust,
        )?)?;

        let anchor: Monomial = if i == 0 {
            vars.alt1k.clone()
        } else {
            vars.hft.at(i - 1)
        };
        group.add(
            Constraint::le(format!("altitude[{i}]"), vars.hft.at(i), anchor + vars.dhft.at(c))?
                .tight()
                .signomial(),
        )?;
    }

    Ok(group)
}
