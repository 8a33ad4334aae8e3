//! Cruise2: level flight at the cruise altitude, fuel burn from the Breguet range relation.
//!
//! The group also carries the fixed operating point of the whole profile (cruise TSFC, L/D and
//! speed, climb density, weights and temperature) as explicit overrides, and pins the climb
//! TSFC to `c1`.

use sizing_config::MissionConfig;
use sizing_model::{
    Constraint, ConstraintGroup, ModelError, Posynomial, Registry, te_exp_minus1,
};

use super::segments::{Phase, SegmentLayout};
use super::variables::MissionVariables;

/// Terms of the `exp(z) - 1` expansion used for the Breguet fuel fraction.
const BREGUET_TERMS: usize = 3;

const CLIMB_PHASES: [Phase; 2] = [Phase::Climb1, Phase::Climb2];

/// Build the cruise2 group. It is built even when cruise2 is empty so that the shared overrides
/// still apply.
pub fn cruise_group(
    registry: &Registry,
    vars: &MissionVariables,
    layout: &SegmentLayout,
    config: &MissionConfig,
) -> Result<ConstraintGroup, ModelError> {
    let nseg = layout.total() as f64;
    let offset = layout.family_offset(Phase::Cruise2);
    let mut group = ConstraintGroup::new(Phase::Cruise2.name());

    for (local, i) in layout.range(Phase::Cruise2).enumerate() {
        let c = offset + local;
        let z = vars.z_bre.at(i);
        let v = vars.v.at(i);

        group.add(Constraint::eq(
            format!("altitude[{i}]"),
            vars.hft.at(i),
            &vars.alt_cruise,
        )?)?;
        group.add(
            Constraint::ge(
                format!("fuel_fraction[{i}]"),
                vars.w_fuel.at(i) / vars.w_end.at(i),
                te_exp_minus1(&z, BREGUET_TERMS),
            )?
            .tight(),
        )?;
        group.add(
            Constraint::le(
                format!("breguet_range[{i}]"),
                vars.rng_cruise.at(c),
                &z * vars.ld.at(i) * &v / (vars.tsfc.at(i) * &vars.g),
            )?
            .tight(),
        )?;
        group.add(Constraint::eq(
            format!("cruise_time[{i}]"),
            vars.thr.at(i) * &v,
            vars.rng_cruise.at(c),
        )?)?;

        // each stage must keep pace with an even split of the cruise range
        let flown = Posynomial::sum((0..=c).map(|j| vars.rng_cruise.at(j)));
        let required = &vars.req_rng_cruise * ((c + 1) as f64 / nseg);
        let staged = Constraint::ge(format!("staged_range[{i}]"), flown, required)?;
        group.add(if c > 0 { staged.signomial() } else { staged })?;
    }

    let cruise = &config.cruise;
    for i in layout.range(Phase::Cruise2) {
        group.fix(registry, "TSFC", Some(i), cruise.tsfc, "lb/lbf/hr")?;
        group.fix(registry, "L/D", Some(i), cruise.lift_to_drag, "-")?;
        group.fix(registry, "V", Some(i), cruise.speed_kts, "knots")?;
    }
    for phase in CLIMB_PHASES {
        for i in layout.range(phase) {
            group.fix(
                registry,
                r"\rho",
                Some(i),
                config.atmosphere.climb_density_kg_m3,
                "kg/m^3",
            )?;
            group.add(Constraint::eq(
                format!("climb_tsfc[{i}]"),
                vars.tsfc.at(i),
                &vars.c1,
            )?)?;
        }
    }
    group.fix(registry, "W_e", None, config.aircraft.empty_weight_n, "N")?;
    group.fix(registry, "W_payload", None, config.aircraft.payload_weight_n, "N")?;
    for i in 0..layout.total() {
        group.fix(registry, "T", Some(i), config.atmosphere.temperature_k, "K")?;
    }

    Ok(group)
}
