use approx::assert_relative_eq;
use sizing_config::MissionConfig;
use sizing_core::te_exp_minus1;
use sizing_core::units::lbf_to_n;
use sizing_mission::model::{SolveError, Solution, Sweep};
use sizing_mission::{CommercialAircraft, MissionError, Phase};
use sizing_solver::GpSolver;

fn baseline_solution() -> (CommercialAircraft, Solution) {
    let aircraft = CommercialAircraft::baseline().expect("baseline assembles");
    let solution = aircraft
        .solve(&GpSolver::default())
        .expect("baseline mission is feasible");
    (aircraft, solution)
}

#[test]
fn baseline_mission_is_feasible() {
    let (_, solution) = baseline_solution();
    let total = solution.scalar("W_total").unwrap();
    let fuel = solution.scalar("W_ftotal").unwrap();
    assert!(fuel > 0.0, "fuel weight {fuel}");
    assert!(fuel < total, "fuel {fuel} exceeds total {total}");
    assert_relative_eq!(solution.cost, lbf_to_n(total), max_relative = 1e-6);
}

#[test]
fn climb1_ends_at_ten_thousand_feet() {
    let (aircraft, solution) = baseline_solution();
    let last = aircraft.layout().range(Phase::Climb1).end - 1;
    let hft = solution.vector("hft").unwrap();
    assert_relative_eq!(hft[last], 10_000.0, max_relative = 1e-6);
    for k in aircraft.layout().range(Phase::Cruise2) {
        assert_relative_eq!(hft[k], 35_000.0, max_relative = 1e-6);
    }
}

#[test]
fn segment_weights_are_continuous() {
    let (_, solution) = baseline_solution();
    let start = solution.vector("W_start").unwrap();
    let end = solution.vector("W_end").unwrap();
    assert_relative_eq!(start[0], solution.scalar("W_total").unwrap(), max_relative = 1e-6);
    for i in 1..start.len() {
        assert_relative_eq!(start[i], end[i - 1], max_relative = 1e-6);
        assert!(end[i] < start[i], "segment {i} gained weight");
    }
}

#[test]
fn cruise_fuel_follows_the_breguet_series() {
    let (aircraft, solution) = baseline_solution();
    let fuel = solution.vector("W_fuel").unwrap();
    let end = solution.vector("W_end").unwrap();
    let z = solution.vector("z_bre").unwrap();
    for k in aircraft.layout().range(Phase::Cruise2) {
        assert!(z[k] > 0.0);
        assert_relative_eq!(fuel[k] / end[k], te_exp_minus1(z[k], 3), max_relative = 1e-3);
    }
}

#[test]
fn staged_cruise_range_keeps_pace() {
    let (aircraft, solution) = baseline_solution();
    let nseg = aircraft.layout().total() as f64;
    let required = solution.scalar("ReqRngCruise").unwrap();
    let legs = solution.vector("RngCruise").unwrap();
    let mut flown = 0.0;
    for (k, leg) in legs.iter().enumerate() {
        flown += leg;
        assert!(
            flown >= (k + 1) as f64 * required / nseg * (1.0 - 1e-4),
            "stage {k}: {flown} < {}",
            (k + 1) as f64 * required / nseg
        );
    }
}

#[test]
fn profile_closes_the_required_range() {
    let (aircraft, solution) = baseline_solution();
    let profile = aircraft.profile(&solution);
    assert_eq!(profile.rows.len(), 9);
    assert_relative_eq!(profile.total_range_miles(), 3_000.0, max_relative = 1e-3);
    assert_relative_eq!(
        profile.total_fuel_lbf(),
        solution.scalar("W_ftotal").unwrap(),
        max_relative = 1e-3
    );
    assert!(profile.total_time_min() > 0.0);
}

#[test]
fn excessive_range_is_reported_infeasible() {
    let mut config = MissionConfig::default();
    config.profile.range_miles = 50_000.0;
    let aircraft = CommercialAircraft::build(&config).expect("assembles");
    match aircraft.solve(&GpSolver::default()) {
        Err(SolveError::Infeasible { binding }) => {
            assert!(!binding.is_empty());
            assert!(
                binding
                    .iter()
                    .all(|name| name == "mission.total_range"
                        || name.starts_with("cruise2.staged_range[")),
                "{binding:?}"
            );
        }
        other => panic!("expected infeasibility, got {other:?}"),
    }
}

#[test]
fn repeated_solves_agree() {
    let (aircraft, first) = baseline_solution();
    let second = aircraft.solve(&GpSolver::default()).unwrap();
    assert_relative_eq!(first.cost, second.cost, max_relative = 1e-12);
}

#[test]
fn sweep_restores_the_user_layer() {
    let mut aircraft = CommercialAircraft::baseline().unwrap();
    aircraft
        .model_mut()
        .substitute("W_payload", None, 380_000.0, "N")
        .unwrap();
    let before = aircraft.model().substitutions();

    let sweep = Sweep::new("W_payload", "N", vec![350_000.0, 420_000.0]).skip_failures(true);
    let result = aircraft
        .model_mut()
        .sweep(&sweep, &GpSolver::default())
        .unwrap();
    assert_eq!(result.points.len(), 2);
    assert!(result.gaps().is_empty(), "gaps: {:?}", result.gaps());
    let series = result.series("W_total");
    let light = series[0].1.expect("light payload solved");
    let heavy = series[1].1.expect("heavy payload solved");
    assert!(light < heavy, "heavier payload must cost more: {light} vs {heavy}");

    assert_eq!(aircraft.model().substitutions(), before);
}

#[test]
fn aborted_sweep_restores_the_user_layer() {
    let mut aircraft = CommercialAircraft::baseline().unwrap();
    aircraft
        .model_mut()
        .substitute("ReqRng", None, 2_500.0, "miles")
        .unwrap();
    let before = aircraft.model().substitutions();

    let sweep = Sweep::new("ReqRng", "miles", vec![3_000.0, 50_000.0, 2_000.0]);
    let err = aircraft
        .model_mut()
        .sweep(&sweep, &GpSolver::default())
        .unwrap_err();
    assert!(matches!(err, SolveError::Infeasible { .. }), "{err:?}");

    assert_eq!(aircraft.model().substitutions(), before);
    let key = aircraft.model().registry().key("ReqRng", None).unwrap();
    assert_relative_eq!(
        aircraft.model().user_substitution(key).unwrap(),
        2_500.0 * 1_609.344,
        max_relative = 1e-12
    );
}

#[test]
fn user_substitution_overrides_group_defaults() {
    let (_, reference) = baseline_solution();
    let mut aircraft = CommercialAircraft::baseline().unwrap();
    aircraft
        .model_mut()
        .substitute("W_payload", None, 300_000.0, "N")
        .unwrap();
    let lighter = aircraft.solve(&GpSolver::default()).unwrap();
    assert!(lighter.cost < reference.cost);
}

#[test]
fn unmodelled_phases_must_be_empty() {
    let mut config = MissionConfig::default();
    config.segments.descent = 2;
    let err = CommercialAircraft::build(&config).unwrap_err();
    assert!(matches!(
        err,
        MissionError::UnsupportedPhase {
            phase: "descent",
            count: 2
        }
    ));
}

#[test]
fn cruise_needs_a_climb() {
    let mut config = MissionConfig::default();
    config.segments.climb1 = 0;
    config.segments.climb2 = 0;
    let err = CommercialAircraft::build(&config).unwrap_err();
    assert!(matches!(err, MissionError::MissingPhase { .. }));
}

#[test]
fn empty_and_negative_layouts_are_rejected() {
    let mut config = MissionConfig::default();
    config.segments.climb1 = 0;
    config.segments.climb2 = 0;
    config.segments.cruise2 = 0;
    assert!(matches!(
        CommercialAircraft::build(&config).unwrap_err(),
        MissionError::EmptyMission
    ));

    config.segments.cruise2 = -3;
    assert!(matches!(
        CommercialAircraft::build(&config).unwrap_err(),
        MissionError::Layout(_)
    ));
}

#[test]
fn constraint_names_carry_group_and_slot() {
    let aircraft = CommercialAircraft::baseline().unwrap();
    let names: Vec<&str> = aircraft.model().constraints().map(|c| c.name()).collect();
    for expected in [
        "mission.total_range",
        "mission.climb1_ceiling",
        "climb1.climb_rate[0]",
        "climb2.altitude[5]",
        "cruise2.staged_range[8]",
        "cruise2.climb_tsfc[3]",
    ] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert_eq!(
        aircraft
            .model()
            .registry()
            .lookup("hft")
            .unwrap()
            .1
            .axis_label(),
        "Altitude [feet]"
    );
}
