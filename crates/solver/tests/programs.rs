use approx::assert_relative_eq;
use sizing_model::{Constraint, ConstraintGroup, Model, Monomial, Registry, SolveError};
use sizing_solver::GpSolver;

fn length(value: f64) -> Monomial {
    Monomial::with_unit(value, "m").expect("metre should parse")
}

#[test]
fn unconstrained_posynomial_reaches_its_minimum() {
    let mut registry = Registry::new();
    let x = registry.scalar("x", "-", "Scale").expect("declare x");
    let objective = &x + &x.powf(-1.0);
    let model = Model::link(registry, objective, Vec::new()).expect("link");

    let solution = model.solve(&GpSolver::default()).expect("solve");
    assert_relative_eq!(solution.cost, 2.0, epsilon = 1e-5);
    let x = solution.scalar("x").expect("x reported");
    assert_relative_eq!(x, 1.0, epsilon = 1e-2);
}

#[test]
fn lower_bound_is_active_with_unit_sensitivity() {
    let mut registry = Registry::new();
    let x = registry.scalar("x", "ft", "Length").expect("declare x");
    let mut group = ConstraintGroup::new("bounds");
    group
        .add(Constraint::ge("floor", &x, length(2.0)).expect("floor").tight())
        .expect("add floor");
    let model = Model::link(registry, x, vec![group]).expect("link");

    let solution = model.solve(&GpSolver::default()).expect("solve");
    assert_relative_eq!(solution.cost, 2.0, max_relative = 1e-5);
    let feet = solution.scalar("x").expect("x reported");
    assert_relative_eq!(feet, 2.0 / 0.3048, max_relative = 1e-5);
    let dual = solution.sensitivities["bounds.floor"];
    assert_relative_eq!(dual, 1.0, epsilon = 1e-2);
    assert!(solution.warnings.is_empty(), "{:?}", solution.warnings);
}

#[test]
fn equalities_are_eliminated() {
    let mut registry = Registry::new();
    let x = registry.scalar("x", "m", "X").expect("declare x");
    let y = registry.scalar("y", "m", "Y").expect("declare y");
    let mut group = ConstraintGroup::new("g");
    group
        .add(Constraint::eq("ratio", &x, &y * 2.0).expect("ratio"))
        .expect("add ratio");
    group
        .add(Constraint::ge("floor", &y, length(3.0)).expect("floor"))
        .expect("add floor");
    let model = Model::link(registry, &x * &y, vec![group]).expect("link");

    let solution = model.solve(&GpSolver::default()).expect("solve");
    assert_relative_eq!(solution.cost, 18.0, max_relative = 1e-5);
    assert_relative_eq!(solution.scalar("x").unwrap(), 6.0, max_relative = 1e-5);
}

fn signomial_model(floor: f64) -> Model {
    // maximise x with x <= 1 m + y, y <= 3 m, x >= floor
    let mut registry = Registry::new();
    let x = registry.scalar("x", "m", "X").expect("declare x");
    let y = registry.scalar("y", "m", "Y").expect("declare y");
    let mut group = ConstraintGroup::new("g");
    group
        .add(
            Constraint::le("chain", &x, length(1.0) + &y)
                .expect("chain")
                .signomial(),
        )
        .expect("add chain");
    group
        .add(Constraint::le("cap", &y, length(3.0)).expect("cap"))
        .expect("add cap");
    group
        .add(Constraint::ge("floor", &x, length(floor)).expect("floor"))
        .expect("add floor");
    Model::link(registry, x.powf(-1.0), vec![group]).expect("link")
}

#[test]
fn signomial_constraint_converges_to_the_true_optimum() {
    let model = signomial_model(0.5);
    let solution = model.solve(&GpSolver::default()).expect("solve");
    assert_relative_eq!(solution.scalar("x").unwrap(), 4.0, max_relative = 1e-4);
    assert!(solution.iterations > 1, "expected several approximations");
}

#[test]
fn violated_signomial_constraint_is_reported_as_infeasible() {
    let model = signomial_model(10.0);
    let err = model.solve(&GpSolver::default()).unwrap_err();
    match err {
        SolveError::Infeasible { binding } => assert_eq!(binding, vec!["g.chain".to_string()]),
        other => panic!("expected infeasibility, got {other:?}"),
    }
}

#[test]
fn contradictory_bounds_fail_in_phase_one() {
    let mut registry = Registry::new();
    let x = registry.scalar("x", "m", "X").expect("declare x");
    let mut group = ConstraintGroup::new("g");
    group
        .add(Constraint::ge("floor", &x, length(2.0)).expect("floor"))
        .expect("add floor");
    group
        .add(Constraint::le("ceiling", &x, length(1.0)).expect("ceiling"))
        .expect("add ceiling");
    let model = Model::link(registry, x, vec![group]).expect("link");

    let err = model.solve(&GpSolver::default()).unwrap_err();
    match err {
        SolveError::Infeasible { binding } => {
            assert!(binding.contains(&"g.floor".to_string()));
            assert!(binding.contains(&"g.ceiling".to_string()));
        }
        other => panic!("expected infeasibility, got {other:?}"),
    }
}

#[test]
fn loose_tight_constraints_produce_warnings() {
    let mut registry = Registry::new();
    let x = registry.scalar("x", "m", "X").expect("declare x");
    let mut group = ConstraintGroup::new("g");
    group
        .add(Constraint::ge("floor", &x, length(2.0)).expect("floor").tight())
        .expect("add floor");
    group
        .add(Constraint::le("ceiling", &x, length(100.0)).expect("ceiling").tight())
        .expect("add ceiling");
    let model = Model::link(registry, x, vec![group]).expect("link");

    let solution = model.solve(&GpSolver::default()).expect("solve");
    assert_eq!(solution.warnings.len(), 1);
    assert!(solution.warnings[0].contains("g.ceiling"));
}
