use approx::assert_relative_eq;
use felt_solver::input::parse_model;
use felt_solver::prelude::*;

/// Single rod, fixed at node 1: k = E A / L = 100, consistent free mass
/// rho A L / 3 = 1 / 3.
fn oscillator(rho: f64) -> Problem {
    let mut problem = Problem::new("oscillator");
    problem
        .add_material(Material::elastic("steel", 100.0, 1.0, rho))
        .unwrap();
    problem.add_constraint(Constraint::fixed("fixed")).unwrap();
    problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
    problem.add_node(2, 1.0, 0.0, 0.0).unwrap();
    problem.add_element(1, "rod", &[1, 2], "steel").unwrap();
    problem.constrain_node(1, "fixed").unwrap();
    problem
}

fn analyze(problem: &mut Problem, options: &RunOptions) -> FeltResult<AnalysisOutput> {
    let mut sink = TextReporter::new(Vec::new());
    run(problem, options, &mut sink)
}

#[test]
fn test_fixed_step_transient_row_count() {
    let mut problem = oscillator(1.0);
    problem
        .add_force(Force::new("step").with_component(Dof::Tx, 1.0))
        .unwrap();
    problem.apply_force(2, "step").unwrap();
    problem.analysis = AnalysisParameters::new(AnalysisType::Transient)
        .with_range(0.0, 0.1, 0.01)
        .with_outputs(&[2], &[Dof::Tx]);

    let AnalysisOutput::Table(table) = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(table.num_rows(), 11);
    assert_relative_eq!(table.abscissa[10], 0.1, epsilon = 1e-12);

    // Undamped step response oscillates about the static value F / k
    let tip = table.column(DofKey::new(2, Dof::Tx)).unwrap();
    assert_eq!(tip[0], 0.0);
    assert!(tip.iter().all(|&d| (-1e-12..=0.02 + 1e-6).contains(&d)));
}

#[test]
fn test_adaptive_transient_reaches_stop_time() {
    let mut problem = oscillator(1.0);
    problem
        .add_constraint(Constraint::free("plucked").with_initial_displacement(Dof::Tx, 0.01))
        .unwrap();
    problem.constrain_node(2, "plucked").unwrap();
    problem.analysis = AnalysisParameters::new(AnalysisType::Transient)
        .with_range(0.0, 0.05, 0.0)
        .with_iterations(50, 1e-4)
        .with_outputs(&[2], &[Dof::Tx]);

    let AnalysisOutput::Table(table) = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected a table");
    };
    assert!(table.num_rows() > 2);
    assert_relative_eq!(*table.abscissa.last().unwrap(), 0.05, epsilon = 1e-9);
    assert!(table.abscissa.windows(2).all(|w| w[1] > w[0]));
    // Less than a quarter period: the bar is still moving back towards zero
    let tip = table.column(DofKey::new(2, Dof::Tx)).unwrap();
    assert_relative_eq!(tip[0], 0.01, epsilon = 1e-15);
    assert!(tip.windows(2).all(|w| w[1] < w[0] && w[1] > 0.0));
}

#[test]
fn test_transient_without_outputs_is_invalid() {
    let mut problem = oscillator(1.0);
    problem.analysis = AnalysisParameters::new(AnalysisType::Transient).with_range(0.0, 1.0, 0.1);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::InvalidParameters(_))
    ));
}

#[test]
fn test_vanishing_time_step_is_invalid() {
    for mode in [AnalysisType::Transient, AnalysisType::TransientThermal] {
        let mut problem = oscillator(1.0);
        problem.analysis = AnalysisParameters::new(mode)
            .with_range(0.0, 1.0, 1e-300)
            .with_outputs(&[2], &[Dof::Tx]);
        assert!(matches!(
            analyze(&mut problem, &RunOptions::default()),
            Err(FeltError::InvalidParameters(_))
        ));
    }
}

#[test]
fn test_modal_single_dof() {
    let mut problem = oscillator(1.0);
    problem.analysis = AnalysisParameters::new(AnalysisType::Modal);

    let AnalysisOutput::Modal { eigen, matrices } = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected modal results");
    };
    assert_eq!(eigen.eigenvalues.len(), 1);
    assert_relative_eq!(eigen.eigenvalues[0], 300.0, max_relative = 1e-10);
    assert_relative_eq!(
        eigen.frequencies()[0],
        300.0_f64.sqrt() / (2.0 * std::f64::consts::PI),
        max_relative = 1e-10
    );

    // Mode shape rows cover every active DOF; the fixed node does not move
    assert_eq!(eigen.dofs, vec![DofKey::new(1, Dof::Tx), DofKey::new(2, Dof::Tx)]);
    assert_eq!(eigen.modes[(0, 0)], 0.0);
    assert_relative_eq!(eigen.modes[(1, 0)], 1.0, max_relative = 1e-12);

    let matrices = matrices.unwrap();
    assert_relative_eq!(matrices.stiffness[(0, 0)], 100.0, max_relative = 1e-10);
    assert_relative_eq!(matrices.mass[(0, 0)], 1.0 / 3.0, max_relative = 1e-10);
}

#[test]
fn test_eigen_only_skips_modal_matrices() {
    let mut problem = oscillator(1.0);
    problem.analysis = AnalysisParameters::new(AnalysisType::Modal);
    let options = RunOptions {
        modal: false,
        ..RunOptions::default()
    };
    let AnalysisOutput::Modal { matrices, .. } = analyze(&mut problem, &options).unwrap() else {
        panic!("expected modal results");
    };
    assert!(matrices.is_none());
}

#[test]
fn test_massless_modal_is_not_positive_definite() {
    let mut problem = oscillator(0.0);
    problem.analysis = AnalysisParameters::new(AnalysisType::Modal);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::NotPositiveDefinite)
    ));
}

fn spectral(problem: &mut Problem) {
    problem.analysis = AnalysisParameters::new(AnalysisType::Spectral)
        .with_range(1.0, 3.0, 1.0)
        .with_outputs(&[2], &[Dof::Tx]);
}

#[test]
fn test_output_spectrum_of_white_noise() {
    let mut problem = oscillator(1.0);
    problem
        .add_force(Force::new("noise").with_spectrum(Dof::Tx, Forcing::Constant(2.0)))
        .unwrap();
    problem.apply_force(2, "noise").unwrap();
    spectral(&mut problem);

    let AnalysisOutput::Spectra { transfer, spectra } = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected output spectra");
    };
    assert_eq!(transfer.inputs, vec![DofKey::new(2, Dof::Tx)]);
    assert_eq!(spectra.num_rows(), 3);
    for (row, &omega) in spectra.abscissa.iter().enumerate() {
        let h = 1.0 / (100.0 - omega * omega / 3.0);
        assert_relative_eq!(transfer.values[0][(row, 0)], h, max_relative = 1e-10);
        assert_relative_eq!(spectra.values[(row, 0)], 2.0 * h * h, max_relative = 1e-10);
    }
}

#[test]
fn test_spectral_with_vanishing_step_is_invalid() {
    let mut problem = oscillator(1.0);
    spectral(&mut problem);
    problem.analysis.step = 1e-300;
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::InvalidParameters(1))
    ));
}

#[test]
fn test_spectral_without_forced_dofs_reports_nothing() {
    let mut problem = oscillator(1.0);
    spectral(&mut problem);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()).unwrap(),
        AnalysisOutput::Nothing
    ));

    let options = RunOptions {
        spectra: false,
        ..RunOptions::default()
    };
    let AnalysisOutput::Transfer(transfer) = analyze(&mut problem, &options).unwrap() else {
        panic!("expected transfer functions");
    };
    assert!(transfer.is_empty());
}

#[test]
fn test_thermal_transient_approaches_steady_state() {
    let json = r#"{
        "title": "cooling strip",
        "analysis": {
            "mode": "transient_thermal",
            "start": 0.0, "stop": 2.0, "step": 0.1, "alpha": 1.0,
            "nodes": [2], "dofs": ["tx"]
        },
        "materials": [{ "name": "m", "kappa": 1.0, "rho": 1.0, "c": 1.0, "t": 1.0 }],
        "constraints": [
            { "name": "cold", "boundary": { "tx": 0.0 } },
            { "name": "warm", "initial_displacement": { "tx": 10.0 } }
        ],
        "nodes": [
            { "number": 1, "x": 0.0, "y": 0.0, "constraint": "cold" },
            { "number": 2, "x": 1.0, "y": 0.0, "constraint": "warm" },
            { "number": 3, "x": 0.0, "y": 1.0, "constraint": "cold" }
        ],
        "elements": [{ "number": 1, "type": "htk", "nodes": [1, 2, 3], "material": "m" }]
    }"#;
    let mut problem = parse_model(json).unwrap();

    let AnalysisOutput::Table(table) = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(table.num_rows(), 21);
    let history = table.column(DofKey::new(2, Dof::Tx)).unwrap();
    assert_relative_eq!(history[0], 10.0, epsilon = 1e-12);
    // Backward Euler decays monotonically towards the boundary temperature
    assert!(history.windows(2).all(|w| w[1] < w[0] && w[1] > 0.0));
}
