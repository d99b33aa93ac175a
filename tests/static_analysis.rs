use approx::assert_relative_eq;
use felt_solver::prelude::*;

/// Axial bar of `segments` unit-length rods along x, fixed at node 1.
/// E A = 100, so each segment stretches by P / 100.
fn bar(segments: u32) -> Problem {
    let mut problem = Problem::new("bar");
    problem
        .add_material(Material::elastic("steel", 100.0, 1.0, 1.0))
        .unwrap();
    problem.add_constraint(Constraint::fixed("fixed")).unwrap();
    problem
        .add_force(Force::new("P").with_component(Dof::Tx, 10.0))
        .unwrap();
    problem
        .add_force(Force::new("Q").with_component(Dof::Tx, -4.0))
        .unwrap();

    for number in 1..=segments + 1 {
        problem
            .add_node(number, (number - 1) as f64, 0.0, 0.0)
            .unwrap();
    }
    for number in 1..=segments {
        problem
            .add_element(number, "rod", &[number, number + 1], "steel")
            .unwrap();
    }
    problem.constrain_node(1, "fixed").unwrap();
    problem
}

fn analyze(problem: &mut Problem, options: &RunOptions) -> FeltResult<AnalysisOutput> {
    let mut sink = TextReporter::new(Vec::new());
    run(problem, options, &mut sink)
}

fn static_results(problem: &mut Problem) -> StaticResults {
    match analyze(problem, &RunOptions::default()).unwrap() {
        AnalysisOutput::Static(results) => results,
        other => panic!("expected static results, got {:?}", other),
    }
}

#[test]
fn test_tip_loaded_bar() {
    let mut problem = bar(2);
    problem.apply_force(3, "P").unwrap();
    let results = static_results(&mut problem);

    assert_relative_eq!(results.displacement(2).unwrap().dx, 0.1, max_relative = 1e-12);
    assert_relative_eq!(results.displacement(3).unwrap().dx, 0.2, max_relative = 1e-12);

    // Axial force in both segments equals the tip load
    for stress in &results.stresses {
        assert_relative_eq!(stress.values[0], 10.0, max_relative = 1e-10);
    }
    assert_eq!(results.summary.max_disp_node, 3);
    assert_eq!(results.summary.free_dofs, 2);
}

#[test]
fn test_reactions_balance_applied_loads() {
    let mut problem = bar(3);
    problem.apply_force(2, "Q").unwrap();
    problem.apply_force(4, "P").unwrap();
    let results = static_results(&mut problem);

    assert_relative_eq!(results.total_reaction(Dof::Tx) + 10.0 - 4.0, 0.0, epsilon = 1e-9);
    assert_eq!(results.reactions.len(), 1);
    assert_eq!(results.reactions[0].node, 1);
}

#[test]
fn test_prescribed_displacement() {
    let mut problem = bar(2);
    problem
        .add_constraint(Constraint::free("pulled").with_boundary(Dof::Tx, 0.5))
        .unwrap();
    problem.constrain_node(3, "pulled").unwrap();
    let results = static_results(&mut problem);

    assert_relative_eq!(results.displacement(2).unwrap().dx, 0.25, max_relative = 1e-12);
    assert_relative_eq!(results.displacement(3).unwrap().dx, 0.5, max_relative = 1e-12);
    // Both ends react with equal and opposite forces
    assert_relative_eq!(results.total_reaction(Dof::Tx), 0.0, epsilon = 1e-9);
}

#[test]
fn test_load_cases_table() {
    let mut problem = bar(2);
    problem.add_load_case("pull", &[(3, "P")], &[]).unwrap();
    problem.add_load_case("push", &[(3, "Q")], &[]).unwrap();
    problem.add_load_case("both", &[(2, "Q"), (3, "P")], &[]).unwrap();
    problem.analysis =
        AnalysisParameters::new(AnalysisType::StaticLoadCases).with_outputs(&[2, 3], &[Dof::Tx]);

    let AnalysisOutput::Table(table) = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.rows, vec!["pull", "push", "both"]);

    let tip = table.column(DofKey::new(3, Dof::Tx)).unwrap();
    assert_relative_eq!(tip[0], 0.2, max_relative = 1e-12);
    assert_relative_eq!(tip[1], -0.08, max_relative = 1e-12);
    // u3 = (10 - 4) / 100 + 10 / 100
    assert_relative_eq!(tip[2], 0.16, max_relative = 1e-12);
}

#[test]
fn test_load_range_is_linear() {
    let mut problem = bar(2);
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticLoadRange)
        .with_range(0.0, 20.0, 5.0)
        .with_outputs(&[3], &[Dof::Tx])
        .with_input(3, Dof::Tx);

    let AnalysisOutput::Table(table) = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(table.num_rows(), 5);
    let tip = table.column(DofKey::new(3, Dof::Tx)).unwrap();
    for (row, value) in tip.iter().enumerate() {
        let force = 5.0 * row as f64;
        assert_relative_eq!(*value, 2.0 * force / 100.0, epsilon = 1e-12);
    }
}

#[test]
fn test_load_range_on_constrained_input_is_refused() {
    let mut problem = bar(2);
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticLoadRange)
        .with_range(0.0, 10.0, 5.0)
        .with_outputs(&[3], &[Dof::Tx])
        .with_input(1, Dof::Tx);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::InvalidInput(_))
    ));
}

#[test]
fn test_load_range_with_vanishing_step_is_invalid() {
    let mut problem = bar(2);
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticLoadRange)
        .with_range(0.0, 20.0, 1e-300)
        .with_outputs(&[3], &[Dof::Tx])
        .with_input(3, Dof::Tx);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::InvalidParameters(1))
    ));
}

#[test]
fn test_load_cases_without_outputs_are_invalid() {
    let mut problem = bar(2);
    problem.add_load_case("pull", &[(3, "P")], &[]).unwrap();
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticLoadCases);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::InvalidParameters(2))
    ));
}

#[test]
fn test_unrestrained_bar_is_singular() {
    let mut problem = bar(2);
    problem.nodes[0].constraint = None;
    problem.apply_force(3, "P").unwrap();
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::SingularMatrix)
    ));
}

#[test]
fn test_renumbering_does_not_change_results() {
    let scramble = |problem: &mut Problem| {
        problem.apply_force(6, "P").unwrap();
        problem.apply_force(3, "Q").unwrap();
    };

    let mut plain = bar(5);
    scramble(&mut plain);
    let expected = static_results(&mut plain);

    let mut renumbered = bar(5);
    scramble(&mut renumbered);
    let options = RunOptions {
        renumber: true,
        ..RunOptions::default()
    };
    let AnalysisOutput::Static(results) = analyze(&mut renumbered, &options).unwrap() else {
        panic!("expected static results");
    };

    for (a, b) in expected.displacements.iter().zip(&results.displacements) {
        assert_eq!(a.node, b.node);
        assert_relative_eq!(a.dx, b.dx, epsilon = 1e-12);
    }
    for (id, node) in renumbered.nodes.iter().enumerate() {
        assert_eq!(node.eq_position(), id);
    }
}

#[test]
fn test_nonlinear_truss_matches_small_strain_solution() {
    let mut problem = Problem::new("truss");
    problem
        .add_material(Material::elastic("steel", 1000.0, 1.0, 1.0))
        .unwrap();
    problem.add_constraint(Constraint::fixed("fixed")).unwrap();
    problem
        .add_constraint(
            Constraint::free("roller")
                .with_restraint(Dof::Ty)
                .with_restraint(Dof::Tz),
        )
        .unwrap();
    problem
        .add_force(Force::new("P").with_component(Dof::Tx, 5.0))
        .unwrap();
    problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
    problem.add_node(2, 10.0, 0.0, 0.0).unwrap();
    problem.add_element(1, "truss", &[1, 2], "steel").unwrap();
    problem.constrain_node(1, "fixed").unwrap();
    problem.constrain_node(2, "roller").unwrap();
    problem.apply_force(2, "P").unwrap();

    for mode in [AnalysisType::StaticSubstitution, AnalysisType::StaticIncremental] {
        problem.analysis = AnalysisParameters::new(mode).with_iterations(50, 1e-10);
        let results = static_results(&mut problem);
        // Axial stretch along the bar is linear in the displacement
        assert_relative_eq!(results.displacement(2).unwrap().dx, 0.05, max_relative = 1e-8);
    }
}

#[test]
fn test_nonlinear_mechanism_is_singular() {
    let mut problem = Problem::new("loose truss");
    problem
        .add_material(Material::elastic("steel", 1000.0, 1.0, 1.0))
        .unwrap();
    problem.add_constraint(Constraint::fixed("fixed")).unwrap();
    problem
        .add_force(Force::new("P").with_component(Dof::Tx, 5.0))
        .unwrap();
    problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
    problem.add_node(2, 10.0, 0.0, 0.0).unwrap();
    problem.add_element(1, "truss", &[1, 2], "steel").unwrap();
    problem.constrain_node(1, "fixed").unwrap();
    problem.apply_force(2, "P").unwrap();
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticSubstitution).with_iterations(50, 1e-10);

    // Node 2 can swing freely about node 1
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::SingularMatrix)
    ));
}

#[test]
fn test_nothing_to_do() {
    let mut problem = Problem::new("nodes only");
    problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::NothingToDo)
    ));
}

#[test]
fn test_thermal_strip_is_linear() {
    let mut problem = Problem::new("strip");
    problem
        .add_material(Material::thermal("copper", 400.0, 8900.0, 385.0))
        .unwrap();
    problem
        .add_constraint(Constraint::free("cold").with_boundary(Dof::Tx, 0.0))
        .unwrap();
    problem
        .add_constraint(Constraint::free("hot").with_boundary(Dof::Tx, 100.0))
        .unwrap();

    // 2 x 1 strip, two squares split into triangles
    let coords = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 1.0), (1.0, 1.0), (2.0, 1.0)];
    for (i, &(x, y)) in coords.iter().enumerate() {
        problem.add_node(i as u32 + 1, x, y, 0.0).unwrap();
    }
    let triangles = [[1, 2, 5], [1, 5, 4], [2, 3, 6], [2, 6, 5]];
    for (i, nodes) in triangles.iter().enumerate() {
        problem
            .add_element(i as u32 + 1, "htk", nodes, "copper")
            .unwrap();
    }
    for number in [1, 4] {
        problem.constrain_node(number, "cold").unwrap();
    }
    for number in [3, 6] {
        problem.constrain_node(number, "hot").unwrap();
    }
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticThermal);

    let AnalysisOutput::Temperatures(results) = analyze(&mut problem, &RunOptions::default()).unwrap() else {
        panic!("expected temperatures");
    };
    assert_relative_eq!(results.temperature(2).unwrap(), 50.0, max_relative = 1e-10);
    assert_relative_eq!(results.temperature(5).unwrap(), 50.0, max_relative = 1e-10);
    // q = -kappa dT/dx everywhere
    for flux in &results.fluxes {
        assert_relative_eq!(flux.values[0], -400.0 * 50.0, max_relative = 1e-10);
        assert_relative_eq!(flux.values[1], 0.0, epsilon = 1e-8);
    }
}

#[test]
fn test_structural_element_in_thermal_analysis_is_invalid() {
    let mut problem = bar(1);
    problem.analysis = AnalysisParameters::new(AnalysisType::StaticThermal);
    assert!(matches!(
        analyze(&mut problem, &RunOptions::default()),
        Err(FeltError::InvalidParameters(1))
    ));
}

#[test]
fn test_builtin_definitions_registered() {
    let problem = Problem::new("empty");
    let names: Vec<&str> = problem.definitions.names().collect();
    assert_eq!(names, vec!["beam", "htk", "rod", "truss"]);
}
