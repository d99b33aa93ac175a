//! Linear static strategies: single solve, load cases, load range, thermal

use super::{check_assembly, dump_matrices, validate, AnalysisOutput, AnalysisStrategy, RunOptions};
use crate::analysis::AnalysisType;
use crate::assembly::{
    assemble_stiffness, case_force_vector, element_stresses, reactions, static_force_vector,
    store_nodal_values, Condensation,
};
use crate::error::{FeltError, FeltResult};
use crate::math::{Mat, Vec as FEVec};
use crate::model::Problem;
use crate::output::OutputSink;
use crate::results::{
    extract, AnalysisSummary, DofKey, ElementStress, NodeDisplacement, NodeTemperature, Reaction,
    ResultTable, StaticResults, TemperatureResults,
};
use crate::solvers::{solve_displacements, solve_many};

pub(super) struct StaticStrategy;
pub(super) struct StaticThermalStrategy;
pub(super) struct LoadCasesStrategy;
pub(super) struct LoadRangeStrategy;

impl super::sealed::Sealed for StaticStrategy {}
impl super::sealed::Sealed for StaticThermalStrategy {}
impl super::sealed::Sealed for LoadCasesStrategy {}
impl super::sealed::Sealed for LoadRangeStrategy {}

/// Assembled and condensed linear system shared by the static strategies
pub(super) struct StaticSystem {
    pub k: Mat,
    pub f: FEVec,
    pub condensation: Condensation,
}

/// Validate, assemble `K` and `F`, dump matrices and build the condensation
pub(super) fn prepare(
    problem: &Problem,
    mode: AnalysisType,
    options: &RunOptions,
    sink: &mut dyn OutputSink,
) -> FeltResult<StaticSystem> {
    validate(problem, mode)?;

    let (k, k_errors) = assemble_stiffness(problem);
    let (f, f_errors) = static_force_vector(problem);
    check_assembly(k_errors + f_errors)?;

    let empty = Mat::zeros(0, 0);
    dump_matrices(problem, sink, options, &k, &empty, &empty)?;

    Ok(StaticSystem {
        k,
        f,
        condensation: Condensation::new(problem),
    })
}

/// Store `d`, compute element stresses and collect node-number keyed results
pub(super) fn static_results(
    problem: &mut Problem,
    k: &Mat,
    f: &FEVec,
    d: &FEVec,
    condensation: &Condensation,
) -> FeltResult<StaticResults> {
    store_nodal_values(problem, d);
    let errors = element_stresses(problem);
    if errors > 0 {
        return Err(FeltError::Stress(errors));
    }

    let displacements: Vec<NodeDisplacement> = problem
        .nodes
        .iter()
        .map(|node| NodeDisplacement::from_array(node.number, node.values()))
        .collect();
    let reactions: Vec<Reaction> = reactions(problem, k, f, d, condensation)
        .into_iter()
        .map(|(id, dof, force)| Reaction {
            node: problem.nodes[id].number,
            dof,
            force,
        })
        .collect();
    let stresses = collect_stresses(problem);

    let mut summary = AnalysisSummary {
        num_nodes: problem.nodes.len(),
        num_elements: problem.elements.len(),
        total_dofs: condensation.size(),
        free_dofs: condensation.num_free(),
        ..AnalysisSummary::default()
    };
    for displacement in &displacements {
        let magnitude = displacement.translation_magnitude();
        if magnitude > summary.max_displacement {
            summary.max_displacement = magnitude;
            summary.max_disp_node = displacement.node;
        }
    }
    for reaction in &reactions {
        if reaction.force.abs() > summary.max_reaction {
            summary.max_reaction = reaction.force.abs();
            summary.max_reaction_node = reaction.node;
        }
    }

    Ok(StaticResults {
        displacements,
        reactions,
        stresses,
        summary,
    })
}

fn collect_stresses(problem: &Problem) -> Vec<ElementStress> {
    problem
        .elements
        .iter()
        .map(|element| ElementStress {
            element: element.number,
            definition: element.definition.name.clone(),
            values: element.stresses().to_vec(),
        })
        .collect()
}

fn solve(system: &StaticSystem) -> FeltResult<FEVec> {
    let (kc, fc) = system.condensation.condense_system(&system.k, &system.f);
    let dc = solve_displacements(&kc, &fc).ok_or(FeltError::SingularMatrix)?;
    Ok(system.condensation.expand(&dc))
}

/// Columns of a result table: the requested output nodes and DOFs
pub(super) fn output_columns(problem: &Problem) -> Vec<DofKey> {
    DofKey::grid(&problem.analysis.nodes, &problem.analysis.dofs)
}

/// Global equation of the ranged input force; it must not be constrained
pub(super) fn input_equation(problem: &Problem, condensation: &Condensation) -> FeltResult<usize> {
    let (Some(node), Some(dof)) = (problem.analysis.input_node, problem.analysis.input_dof) else {
        return Err(FeltError::InvalidParameters(1));
    };
    let key = DofKey::new(node, dof);
    let index = key
        .global_index(problem)
        .ok_or_else(|| FeltError::InvalidInput(format!("input {} is not an active DOF", key)))?;
    if condensation.free_index(index).is_none() {
        return Err(FeltError::InvalidInput(format!("input {} is constrained", key)));
    }
    Ok(index)
}

/// Force values of a load range, one per row
pub(super) fn load_range_rows(problem: &Problem) -> Vec<f64> {
    let params = &problem.analysis;
    (0..params.num_steps()).map(|i| params.sweep_value(i)).collect()
}

impl AnalysisStrategy for StaticStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let system = prepare(problem, AnalysisType::Static, options, sink)?;
        let d = solve(&system)?;
        let results = static_results(problem, &system.k, &system.f, &d, &system.condensation)?;
        log::info!(
            "maximum displacement {:.6e} at node {}",
            results.summary.max_displacement,
            results.summary.max_disp_node
        );
        Ok(AnalysisOutput::Static(results))
    }
}

impl AnalysisStrategy for StaticThermalStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let system = prepare(problem, AnalysisType::StaticThermal, options, sink)?;
        let d = solve(&system)?;

        store_nodal_values(problem, &d);
        let errors = element_stresses(problem);
        if errors > 0 {
            return Err(FeltError::Stress(errors));
        }

        let temperatures = problem
            .nodes
            .iter()
            .map(|node| NodeTemperature {
                node: node.number,
                temperature: node.values()[0],
            })
            .collect();
        Ok(AnalysisOutput::Temperatures(TemperatureResults {
            temperatures,
            fluxes: collect_stresses(problem),
        }))
    }
}

impl AnalysisStrategy for LoadCasesStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let system = prepare(problem, AnalysisType::StaticLoadCases, options, sink)?;

        let mut errors = 0;
        let mut rhs = Vec::with_capacity(problem.load_cases.len());
        for case in &problem.load_cases {
            let (f, case_errors) = case_force_vector(problem, case);
            errors += case_errors;
            rhs.push(system.condensation.condense_rhs(&system.k, &f));
        }
        check_assembly(errors)?;

        let kc = system.condensation.condense_matrix(&system.k);
        let solutions = solve_many(&kc, &rhs).ok_or(FeltError::SingularMatrix)?;

        let columns = output_columns(problem);
        let mut table = ResultTable::new("load case displacements", "case", columns.clone());
        for (i, (case, dc)) in problem.load_cases.iter().zip(&solutions).enumerate() {
            let d = system.condensation.expand(dc);
            table.push_row(case.name.clone(), (i + 1) as f64, &extract(problem, &columns, &d));
        }
        Ok(AnalysisOutput::Table(table))
    }
}

impl AnalysisStrategy for LoadRangeStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let system = prepare(problem, AnalysisType::StaticLoadRange, options, sink)?;
        let input = input_equation(problem, &system.condensation)?;
        let values = load_range_rows(problem);

        let rhs: Vec<FEVec> = values
            .iter()
            .map(|&value| {
                let mut f = system.f.clone();
                f[input] = value;
                system.condensation.condense_rhs(&system.k, &f)
            })
            .collect();
        let kc = system.condensation.condense_matrix(&system.k);
        let solutions = solve_many(&kc, &rhs).ok_or(FeltError::SingularMatrix)?;

        let columns = output_columns(problem);
        let mut table = ResultTable::new("load range displacements", "force", columns.clone());
        for (&value, dc) in values.iter().zip(&solutions) {
            let d = system.condensation.expand(dc);
            table.push_row(format!("{}", value), value, &extract(problem, &columns, &d));
        }
        Ok(AnalysisOutput::Table(table))
    }
}
