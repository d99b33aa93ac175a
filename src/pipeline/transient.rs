//! Structural and thermal time integration strategies

use super::static_analysis::output_columns;
use super::{check_assembly, dump_matrices, validate, AnalysisOutput, AnalysisStrategy, RunOptions};
use crate::analysis::AnalysisType;
use crate::assembly::{assemble_dynamic, initial_conditions, nodal_forces, Condensation, DynamicMatrices};
use crate::error::{FeltError, FeltResult};
use crate::math::{Mat, Vec as FEVec};
use crate::model::Problem;
use crate::output::OutputSink;
use crate::results::{extract, ResultTable};
use crate::solvers::{
    integrate_adaptive, integrate_hyperbolic, integrate_parabolic, DynamicSystem, Newmark,
};

pub(super) struct TransientStrategy;
pub(super) struct TransientThermalStrategy;

impl super::sealed::Sealed for TransientStrategy {}
impl super::sealed::Sealed for TransientThermalStrategy {}

/// Validate, assemble `K`, `M` and `C`, dump them and build the condensation
pub(super) fn prepare_dynamic(
    problem: &Problem,
    mode: AnalysisType,
    options: &RunOptions,
    sink: &mut dyn OutputSink,
) -> FeltResult<(DynamicMatrices, Condensation)> {
    validate(problem, mode)?;
    let (matrices, errors) = assemble_dynamic(problem, problem.analysis.mass_mode);
    check_assembly(errors)?;
    dump_matrices(problem, sink, options, &matrices.k, &matrices.m, &matrices.c)?;
    Ok((matrices, Condensation::new(problem)))
}

/// Condensed load history `F_f(t) - K_fp d_p`
fn condensed_forces<'a>(
    problem: &'a Problem,
    k: &'a Mat,
    condensation: &'a Condensation,
) -> impl Fn(f64) -> FEVec + 'a {
    move |t| condensation.condense_rhs(k, &nodal_forces(problem, t))
}

fn history_table(
    problem: &Problem,
    title: &str,
    condensation: &Condensation,
    times: &[f64],
    table: &[FEVec],
) -> ResultTable {
    let columns = output_columns(problem);
    let mut result = ResultTable::new(title, "time", columns.clone());
    for (&t, dc) in times.iter().zip(table) {
        let d = condensation.expand(dc);
        result.push_row(format!("{:.6}", t), t, &extract(problem, &columns, &d));
    }
    result
}

impl AnalysisStrategy for TransientStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let (matrices, condensation) = prepare_dynamic(problem, AnalysisType::Transient, options, sink)?;
        let params = &problem.analysis;

        let k = condensation.condense_matrix(&matrices.k);
        let m = condensation.condense_matrix(&matrices.m);
        let c = condensation.condense_matrix(&matrices.c);
        let system = DynamicSystem { k: &k, m: &m, c: &c };
        let newmark = Newmark {
            gamma: params.gamma,
            beta: params.beta,
        };

        let (d0, v0) = initial_conditions(problem);
        let d0 = condensation.condense_vector(&d0);
        let v0 = condensation.condense_vector(&v0);
        let force = condensed_forces(problem, &matrices.k, &condensation);

        let (times, table) = if params.step > 0.0 {
            let table = integrate_hyperbolic(system, newmark, force, d0, v0, params.step, params.stop)
                .ok_or(FeltError::IntegrationFailed)?;
            let times: Vec<f64> = (0..table.len()).map(|i| i as f64 * params.step).collect();
            (times, table)
        } else {
            integrate_adaptive(system, newmark, force, d0, v0, params.stop, params.tolerance)
                .ok_or(FeltError::IntegrationFailed)?
        };

        if table.is_empty() {
            return Err(FeltError::IntegrationFailed);
        }
        Ok(AnalysisOutput::Table(history_table(
            problem,
            "transient displacements",
            &condensation,
            &times,
            &table,
        )))
    }
}

impl AnalysisStrategy for TransientThermalStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let (matrices, condensation) =
            prepare_dynamic(problem, AnalysisType::TransientThermal, options, sink)?;
        let params = &problem.analysis;

        let k = condensation.condense_matrix(&matrices.k);
        let m = condensation.condense_matrix(&matrices.m);
        let (t0, _) = initial_conditions(problem);
        let t0 = condensation.condense_vector(&t0);
        let force = condensed_forces(problem, &matrices.k, &condensation);

        let table = integrate_parabolic(&k, &m, force, t0, params.step, params.stop, params.alpha)
            .ok_or(FeltError::IntegrationFailed)?;
        if table.is_empty() {
            return Err(FeltError::IntegrationFailed);
        }

        let times: Vec<f64> = (0..table.len()).map(|i| i as f64 * params.step).collect();
        Ok(AnalysisOutput::Table(history_table(
            problem,
            "nodal temperatures",
            &condensation,
            &times,
            &table,
        )))
    }
}
