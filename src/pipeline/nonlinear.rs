//! Nonlinear static strategies
//!
//! Substitution and incremental analyses run the same iteration; the load
//! range variants repeat it for each value of the input force.

use super::static_analysis::{input_equation, load_range_rows, output_columns, prepare, static_results};
use super::{AnalysisOutput, AnalysisStrategy, RunOptions};
use crate::analysis::AnalysisType;
use crate::assembly::assemble_nonlinear_stiffness;
use crate::error::{FeltError, FeltResult};
use crate::model::Problem;
use crate::output::OutputSink;
use crate::results::{extract, ResultTable};
use crate::solvers::{solve_nonlinear_load_range, static_nonlinear_displacements, NonlinearControls};

pub(super) struct NonlinearStrategy {
    pub mode: AnalysisType,
}

impl super::sealed::Sealed for NonlinearStrategy {}

impl NonlinearStrategy {
    fn is_ranged(&self) -> bool {
        matches!(
            self.mode,
            AnalysisType::StaticSubstitutionLoadRange | AnalysisType::StaticIncrementalLoadRange
        )
    }
}

impl AnalysisStrategy for NonlinearStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let system = prepare(problem, self.mode, options, sink)?;
        let controls = NonlinearControls::from(&problem.analysis);

        if self.is_ranged() {
            let input = input_equation(problem, &system.condensation)?;
            let values = load_range_rows(problem);
            let solutions = solve_nonlinear_load_range(
                problem,
                &system.condensation,
                &system.f,
                input,
                &values,
                &controls,
            )?;

            let columns = output_columns(problem);
            let mut table = ResultTable::new("nonlinear load range displacements", "force", columns.clone());
            for (&value, d) in values.iter().zip(&solutions) {
                table.push_row(format!("{}", value), value, &extract(problem, &columns, d));
            }
            return Ok(AnalysisOutput::Table(table));
        }

        let d = static_nonlinear_displacements(problem, &system.condensation, &system.f, &controls)?;

        // Reactions from the stiffness at the converged state
        let (k, errors) = assemble_nonlinear_stiffness(problem, &d);
        if errors > 0 {
            return Err(FeltError::Assembly(errors));
        }
        let results = static_results(problem, &k, &system.f, &d, &system.condensation)?;
        Ok(AnalysisOutput::Static(results))
    }
}
