//! The analysis pipeline
//!
//! One run follows a fixed protocol: find the active DOFs, optionally
//! renumber nodes, hand the problem to the strategy of the declared analysis
//! type (validate, assemble, condense, solve, convert to results), restore
//! the node numbering whatever the outcome, then report through an
//! [`OutputSink`].

mod modal;
mod nonlinear;
mod spectral;
mod static_analysis;
mod transient;

use std::path::PathBuf;

use crate::analysis::AnalysisType;
use crate::dofs::{find_active_dofs, renumber_nodes, restore_node_numbers, Renumbering};
use crate::error::{FeltError, FeltResult};
use crate::math::Mat;
use crate::model::Problem;
use crate::output::OutputSink;
use crate::results::{
    EigenResults, ModalMatrices, ResultTable, StaticResults, TemperatureResults, TransferFunctions,
};

use modal::ModalStrategy;
use nonlinear::NonlinearStrategy;
use spectral::SpectralStrategy;
use static_analysis::{LoadCasesStrategy, LoadRangeStrategy, StaticStrategy, StaticThermalStrategy};
use transient::{TransientStrategy, TransientThermalStrategy};

/// Switches controlling what a run computes and reports
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Print the assembled global matrices
    pub matrices: bool,
    /// Write M, C and K to this file in MATLAB format
    pub matrix_export: Option<PathBuf>,
    /// Print result tables
    pub table: bool,
    /// Draw ASCII plots of tables, modes and transfer functions
    pub plot: bool,
    /// Spectral analysis computes output spectra (otherwise transfer functions only)
    pub spectra: bool,
    /// Modal analysis forms modal matrices (otherwise eigen results only)
    pub modal: bool,
    /// Scale modes to unit modal mass before forming modal matrices
    pub orthonormal: bool,
    /// Renumber nodes to reduce the bandwidth
    pub renumber: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            matrices: false,
            matrix_export: None,
            table: true,
            plot: false,
            spectra: true,
            modal: true,
            orthonormal: false,
            renumber: false,
        }
    }
}

/// What a run produced
#[derive(Debug, Clone)]
pub enum AnalysisOutput {
    /// Displacements, reactions and stresses
    Static(StaticResults),
    /// Steady-state temperatures
    Temperatures(TemperatureResults),
    /// Load cases, load ranges and transient histories
    Table(ResultTable),
    Modal {
        eigen: EigenResults,
        matrices: Option<ModalMatrices>,
    },
    /// Transfer functions only
    Transfer(TransferFunctions),
    Spectra {
        transfer: TransferFunctions,
        spectra: ResultTable,
    },
    /// A run that completed with nothing to report
    Nothing,
}

impl AnalysisOutput {
    /// Hand the results to a sink
    pub fn report(&self, sink: &mut dyn OutputSink, options: &RunOptions) {
        match self {
            AnalysisOutput::Static(results) => sink.render_static(results),
            AnalysisOutput::Temperatures(results) => sink.render_temperatures(results),
            AnalysisOutput::Table(table) => {
                if options.table {
                    sink.render_table(table);
                }
                if options.plot {
                    sink.plot_table(table);
                }
            }
            AnalysisOutput::Modal { eigen, matrices } => {
                sink.render_eigen(eigen);
                if options.plot {
                    sink.plot_eigen(eigen);
                }
                if let Some(matrices) = matrices {
                    sink.render_modal_matrices(matrices);
                }
            }
            AnalysisOutput::Transfer(transfer) => {
                if options.table {
                    sink.render_transfer_functions(transfer);
                }
                if options.plot {
                    sink.plot_transfer_functions(transfer);
                }
            }
            AnalysisOutput::Spectra { spectra, .. } => {
                if options.table {
                    sink.render_table(spectra);
                }
                if options.plot {
                    sink.plot_table(spectra);
                }
            }
            AnalysisOutput::Nothing => {}
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// One analysis type's validate / assemble / condense / solve sequence
pub trait AnalysisStrategy: sealed::Sealed {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput>;
}

/// Select the strategy of an analysis type
pub fn strategy_for(mode: AnalysisType) -> Box<dyn AnalysisStrategy> {
    match mode {
        AnalysisType::Static => Box::new(StaticStrategy),
        AnalysisType::StaticThermal => Box::new(StaticThermalStrategy),
        AnalysisType::StaticLoadCases => Box::new(LoadCasesStrategy),
        AnalysisType::StaticLoadRange => Box::new(LoadRangeStrategy),
        AnalysisType::StaticSubstitution
        | AnalysisType::StaticIncremental
        | AnalysisType::StaticSubstitutionLoadRange
        | AnalysisType::StaticIncrementalLoadRange => Box::new(NonlinearStrategy { mode }),
        AnalysisType::Transient => Box::new(TransientStrategy),
        AnalysisType::TransientThermal => Box::new(TransientThermalStrategy),
        AnalysisType::Modal => Box::new(ModalStrategy),
        AnalysisType::Spectral => Box::new(SpectralStrategy),
    }
}

/// Run the analysis declared in `problem.analysis`
pub fn run(
    problem: &mut Problem,
    options: &RunOptions,
    sink: &mut dyn OutputSink,
) -> FeltResult<AnalysisOutput> {
    let mode = problem.analysis.mode;
    log::info!("{} analysis of '{}'", mode.label(), problem.title);

    let equations = find_active_dofs(problem)?;
    log::debug!("{} global equations", equations);

    let renumbering = if options.renumber {
        renumber_nodes(problem)
    } else {
        Renumbering::identity(problem)
    };

    let result = strategy_for(mode).run(problem, options, sink);
    restore_node_numbers(problem, renumbering);

    let output = result?;
    output.report(sink, options);
    Ok(output)
}

fn validate(problem: &Problem, mode: AnalysisType) -> FeltResult<()> {
    match problem.analysis.validate(mode, problem) {
        0 => Ok(()),
        count => Err(FeltError::InvalidParameters(count)),
    }
}

fn check_assembly(errors: usize) -> FeltResult<()> {
    match errors {
        0 => Ok(()),
        count => Err(FeltError::Assembly(count)),
    }
}

/// Print and export assembled matrices as requested; `m` and `c` are empty for
/// static analyses. `C` is printed only when some material is damped.
fn dump_matrices(
    problem: &Problem,
    sink: &mut dyn OutputSink,
    options: &RunOptions,
    k: &Mat,
    m: &Mat,
    c: &Mat,
) -> FeltResult<()> {
    if options.matrices {
        let mut named = vec![("K", k)];
        if m.nrows() > 0 {
            named.push(("M", m));
        }
        if c.nrows() > 0 && problem.is_damped() {
            named.push(("C", c));
        }
        sink.render_matrices(&named);
    }
    if let Some(path) = &options.matrix_export {
        sink.export_matrices(path, m, c, k)?;
        log::info!("matrices written to {}", path.display());
    }
    Ok(())
}
