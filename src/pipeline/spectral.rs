use super::static_analysis::{load_range_rows, output_columns};
use super::transient::prepare_dynamic;
use super::{AnalysisOutput, AnalysisStrategy, RunOptions};
use crate::analysis::AnalysisType;
use crate::error::FeltResult;
use crate::model::Problem;
use crate::output::OutputSink;
use crate::results::{ResultTable, TransferFunctions};
use crate::solvers::{compute_output_spectra, compute_transfer_functions, find_forced_dofs};

pub(super) struct SpectralStrategy;

impl super::sealed::Sealed for SpectralStrategy {}

impl AnalysisStrategy for SpectralStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let (matrices, condensation) = prepare_dynamic(problem, AnalysisType::Spectral, options, sink)?;

        let k = condensation.condense_matrix(&matrices.k);
        let m = condensation.condense_matrix(&matrices.m);
        let c = condensation.condense_matrix(&matrices.c);

        let forced = find_forced_dofs(problem, &condensation);
        if forced.is_empty() {
            log::warn!("no DOF is driven by an input spectrum");
        }

        let columns = output_columns(problem);
        let outputs: Vec<Option<usize>> = columns
            .iter()
            .map(|key| key.global_index(problem).and_then(|i| condensation.free_index(i)))
            .collect();
        let frequencies = load_range_rows(problem);

        let values = compute_transfer_functions(&k, &m, &c, &forced, &outputs, &frequencies);
        let transfer = TransferFunctions {
            frequencies: frequencies.clone(),
            inputs: forced.iter().map(|dof| dof.key).collect(),
            outputs: columns.clone(),
            values,
        };

        if !options.spectra {
            return Ok(AnalysisOutput::Transfer(transfer));
        }

        let Some(spectra) = compute_output_spectra(&transfer.values, &forced, &frequencies) else {
            return Ok(AnalysisOutput::Nothing);
        };
        let mut table = ResultTable::new("output spectra", "frequency", columns);
        for (row, &omega) in frequencies.iter().enumerate() {
            let values: Vec<f64> = spectra.row(row).iter().copied().collect();
            table.push_row(format!("{:.4}", omega), omega, &values);
        }
        Ok(AnalysisOutput::Spectra {
            transfer,
            spectra: table,
        })
    }
}
