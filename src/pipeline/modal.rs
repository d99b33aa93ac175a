use super::transient::prepare_dynamic;
use super::{AnalysisOutput, AnalysisStrategy, RunOptions};
use crate::analysis::AnalysisType;
use crate::error::FeltResult;
use crate::math::Mat;
use crate::model::Problem;
use crate::output::OutputSink;
use crate::results::{DofKey, EigenResults};
use crate::solvers::{compute_eigen_modes, form_modal_matrices};

pub(super) struct ModalStrategy;

impl super::sealed::Sealed for ModalStrategy {}

impl AnalysisStrategy for ModalStrategy {
    fn run(
        &self,
        problem: &mut Problem,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> FeltResult<AnalysisOutput> {
        let (matrices, condensation) = prepare_dynamic(problem, AnalysisType::Modal, options, sink)?;

        let k = condensation.condense_matrix(&matrices.k);
        let m = condensation.condense_matrix(&matrices.m);
        let c = condensation.condense_matrix(&matrices.c);
        let (eigenvalues, x) = compute_eigen_modes(&k, &m)?;
        log::info!("{} modes found", eigenvalues.len());

        // Mode shape rows in node input order, whatever the numbering
        let full = condensation.expand_modes(&x);
        let keys = DofKey::all(problem);
        let mut modes = Mat::zeros(keys.len(), full.ncols());
        for (row, key) in keys.iter().enumerate() {
            if let Some(index) = key.global_index(problem) {
                modes.row_mut(row).copy_from(&full.row(index));
            }
        }

        let eigen = EigenResults {
            eigenvalues,
            dofs: keys,
            modes,
        };
        let matrices = options
            .modal
            .then(|| form_modal_matrices(&x, &m, &c, &k, options.orthonormal));
        Ok(AnalysisOutput::Modal { eigen, matrices })
    }
}
