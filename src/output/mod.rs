//! Output adapters
//!
//! The pipeline hands every artifact it produces to an [`OutputSink`].
//! Rendering is fire-and-forget: a sink that fails to write logs a warning
//! and carries on. Only the matrix export reports failure, since a requested
//! export file that was never written is fatal to the run.
//!
//! [`TextReporter`] is the stock sink: fixed-width tables and ASCII plots on
//! any [`std::io::Write`]. The free functions cover the file outputs of the
//! command line driver.

mod export;
mod plot;
mod preview;
mod text;

use std::path::Path;

use crate::error::FeltResult;
use crate::math::Mat;
use crate::results::{
    EigenResults, ModalMatrices, ResultTable, StaticResults, TemperatureResults, TransferFunctions,
};

pub use export::{export_matrices, write_graphics_file, write_material_statistics, GraphicsFile};
pub use plot::ascii_plot;
pub use preview::draw_structure_ascii;
pub use text::TextReporter;

/// Receiver of everything a run reports
pub trait OutputSink {
    /// Assembled global matrices, in the order given
    fn render_matrices(&mut self, matrices: &[(&str, &Mat)]);

    fn render_static(&mut self, results: &StaticResults);

    fn render_temperatures(&mut self, results: &TemperatureResults);

    /// Load case, load range, transient and spectra tables
    fn render_table(&mut self, table: &ResultTable);

    fn render_eigen(&mut self, eigen: &EigenResults);

    fn render_modal_matrices(&mut self, matrices: &ModalMatrices);

    fn render_transfer_functions(&mut self, transfer: &TransferFunctions);

    fn plot_table(&mut self, _table: &ResultTable) {}

    fn plot_eigen(&mut self, _eigen: &EigenResults) {}

    fn plot_transfer_functions(&mut self, _transfer: &TransferFunctions) {}

    /// Write `M`, `C` and `K` to `path`; empty matrices are skipped
    fn export_matrices(&mut self, path: &Path, m: &Mat, c: &Mat, k: &Mat) -> FeltResult<()> {
        export_matrices(path, m, c, k)
    }
}
