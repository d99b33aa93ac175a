//! Fixed-width text reporter

use std::io::{self, Write};

use super::plot::ascii_plot;
use super::OutputSink;
use crate::dofs::Dof;
use crate::math::Mat;
use crate::results::{
    EigenResults, ElementStress, ModalMatrices, ResultTable, StaticResults, TemperatureResults,
    TransferFunctions,
};

const COLUMN: usize = 14;

/// Renders results as text tables and ASCII plots
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, what: &str, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if let Err(err) = write(&mut self.out) {
            log::warn!("could not write {}: {}", what, err);
        }
    }
}

fn rule(out: &mut impl Write, width: usize) -> io::Result<()> {
    writeln!(out, "{:─^1$}", "", width)
}

fn heading(out: &mut impl Write, title: &str, width: usize) -> io::Result<()> {
    writeln!(out)?;
    rule(out, width)?;
    writeln!(out, "{: ^1$}", title.to_uppercase(), width)?;
    rule(out, width)
}

fn write_matrix(out: &mut impl Write, name: &str, matrix: &Mat) -> io::Result<()> {
    let width = (matrix.ncols() * COLUMN).max(COLUMN);
    heading(out, name, width)?;
    for row in matrix.row_iter() {
        for value in row.iter() {
            write!(out, "{:>1$.5e}", value, COLUMN)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_table(out: &mut impl Write, table: &ResultTable) -> io::Result<()> {
    let width = COLUMN * (table.columns.len() + 1);
    heading(out, &table.title, width)?;
    write!(out, "{:>1$}", table.row_label, COLUMN)?;
    for key in &table.columns {
        write!(out, "{:>1$}", key.to_string(), COLUMN)?;
    }
    writeln!(out)?;
    rule(out, width)?;
    for (i, label) in table.rows.iter().enumerate() {
        write!(out, "{:>1$}", label, COLUMN)?;
        for value in table.values.row(i).iter() {
            write!(out, "{:>1$.6e}", value, COLUMN)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_stresses(out: &mut impl Write, title: &str, stresses: &[ElementStress]) -> io::Result<()> {
    let columns = stresses.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let width = COLUMN * (columns + 2);
    heading(out, title, width)?;
    for stress in stresses {
        write!(out, "{:>1$}", stress.element, COLUMN)?;
        write!(out, "{:>1$}", stress.definition, COLUMN)?;
        for value in &stress.values {
            write!(out, "{:>1$.5e}", value, COLUMN)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// DOFs with a nonzero displacement or a reaction anywhere; `Tx` when none do
fn reported_dofs(results: &StaticResults) -> Vec<Dof> {
    let dofs: Vec<Dof> = Dof::ALL
        .into_iter()
        .filter(|&dof| {
            results.displacements.iter().any(|d| d.get(dof) != 0.0)
                || results.reactions.iter().any(|r| r.dof == dof)
        })
        .collect();
    if dofs.is_empty() {
        vec![Dof::Tx]
    } else {
        dofs
    }
}

fn plot_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    writeln!(out)?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn table_plot(table: &ResultTable) -> Vec<String> {
    let series: Vec<(String, Vec<f64>)> = table
        .columns
        .iter()
        .enumerate()
        .map(|(j, key)| (key.to_string(), table.values.column(j).iter().copied().collect()))
        .collect();
    ascii_plot(&table.title, &table.abscissa, &series)
}

impl<W: Write> OutputSink for TextReporter<W> {
    fn render_matrices(&mut self, matrices: &[(&str, &Mat)]) {
        self.emit("matrices", |out| {
            for (name, matrix) in matrices {
                write_matrix(out, name, matrix)?;
            }
            Ok(())
        });
    }

    fn render_static(&mut self, results: &StaticResults) {
        let dofs = reported_dofs(results);
        self.emit("static results", |out| {
            let width = COLUMN * (dofs.len() + 1);
            heading(out, "nodal displacements", width)?;
            write!(out, "{:>1$}", "node", COLUMN)?;
            for dof in &dofs {
                write!(out, "{:>1$}", dof.label(), COLUMN)?;
            }
            writeln!(out)?;
            rule(out, width)?;
            for displacement in &results.displacements {
                write!(out, "{:>1$}", displacement.node, COLUMN)?;
                for &dof in &dofs {
                    write!(out, "{:>1$.6e}", displacement.get(dof), COLUMN)?;
                }
                writeln!(out)?;
            }

            heading(out, "reaction forces", COLUMN * 3)?;
            for reaction in &results.reactions {
                writeln!(
                    out,
                    "{:>w$}{:>w$}{:>w$.6e}",
                    reaction.node,
                    reaction.dof.label(),
                    reaction.force,
                    w = COLUMN
                )?;
            }

            write_stresses(out, "element stresses", &results.stresses)?;

            let summary = &results.summary;
            writeln!(out)?;
            writeln!(
                out,
                "max displacement {:.6e} at node {}, max reaction {:.6e} at node {}",
                summary.max_displacement,
                summary.max_disp_node,
                summary.max_reaction,
                summary.max_reaction_node
            )?;
            writeln!(
                out,
                "{} nodes, {} elements, {} of {} DOFs free",
                summary.num_nodes, summary.num_elements, summary.free_dofs, summary.total_dofs
            )
        });
    }

    fn render_temperatures(&mut self, results: &TemperatureResults) {
        self.emit("temperatures", |out| {
            heading(out, "nodal temperatures", COLUMN * 2)?;
            for t in &results.temperatures {
                writeln!(out, "{:>w$}{:>w$.6e}", t.node, t.temperature, w = COLUMN)?;
            }
            write_stresses(out, "element heat fluxes", &results.fluxes)
        });
    }

    fn render_table(&mut self, table: &ResultTable) {
        self.emit("result table", |out| write_table(out, table));
    }

    fn render_eigen(&mut self, eigen: &EigenResults) {
        self.emit("eigen results", |out| {
            heading(out, "eigenvalues", COLUMN * 3)?;
            write!(out, "{:>w$}{:>w$}{:>w$}", "mode", "eigenvalue", "freq (Hz)", w = COLUMN)?;
            writeln!(out)?;
            for (i, (lambda, hz)) in eigen.eigenvalues.iter().zip(eigen.frequencies()).enumerate() {
                writeln!(out, "{:>w$}{:>w$.6e}{:>w$.6e}", i + 1, lambda, hz, w = COLUMN)?;
            }

            let width = COLUMN * (eigen.modes.ncols() + 1);
            heading(out, "mode shapes", width)?;
            write!(out, "{:>1$}", "dof", COLUMN)?;
            for mode in 1..=eigen.modes.ncols() {
                write!(out, "{:>1$}", format!("mode {}", mode), COLUMN)?;
            }
            writeln!(out)?;
            for (row, key) in eigen.dofs.iter().enumerate() {
                write!(out, "{:>1$}", key.to_string(), COLUMN)?;
                for value in eigen.modes.row(row).iter() {
                    write!(out, "{:>1$.5e}", value, COLUMN)?;
                }
                writeln!(out)?;
            }
            Ok(())
        });
    }

    fn render_modal_matrices(&mut self, matrices: &ModalMatrices) {
        self.emit("modal matrices", |out| {
            let suffix = if matrices.orthonormal { " (orthonormal)" } else { "" };
            write_matrix(out, &format!("modal mass{}", suffix), &matrices.mass)?;
            write_matrix(out, &format!("modal damping{}", suffix), &matrices.damping)?;
            write_matrix(out, &format!("modal stiffness{}", suffix), &matrices.stiffness)
        });
    }

    fn render_transfer_functions(&mut self, transfer: &TransferFunctions) {
        self.emit("transfer functions", |out| {
            if transfer.is_empty() {
                return writeln!(out, "no forced DOFs: no transfer functions");
            }
            for input in 0..transfer.inputs.len() {
                write_table(out, &transfer.table(input))?;
            }
            Ok(())
        });
    }

    fn plot_table(&mut self, table: &ResultTable) {
        let lines = table_plot(table);
        self.emit("plot", |out| plot_lines(out, &lines));
    }

    fn plot_eigen(&mut self, eigen: &EigenResults) {
        let x: Vec<f64> = (1..=eigen.dofs.len()).map(|i| i as f64).collect();
        let series: Vec<(String, Vec<f64>)> = eigen
            .modes
            .column_iter()
            .enumerate()
            .map(|(j, column)| (format!("mode {}", j + 1), column.iter().copied().collect()))
            .collect();
        let lines = ascii_plot("mode shapes", &x, &series);
        self.emit("plot", |out| plot_lines(out, &lines));
    }

    fn plot_transfer_functions(&mut self, transfer: &TransferFunctions) {
        for input in 0..transfer.inputs.len() {
            let lines = table_plot(&transfer.table(input));
            self.emit("plot", |out| plot_lines(out, &lines));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{DofKey, NodeDisplacement, Reaction};

    fn rendered(render: impl FnOnce(&mut TextReporter<Vec<u8>>)) -> String {
        let mut reporter = TextReporter::new(Vec::new());
        render(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_static_report_shows_only_used_dofs() {
        let results = StaticResults {
            displacements: vec![
                NodeDisplacement::from_array(1, [0.0; 6]),
                NodeDisplacement::from_array(2, [0.5, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            reactions: vec![Reaction {
                node: 1,
                dof: Dof::Tx,
                force: -10.0,
            }],
            stresses: Vec::new(),
            summary: Default::default(),
        };
        let text = rendered(|r| r.render_static(&results));
        assert!(text.contains("NODAL DISPLACEMENTS"));
        assert!(text.contains("Tx"));
        assert!(!text.contains("Ry"));
        assert!(text.contains("5.000000e-1"));
    }

    #[test]
    fn test_table_rows_and_headers() {
        let mut table = ResultTable::new("load cases", "case", vec![DofKey::new(3, Dof::Ty)]);
        table.push_row("dead".into(), 1.0, &[-0.25]);
        let text = rendered(|r| r.render_table(&table));
        assert!(text.contains("Ty(3)"));
        assert!(text.lines().any(|l| l.contains("dead") && l.contains("-2.500000e-1")));
    }

    #[test]
    fn test_empty_transfer_functions() {
        let transfer = TransferFunctions {
            frequencies: vec![1.0],
            inputs: Vec::new(),
            outputs: Vec::new(),
            values: Vec::new(),
        };
        let text = rendered(|r| r.render_transfer_functions(&transfer));
        assert!(text.contains("no forced DOFs"));
    }
}
