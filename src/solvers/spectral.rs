//! Random vibration: transfer functions and output power spectra

use std::sync::Arc;

use crate::assembly::Condensation;
use crate::loads::Force;
use crate::math::{dynamic_stiffness, CVec, Mat};
use crate::model::Problem;
use crate::results::DofKey;
use nalgebra::Complex;

/// A DOF driven by an input power spectrum
#[derive(Debug, Clone)]
pub struct ForcedDof {
    pub key: DofKey,
    /// Position in the condensed system
    pub index: usize,
    pub force: Arc<Force>,
}

impl ForcedDof {
    /// Input spectrum at circular frequency `omega`
    pub fn spectrum(&self, omega: f64) -> f64 {
        self.force.spectrum(self.key.dof, omega)
    }
}

/// Every unconstrained active DOF whose nodal force carries a spectrum
pub fn find_forced_dofs(problem: &Problem, condensation: &Condensation) -> Vec<ForcedDof> {
    let map = problem.dof_map();
    let mut forced = Vec::new();
    for node in &problem.nodes {
        let Some(force) = &node.force else { continue };
        for &dof in map.active() {
            if !force.has_spectrum(dof) {
                continue;
            }
            let index = map
                .global_index(node.eq_position(), dof)
                .and_then(|i| condensation.free_index(i));
            if let Some(index) = index {
                forced.push(ForcedDof {
                    key: DofKey::new(node.number, dof),
                    index,
                    force: Arc::clone(force),
                });
            }
        }
    }
    forced
}

/// Transfer function magnitudes `|H(omega)|` from each forced DOF to each output.
///
/// `outputs` are condensed positions (`None` for constrained outputs, whose
/// response is zero). Returns one `frequencies x outputs` matrix per forced
/// DOF; no forced DOFs gives an empty set.
pub fn compute_transfer_functions(
    k: &Mat,
    m: &Mat,
    c: &Mat,
    forced: &[ForcedDof],
    outputs: &[Option<usize>],
    frequencies: &[f64],
) -> Vec<Mat> {
    if forced.is_empty() {
        return Vec::new();
    }

    let mut h: Vec<Mat> = forced
        .iter()
        .map(|_| Mat::zeros(frequencies.len(), outputs.len()))
        .collect();

    for (row, &omega) in frequencies.iter().enumerate() {
        let lu = dynamic_stiffness(k, m, c, omega).lu();
        for (input, dof) in forced.iter().enumerate() {
            let mut unit = CVec::zeros(k.nrows());
            unit[dof.index] = Complex::new(1.0, 0.0);
            match lu.solve(&unit) {
                Some(response) => {
                    for (j, output) in outputs.iter().enumerate() {
                        h[input][(row, j)] = output.map_or(0.0, |i| response[i].norm());
                    }
                }
                None => {
                    log::warn!("dynamic stiffness is singular at omega = {}", omega);
                    h[input].row_mut(row).fill(f64::INFINITY);
                }
            }
        }
    }
    h
}

/// Output power spectra `S_j(omega) = sum_k |H_jk(omega)|^2 S_k(omega)`.
///
/// Returns `None` when there are no transfer functions to combine.
pub fn compute_output_spectra(h: &[Mat], forced: &[ForcedDof], frequencies: &[f64]) -> Option<Mat> {
    let first = h.first()?;
    let mut spectra = Mat::zeros(first.nrows(), first.ncols());
    for (transfer, dof) in h.iter().zip(forced) {
        for (row, &omega) in frequencies.iter().enumerate() {
            let input = dof.spectrum(omega);
            for j in 0..transfer.ncols() {
                spectra[(row, j)] += transfer[(row, j)].powi(2) * input;
            }
        }
    }
    Some(spectra)
}
