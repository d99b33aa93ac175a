//! Direct solution of condensed linear systems

use crate::math::{Factorization, Mat, Vec as FEVec};

/// Solve `K d = F` once. Returns `None` if `K` is singular.
pub fn solve_displacements(k: &Mat, f: &FEVec) -> Option<FEVec> {
    let factorization = Factorization::new(k)?;
    let d = factorization.solve(f)?;
    log::debug!("solved {} equations", d.len());
    Some(d)
}

/// Solve `K d = F` for a sequence of right-hand sides with one factorization
pub fn solve_many(k: &Mat, rhs: &[FEVec]) -> Option<Vec<FEVec>> {
    let factorization = Factorization::new(k)?;
    rhs.iter().map(|f| factorization.solve(f)).collect()
}
