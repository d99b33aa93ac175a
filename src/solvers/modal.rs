//! Generalized symmetric eigenproblem `K x = lambda M x`

use nalgebra::SymmetricEigen;

use crate::error::{FeltError, FeltResult};
use crate::math::Mat;
use crate::results::ModalMatrices;

/// Solve `K x = lambda M x` for symmetric `K` and positive definite `M`.
///
/// The problem is reduced to standard form with the Cholesky factor of `M`.
/// Eigenvalues are returned in ascending order with the mode shapes as
/// matching columns, each normalized by its first significant entry.
pub fn compute_eigen_modes(k: &Mat, m: &Mat) -> FeltResult<(Vec<f64>, Mat)> {
    let n = k.nrows();
    if n == 0 {
        return Err(FeltError::EigenFailed("system has no free DOFs".to_string()));
    }

    let cholesky = m.clone().cholesky().ok_or(FeltError::NotPositiveDefinite)?;
    let l = cholesky.l();
    // A zero pivot passes the factorization but leaves a singular factor
    if l.diagonal().iter().any(|&v| !(v.is_finite() && v > 0.0)) {
        return Err(FeltError::NotPositiveDefinite);
    }

    // A = L^-1 K L^-T
    let left = l
        .solve_lower_triangular(k)
        .ok_or_else(|| FeltError::EigenFailed("singular Cholesky factor".to_string()))?;
    let a = l
        .solve_lower_triangular(&left.transpose())
        .ok_or_else(|| FeltError::EigenFailed("singular Cholesky factor".to_string()))?;
    let a = (&a + a.transpose()) * 0.5;

    let eigen = SymmetricEigen::new(a);
    if eigen.eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(FeltError::EigenFailed("eigenvalues did not converge".to_string()));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));

    let lambda: Vec<f64> = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let y = eigen.eigenvectors.select_columns(&order);
    let mut x = l
        .transpose()
        .solve_upper_triangular(&y)
        .ok_or_else(|| FeltError::EigenFailed("singular Cholesky factor".to_string()))?;

    normalize_by_first(&mut x);
    log::debug!("lowest eigenvalue {:.6e}", lambda[0]);
    Ok((lambda, x))
}

/// Scale each column so that its first significant entry is one
pub fn normalize_by_first(x: &mut Mat) {
    for mut column in x.column_iter_mut() {
        let threshold = column.amax() * 1e-8;
        if let Some(&first) = column.iter().find(|v| v.abs() > threshold) {
            column /= first;
        }
    }
}

/// Project the system matrices onto the mode shapes (`X^T A X`).
///
/// With `orthonormal`, the modes are first scaled to unit modal mass.
pub fn form_modal_matrices(x: &Mat, m: &Mat, c: &Mat, k: &Mat, orthonormal: bool) -> ModalMatrices {
    let mut x = x.clone();
    if orthonormal {
        for j in 0..x.ncols() {
            let column = x.column(j).clone_owned();
            let modal_mass = (column.transpose() * m * &column)[(0, 0)];
            if modal_mass > 0.0 {
                x.column_mut(j).scale_mut(1.0 / modal_mass.sqrt());
            }
        }
    }

    let xt = x.transpose();
    ModalMatrices {
        mass: &xt * m * &x,
        damping: &xt * c * &x,
        stiffness: &xt * k * &x,
        orthonormal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_mass_chain() -> (Mat, Mat) {
        let k = Mat::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 1.0]) * 100.0;
        let m = Mat::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]);
        (k, m)
    }

    #[test]
    fn test_modes_satisfy_generalized_problem() {
        let (k, m) = two_mass_chain();
        let (lambda, x) = compute_eigen_modes(&k, &m).unwrap();
        assert!(lambda[0] <= lambda[1]);
        for (j, &l) in lambda.iter().enumerate() {
            let v = x.column(j);
            let residual = &k * v - (&m * v) * l;
            assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-8);
            assert_relative_eq!(x[(0, j)], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_indefinite_mass_is_not_positive_definite() {
        let (k, _) = two_mass_chain();
        let m = Mat::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        assert!(matches!(
            compute_eigen_modes(&k, &m),
            Err(FeltError::NotPositiveDefinite)
        ));
    }

    #[test]
    fn test_orthonormal_modal_matrices_are_diagonal() {
        let (k, m) = two_mass_chain();
        let (lambda, x) = compute_eigen_modes(&k, &m).unwrap();
        let c = Mat::zeros(2, 2);
        let modal = form_modal_matrices(&x, &m, &c, &k, true);
        assert_relative_eq!(modal.mass[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(modal.mass[(0, 1)], 0.0, epsilon = 1e-10);
        assert_relative_eq!(modal.stiffness[(1, 1)], lambda[1], max_relative = 1e-8);
        assert_relative_eq!(modal.stiffness[(0, 1)], 0.0, epsilon = 1e-8);
    }
}
