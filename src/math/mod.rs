//! Mathematical utilities for FEA calculations

pub mod sparse;

use nalgebra::linalg::LU;
use nalgebra::{Complex, DMatrix, DVector, Dyn};

pub use sparse::{
    bandwidth, inverse_permutation, reverse_cuthill_mckee, SkylineSolver, SparseMatrixBuilder,
};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type CMat = DMatrix<Complex<f64>>;
pub type CVec = DVector<Complex<f64>>;

/// Euclidean distance between two points
pub fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Transformation matrix (6x6) of a 2D frame element with direction cosines `c`, `s`
///
/// Maps global [Tx, Ty, Rz] pairs to local [axial, transverse, rotation] pairs.
pub fn plane_frame_transformation(c: f64, s: f64) -> Mat {
    let mut t = Mat::zeros(6, 6);
    for offset in [0, 3] {
        t[(offset, offset)] = c;
        t[(offset, offset + 1)] = s;
        t[(offset + 1, offset)] = -s;
        t[(offset + 1, offset + 1)] = c;
        t[(offset + 2, offset + 2)] = 1.0;
    }
    t
}

/// Check symmetry to a relative tolerance
pub fn is_symmetric(a: &Mat, tol: f64) -> bool {
    if a.nrows() != a.ncols() {
        return false;
    }
    let scale = a.amax().max(1.0);
    for i in 0..a.nrows() {
        for j in (i + 1)..a.ncols() {
            if (a[(i, j)] - a[(j, i)]).abs() > tol * scale {
                return false;
            }
        }
    }
    true
}

/// A factorized coefficient matrix that can be reused for many right-hand sides
pub enum Factorization {
    /// Profile Cholesky factorization of a symmetric positive definite matrix
    Skyline(SkylineSolver),
    /// General LU factorization
    Lu(LU<f64, Dyn, Dyn>),
}

impl Factorization {
    /// Factorize `a`, trying the skyline Cholesky first and falling back to LU.
    ///
    /// Returns `None` when the matrix is singular.
    pub fn new(a: &Mat) -> Option<Self> {
        if a.nrows() == 0 || a.nrows() != a.ncols() {
            return None;
        }

        if is_symmetric(a, 1e-10) {
            let mut skyline = SkylineSolver::new(&SparseMatrixBuilder::from_dense(a).to_csr());
            match skyline.factorize() {
                Ok(()) => return Some(Self::Skyline(skyline)),
                Err(reason) => log::debug!("skyline factorization failed ({}), using LU", reason),
            }
        }

        let lu = a.clone().lu();
        if !lu.is_invertible() {
            return None;
        }
        Some(Self::Lu(lu))
    }

    /// Solve for one right-hand side
    pub fn solve(&self, b: &Vec) -> Option<Vec> {
        let x = match self {
            Self::Skyline(skyline) => skyline.solve(b),
            Self::Lu(lu) => lu.solve(b)?,
        };
        if x.iter().all(|v| v.is_finite()) {
            Some(x)
        } else {
            None
        }
    }
}

/// Solve K * d = F for a single right-hand side
pub fn solve_direct(a: &Mat, b: &Vec) -> Option<Vec> {
    Factorization::new(a)?.solve(b)
}

/// Build a complex dynamic stiffness `K - w^2 M + i w C`
pub fn dynamic_stiffness(k: &Mat, m: &Mat, c: &Mat, omega: f64) -> CMat {
    CMat::from_fn(k.nrows(), k.ncols(), |i, j| {
        Complex::new(k[(i, j)] - omega * omega * m[(i, j)], omega * c[(i, j)])
    })
}
