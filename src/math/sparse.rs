//! Sparse matrix utilities for assembly and direct solves
//!
//! Global matrices are assembled from element contributions as COO triplets,
//! the static solve uses a skyline (profile) Cholesky factorization, and node
//! renumbering runs reverse Cuthill-McKee over a CSR adjacency pattern.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse matrix builder using COO format
/// More efficient for incremental assembly
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // Line elements with up to 3 DOFs per node couple roughly 18 entries per row
        let estimated_nnz = size * 18;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.entries.push((row, col, value));
        }
    }

    /// Convert to CSR format; duplicate entries are summed
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Convert to a dense matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);

        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }

        mat
    }

    /// Build a builder holding every significant entry of a dense matrix
    pub fn from_dense(a: &DMatrix<f64>) -> Self {
        let mut builder = Self::new(a.nrows());
        for col in 0..a.ncols() {
            for row in 0..a.nrows() {
                builder.add(row, col, a[(row, col)]);
            }
        }
        builder
    }

    /// Get estimated non-zero count
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

/// Skyline Cholesky solver for symmetric positive definite matrices
///
/// Only the lower triangle within each row's profile is stored, which keeps
/// the factorization cheap for banded stiffness matrices.
pub struct SkylineSolver {
    size: usize,
    // Skyline storage: for each row, store from first non-zero to diagonal
    skyline: Vec<Vec<f64>>,
    // Row heights (distance from diagonal to first non-zero on the left)
    heights: Vec<usize>,
}

impl SkylineSolver {
    /// Create solver storage from a CSR matrix (lower triangle is read)
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _val) in csr.triplet_iter() {
            if col < row {
                let height = row - col;
                if height > heights[row] {
                    heights[row] = height;
                }
            }
        }

        let mut skyline: Vec<Vec<f64>> = Vec::with_capacity(size);
        for &height in &heights {
            skyline.push(vec![0.0; height + 1]);
        }

        for (row, col, &val) in csr.triplet_iter() {
            if col <= row && col >= row - heights[row] {
                let idx = col - (row - heights[row]);
                skyline[row][idx] += val;
            }
        }

        Self {
            size,
            skyline,
            heights,
        }
    }

    /// Factorize the matrix in place (L * L^T)
    pub fn factorize(&mut self) -> Result<(), &'static str> {
        for i in 0..self.size {
            let hi = self.heights[i];
            let start_i = i - hi;

            for j in start_i..i {
                let hj = self.heights[j];
                let start_j = j - hj;

                let start = start_i.max(start_j);
                let mut sum = 0.0;
                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }

                let diag_j = self.skyline[j][hj];
                if diag_j.abs() < 1e-15 {
                    return Err("Zero pivot in Cholesky factorization");
                }

                let idx = j - start_i;
                self.skyline[i][idx] = (self.skyline[i][idx] - sum) / diag_j;
            }

            let mut sum = 0.0;
            for j in start_i..i {
                let val = self.get(i, j);
                sum += val * val;
            }

            let diag = self.skyline[i][hi] - sum;
            if diag <= 0.0 {
                return Err("Matrix not positive definite");
            }
            self.skyline[i][hi] = diag.sqrt();
        }

        Ok(())
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        if col > row {
            return self.get(col, row);
        }
        let h = self.heights[row];
        let start = row - h;
        if col < start {
            return 0.0;
        }
        self.skyline[row][col - start]
    }

    /// Solve L * L^T * x = b with a factorized matrix
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let mut x = b.clone();

        // Forward substitution: L * y = b
        for i in 0..self.size {
            let start = i - self.heights[i];
            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }

        // Backward substitution: L^T * x = y
        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);
            let start = i - self.heights[i];
            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        x
    }

    /// Number of stored entries (the profile)
    pub fn profile(&self) -> usize {
        self.heights.iter().map(|h| h + 1).sum()
    }
}

/// Bandwidth reduction using Reverse Cuthill-McKee algorithm
///
/// Returns a permutation vector: `perm[new_index] = old_index`
pub fn reverse_cuthill_mckee(csr: &CsrMatrix<f64>) -> Vec<usize> {
    let n = csr.nrows();
    if n == 0 {
        return vec![];
    }

    // Build adjacency list
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (row, col, &val) in csr.triplet_iter() {
        if val.abs() > 1e-15 && row != col && !adj[row].contains(&col) {
            adj[row].push(col);
        }
    }

    let degrees: Vec<usize> = adj.iter().map(|v| v.len()).collect();

    // Sort adjacencies by degree (for tie-breaking)
    for neighbors in &mut adj {
        neighbors.sort_by_key(|&i| (degrees[i], i));
    }

    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut queue = std::collections::VecDeque::new();

    // Start from node with minimum degree
    let start = (0..n).min_by_key(|&i| degrees[i]).unwrap_or(0);

    queue.push_back(start);
    visited[start] = true;

    while let Some(node) = queue.pop_front() {
        result.push(node);

        for &neighbor in &adj[node] {
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }

        // Handle disconnected components
        if queue.is_empty() && result.len() < n {
            if let Some(next) = (0..n)
                .filter(|&i| !visited[i])
                .min_by_key(|&i| degrees[i])
            {
                queue.push_back(next);
                visited[next] = true;
            }
        }
    }

    result.reverse();
    result
}

/// Create inverse permutation: `inv[old_index] = new_index`
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        inv[old_idx] = new_idx;
    }
    inv
}

/// Half bandwidth of a symmetric pattern after relabelling rows with `position`
pub fn bandwidth(csr: &CsrMatrix<f64>, position: &[usize]) -> usize {
    csr.triplet_iter()
        .map(|(row, col, _)| position[row].abs_diff(position[col]))
        .max()
        .unwrap_or(0)
}
