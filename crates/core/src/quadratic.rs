//! Kronecker and half-vectorized quadratic forms.
//!
//! A quadratic vector field can be written two ways:
//!
//! ```text
//! H (x ⊗ x)  ==  F (x ⊙ x)
//! ```
//!
//! where `x ⊗ x` has all `r²` products `x_i x_j` and `x ⊙ x` keeps only the
//! `r(r+1)/2` unique ones, ordered as `x_0 x_0, x_1 x_0, x_1 x_1, x_2 x_0, …`
//! (row `i`, then `j = 0..=i`). Converting `F` to `H` splits each off-diagonal
//! coefficient evenly between the two symmetric Kronecker columns.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Errors raised when a matrix cannot be interpreted as a quadratic operator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuadraticError {
    #[error("{columns} columns is not r(r+1)/2 for any r")]
    NotTriangular { columns: usize },

    #[error("{columns} columns is not r^2 for any r")]
    NotSquare { columns: usize },
}

/// Number of unique quadratic products for a state of dimension `r`.
#[must_use]
pub fn compressed_len(r: usize) -> usize {
    r * (r + 1) / 2
}

/// Column of `x_i x_j` (with `j <= i`) in the half-vectorized form.
#[inline]
fn compressed_index(i: usize, j: usize) -> usize {
    i * (i + 1) / 2 + j
}

/// Recovers `r` from a half-vectorized column count, if it is triangular.
#[must_use]
pub fn dim_from_compressed(columns: usize) -> Option<usize> {
    // r is at most sqrt(2 * columns); search a tiny window around it.
    let guess = ((2 * columns) as f64).sqrt() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|&r| compressed_len(r) == columns)
}

/// Recovers `r` from a Kronecker column count, if it is a perfect square.
#[must_use]
pub fn dim_from_kron(columns: usize) -> Option<usize> {
    let guess = (columns as f64).sqrt() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|&r| r * r == columns)
}

/// Full Kronecker square `x ⊗ x` (length `r²`).
#[must_use]
pub fn kron2(x: &DVector<f64>) -> DVector<f64> {
    let r = x.len();
    DVector::from_fn(r * r, |idx, _| x[idx / r] * x[idx % r])
}

/// Half-vectorized square `x ⊙ x` (length `r(r+1)/2`).
#[must_use]
pub fn kron2c(x: &DVector<f64>) -> DVector<f64> {
    let r = x.len();
    let mut out = DVector::zeros(compressed_len(r));
    for i in 0..r {
        for j in 0..=i {
            out[compressed_index(i, j)] = x[i] * x[j];
        }
    }
    out
}

/// Applies [`kron2c`] to every column of `x`.
#[must_use]
pub fn kron2c_columns(x: &DMatrix<f64>) -> DMatrix<f64> {
    let (r, k) = x.shape();
    let mut out = DMatrix::zeros(compressed_len(r), k);
    for (col, mut out_col) in x.column_iter().zip(out.column_iter_mut()) {
        for i in 0..r {
            for j in 0..=i {
                out_col[compressed_index(i, j)] = col[i] * col[j];
            }
        }
    }
    out
}

/// Converts a half-vectorized operator `F` (`r × r(r+1)/2`) to `H` (`r × r²`).
///
/// # Errors
///
/// Returns an error if the column count of `f` is not triangular.
pub fn f2h(f: &DMatrix<f64>) -> Result<DMatrix<f64>, QuadraticError> {
    let columns = f.ncols();
    let r = dim_from_compressed(columns).ok_or(QuadraticError::NotTriangular { columns })?;

    let mut h = DMatrix::zeros(f.nrows(), r * r);
    for i in 0..r {
        for j in 0..=i {
            let src = f.column(compressed_index(i, j));
            if i == j {
                h.set_column(i * r + i, &src);
            } else {
                let half = src * 0.5;
                h.set_column(i * r + j, &half);
                h.set_column(j * r + i, &half);
            }
        }
    }
    Ok(h)
}

/// Converts a Kronecker operator `H` (`r × r²`) to `F` (`r × r(r+1)/2`).
///
/// Symmetric column pairs of `H` are summed, so the vector field is preserved
/// even when `H` is not symmetric in its Kronecker indices.
///
/// # Errors
///
/// Returns an error if the column count of `h` is not a perfect square.
pub fn h2f(h: &DMatrix<f64>) -> Result<DMatrix<f64>, QuadraticError> {
    let columns = h.ncols();
    let r = dim_from_kron(columns).ok_or(QuadraticError::NotSquare { columns })?;

    let mut f = DMatrix::zeros(h.nrows(), compressed_len(r));
    for i in 0..r {
        for j in 0..=i {
            let dst = compressed_index(i, j);
            if i == j {
                f.set_column(dst, &h.column(i * r + i));
            } else {
                let sum = &h.column(i * r + j) + &h.column(j * r + i);
                f.set_column(dst, &sum);
            }
        }
    }
    Ok(f)
}

/// Projects a full-order Kronecker operator: `Vrᵀ H (Vr ⊗ Vr)`.
///
/// `Vr ⊗ Vr` (`n² × r²`) is never formed. Each row of `H` is viewed as an
/// `n × n` matrix `M_a` and contracted as `Vrᵀ M_a Vr`, which keeps memory at
/// `O(n r²)` on top of `H` itself. The caller guarantees `h` is `n × n²`.
#[must_use]
pub fn project_kron(h: &DMatrix<f64>, vr: &DMatrix<f64>) -> DMatrix<f64> {
    let (n, r) = vr.shape();
    let mut partial = DMatrix::zeros(n, r * r);
    for a in 0..n {
        let row = DMatrix::from_fn(n, n, |b, c| h[(a, b * n + c)]);
        let contracted = vr.tr_mul(&row) * vr;
        for j in 0..r {
            for k in 0..r {
                partial[(a, j * r + k)] = contracted[(j, k)];
            }
        }
    }
    vr.tr_mul(&partial)
}
