//! Least squares with a matrix right-hand side.
//!
//! Solves
//!
//! ```text
//! min_O ‖D O − R‖²_F + λ ‖O‖²_F
//! ```
//!
//! by an SVD of `D`, or of `[D; √λ I]` when `λ > 0`. Rank-deficient problems
//! are not an error: they yield the minimum-norm solution and a large (or
//! infinite) condition number, and the caller decides whether the fit is
//! acceptable.
//!
//! # Example
//!
//! ```ignore
//! use opinf_solvers::lstsq;
//!
//! let solution = lstsq::solve(&data, &rhs, &lstsq::Config::default())?;
//! println!("cond = {:.3e}", solution.condition);
//! ```

mod config;
mod error;
mod solution;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use solution::Solution;

use nalgebra::DMatrix;

/// Solves the least-squares problem `D O ≈ R`.
///
/// # Errors
///
/// Returns an error if `data` and `rhs` have different row counts, if either
/// is empty, if either holds non-finite values, or if the decomposition fails.
pub fn solve(data: &DMatrix<f64>, rhs: &DMatrix<f64>, config: &Config) -> Result<Solution, Error> {
    if data.nrows() != rhs.nrows() {
        return Err(Error::RowMismatch {
            data: data.nrows(),
            rhs: rhs.nrows(),
        });
    }
    if data.is_empty() || rhs.is_empty() {
        return Err(Error::Empty {
            data: data.shape(),
            rhs: rhs.shape(),
        });
    }
    if data.iter().chain(rhs.iter()).any(|v| !v.is_finite()) {
        return Err(Error::NonFinite);
    }

    let condition = condition_number(data);

    let lambda = config.regularization();
    let svd = if lambda > 0.0 {
        regularized(data, lambda).svd(true, true)
    } else {
        data.clone().svd(true, true)
    };
    let cutoff = config.rcond() * svd.singular_values.max();
    let rank = svd.rank(cutoff);

    let solved = if lambda > 0.0 {
        let target = rhs.clone().resize_vertically(rhs.nrows() + data.ncols(), 0.0);
        svd.solve(&target, cutoff)
    } else {
        svd.solve(rhs, cutoff)
    };
    let coefficients = solved.map_err(Error::Decomposition)?;

    let residual = (data * &coefficients - rhs).norm_squared();

    log::debug!(
        "lstsq: data {:?}, rank {rank}, cond {condition:.3e}, residual {residual:.3e}",
        data.shape()
    );

    Ok(Solution {
        coefficients,
        condition,
        residual,
        rank,
    })
}

/// Two-norm condition number `σ_max / σ_min` of a matrix, over its
/// `min(rows, cols)` singular values.
///
/// Returns `f64::INFINITY` when the smallest of those is zero.
#[must_use]
pub fn condition_number(matrix: &DMatrix<f64>) -> f64 {
    let sigma = matrix.singular_values();
    let (max, min) = (sigma.max(), sigma.min());
    if min > 0.0 { max / min } else { f64::INFINITY }
}

/// Stacks `√λ I` beneath the data matrix.
fn regularized(data: &DMatrix<f64>, lambda: f64) -> DMatrix<f64> {
    let (k, d) = data.shape();
    let mut stacked = data.clone().resize_vertically(k + d, 0.0);
    stacked.view_mut((k, 0), (d, d)).fill_diagonal(lambda.sqrt());
    stacked
}
