use nalgebra::DMatrix;

/// The result of a least-squares solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Minimizer `O`, with one column per right-hand side column.
    pub coefficients: DMatrix<f64>,

    /// Two-norm condition number of the (unregularized) data matrix.
    ///
    /// Taken as `σ_max / σ_min` over its `min(k, d)` singular values, so a
    /// wide matrix stays finite; infinite only when one of those is zero.
    pub condition: f64,

    /// Squared Frobenius norm of the data misfit `‖D O − R‖²`.
    pub residual: f64,

    /// Numerical rank of the matrix that was actually decomposed.
    pub rank: usize,
}
