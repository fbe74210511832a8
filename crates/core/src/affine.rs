use std::{fmt, sync::Arc};

use nalgebra::DMatrix;
use thiserror::Error;

/// A scalar coefficient function of the parameter.
pub type Coefficient = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Errors raised while building or evaluating an [`AffineOperator`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AffineError {
    #[error("expected {expected} matrices, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("affine operator matrix shapes do not match ({actual:?} != {expected:?})")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("coefficient function {index} returned non-scalar value {value} at parameter {parameter}")]
    NonScalarReturn {
        index: usize,
        parameter: f64,
        value: f64,
    },

    #[error("constituent matrices not initialized")]
    Uninitialized,

    #[error("affine operator has no coefficient functions")]
    Empty,
}

/// An operator that varies affinely with a scalar parameter.
///
/// Evaluates to `Σ_i θ_i(p) M_i` for coefficient functions `θ_i` and
/// constituent matrices `M_i` of one shared shape. The coefficients are fixed
/// at construction; the matrices may be attached later with
/// [`AffineOperator::set_matrices`].
#[derive(Clone)]
pub struct AffineOperator {
    coefficients: Vec<Coefficient>,
    matrices: Option<Vec<DMatrix<f64>>>,
}

impl AffineOperator {
    /// Creates an operator with coefficients only.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::Empty`] if `coefficients` is empty.
    pub fn new(coefficients: Vec<Coefficient>) -> Result<Self, AffineError> {
        if coefficients.is_empty() {
            return Err(AffineError::Empty);
        }
        Ok(Self {
            coefficients,
            matrices: None,
        })
    }

    /// Creates an operator with both coefficients and matrices.
    ///
    /// # Errors
    ///
    /// Fails as [`AffineOperator::new`] and [`AffineOperator::set_matrices`] do.
    pub fn with_matrices(
        coefficients: Vec<Coefficient>,
        matrices: Vec<DMatrix<f64>>,
    ) -> Result<Self, AffineError> {
        let mut op = Self::new(coefficients)?;
        op.set_matrices(matrices)?;
        Ok(op)
    }

    /// Attaches the constituent matrices, replacing any already attached.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::CountMismatch`] if there is not one matrix per
    /// coefficient, or [`AffineError::ShapeMismatch`] naming the first matrix
    /// whose shape differs from the first one.
    pub fn set_matrices(&mut self, matrices: Vec<DMatrix<f64>>) -> Result<(), AffineError> {
        if matrices.len() != self.coefficients.len() {
            return Err(AffineError::CountMismatch {
                expected: self.coefficients.len(),
                actual: matrices.len(),
            });
        }
        let expected = matrices[0].shape();
        if let Some(bad) = matrices.iter().find(|m| m.shape() != expected) {
            return Err(AffineError::ShapeMismatch {
                expected,
                actual: bad.shape(),
            });
        }
        self.matrices = Some(matrices);
        Ok(())
    }

    /// Number of affine terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Returns `true` if there are no affine terms, which `new` rules out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// The attached matrices, if any.
    #[must_use]
    pub fn matrices(&self) -> Option<&[DMatrix<f64>]> {
        self.matrices.as_deref()
    }

    /// Shape shared by the constituent matrices, once attached.
    #[must_use]
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.matrices.as_ref().map(|ms| ms[0].shape())
    }

    /// Evaluates each coefficient at `parameter`.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::NonScalarReturn`] for the first coefficient whose
    /// value is not a finite number.
    pub fn coefficients_at(&self, parameter: f64) -> Result<Vec<f64>, AffineError> {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(index, theta)| {
                let value = theta(parameter);
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(AffineError::NonScalarReturn {
                        index,
                        parameter,
                        value,
                    })
                }
            })
            .collect()
    }

    /// Checks that every coefficient yields a usable scalar at `sample`.
    ///
    /// # Errors
    ///
    /// See [`AffineOperator::coefficients_at`].
    pub fn validate_coefficients(&self, sample: f64) -> Result<(), AffineError> {
        self.coefficients_at(sample).map(|_| ())
    }

    /// Evaluates `Σ_i θ_i(parameter) M_i`.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::Uninitialized`] if no matrices are attached, or
    /// a coefficient error from [`AffineOperator::coefficients_at`].
    pub fn evaluate(&self, parameter: f64) -> Result<DMatrix<f64>, AffineError> {
        let matrices = self.matrices.as_ref().ok_or(AffineError::Uninitialized)?;
        let thetas = self.coefficients_at(parameter)?;
        let (rows, cols) = matrices[0].shape();
        Ok(thetas
            .iter()
            .zip(matrices)
            .fold(DMatrix::zeros(rows, cols), |acc, (&theta, m)| acc + m * theta))
    }

    /// Returns an operator with the same coefficients and every matrix mapped.
    ///
    /// Used to project each constituent matrix onto a reduced basis.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::Uninitialized`] if no matrices are attached, an
    /// error from `map`, or a shape error if `map` yields mismatched shapes.
    pub fn map_matrices<F, E>(&self, mut map: F) -> Result<Self, E>
    where
        F: FnMut(&DMatrix<f64>) -> Result<DMatrix<f64>, E>,
        E: From<AffineError>,
    {
        let matrices = self.matrices.as_ref().ok_or(AffineError::Uninitialized)?;
        let mapped = matrices.iter().map(&mut map).collect::<Result<Vec<_>, E>>()?;
        let mut op = Self::new(self.coefficients.clone())?;
        op.set_matrices(mapped)?;
        Ok(op)
    }
}

impl fmt::Debug for AffineOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffineOperator")
            .field("terms", &self.coefficients.len())
            .field("shape", &self.shape())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn coefficients() -> Vec<Coefficient> {
        vec![
            Arc::new(|_: f64| 1.0),
            Arc::new(|p: f64| p),
            Arc::new(|p: f64| p * p),
        ]
    }

    fn matrices(n: usize) -> Vec<DMatrix<f64>> {
        (0..3)
            .map(|k| DMatrix::from_fn(n, n, |i, j| (k + 1) as f64 * (i + 2 * j) as f64))
            .collect()
    }

    #[test]
    fn evaluates_affine_sum() {
        let op = AffineOperator::with_matrices(coefficients(), matrices(4)).unwrap();
        let p = 0.5;
        let ms = matrices(4);
        let expected = &ms[0] + &ms[1] * p + &ms[2] * (p * p);
        assert_relative_eq!(op.evaluate(p).unwrap(), expected);
        assert_eq!(op.shape(), Some((4, 4)));
    }

    #[test]
    fn two_phase_construction() {
        let mut op = AffineOperator::new(coefficients()).unwrap();
        assert_eq!(op.evaluate(1.0).unwrap_err(), AffineError::Uninitialized);
        assert_eq!(
            op.evaluate(1.0).unwrap_err().to_string(),
            "constituent matrices not initialized"
        );

        op.set_matrices(matrices(2)).unwrap();
        assert_eq!(op.evaluate(0.0).unwrap(), matrices(2)[0]);
    }

    #[test]
    fn rejects_wrong_matrix_count() {
        let mut ms = matrices(3);
        ms.pop();
        let err = AffineOperator::with_matrices(coefficients(), ms).unwrap_err();
        assert_eq!(err, AffineError::CountMismatch { expected: 3, actual: 2 });
        assert_eq!(err.to_string(), "expected 3 matrices, got 2");
    }

    #[test]
    fn rejects_mixed_shapes() {
        let mut ms = matrices(4);
        ms[2] = DMatrix::zeros(5, 5);
        let err = AffineOperator::with_matrices(coefficients(), ms).unwrap_err();
        assert_eq!(
            err.to_string(),
            "affine operator matrix shapes do not match ((5, 5) != (4, 4))"
        );
    }

    #[test]
    fn rejects_empty_coefficients() {
        assert_eq!(AffineOperator::new(Vec::new()).unwrap_err(), AffineError::Empty);
    }

    #[test]
    fn detects_non_scalar_coefficient() {
        let coefficients: Vec<Coefficient> =
            vec![Arc::new(|_: f64| 1.0), Arc::new(|p: f64| p.ln())];
        let op = AffineOperator::new(coefficients).unwrap();
        op.validate_coefficients(2.0).unwrap();
        let err = op.validate_coefficients(-1.0).unwrap_err();
        assert!(matches!(err, AffineError::NonScalarReturn { index: 1, .. }));
    }

    #[test]
    fn maps_every_matrix() {
        let op = AffineOperator::with_matrices(coefficients(), matrices(4)).unwrap();
        let reduced = op
            .map_matrices(|m| Ok::<_, AffineError>(m.view((0, 0), (2, 2)).into_owned()))
            .unwrap();
        assert_eq!(reduced.shape(), Some((2, 2)));
        assert_relative_eq!(
            reduced.evaluate(2.0).unwrap(),
            op.evaluate(2.0).unwrap().view((0, 0), (2, 2)).into_owned()
        );
    }
}
