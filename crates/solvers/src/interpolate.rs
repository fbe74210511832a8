//! 1-D interpolation of scalars and matrices over a sampled coordinate.
//!
//! [`Interp1D`] wraps a single `ninterp` interpolant. [`MatrixInterp`] keeps
//! one interpolant per matrix entry, so a family of equally shaped matrices
//! sampled at `x_0 < x_1 < ...` can be evaluated at any `x`. Input signals are
//! handled the same way, with each sampled column treated as an `m × 1` matrix.

use std::fmt;

use nalgebra::DMatrix;
use ninterp::{
    error::{InterpolateError, ValidateError},
    prelude::{Interp1DOwned, Interpolator},
};
use opinf_core::Model;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterpError {
    #[error(transparent)]
    Validation(#[from] ValidateError),
    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
    #[error("no samples to interpolate")]
    Empty,
    #[error("got {samples} samples for {points} grid points")]
    CountMismatch { points: usize, samples: usize },
    #[error("sample shapes do not match ({actual:?} != {expected:?})")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Extrapolation strategy
///
/// Controls what happens if supplied interpolant point is outside the bounds of
/// the interpolation grid.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extrapolate<T> {
    /// Evaluate beyond the limits of the interpolation grid.
    Enable,
    /// If point is beyond grid limits, return this value instead.
    Fill(T),
    /// Restrict interpolant point to the limits of the interpolation grid.
    Clamp,
    /// Wrap around to other end of periodic data. Does NOT check that first and
    /// last values are equal.
    Wrap,
    /// Return an error when interpolant point is beyond the limits of the
    /// interpolation grid.
    #[default]
    Error,
}

impl<T> From<Extrapolate<T>> for ninterp::interpolator::Extrapolate<T> {
    fn from(value: Extrapolate<T>) -> Self {
        match value {
            Extrapolate::Enable => ninterp::interpolator::Extrapolate::Enable,
            Extrapolate::Fill(val) => ninterp::interpolator::Extrapolate::Fill(val),
            Extrapolate::Clamp => ninterp::interpolator::Extrapolate::Clamp,
            Extrapolate::Wrap => ninterp::interpolator::Extrapolate::Wrap,
            Extrapolate::Error => ninterp::interpolator::Extrapolate::Error,
        }
    }
}

macro_rules! define_interpolators {
    (
        $enum_name:ident, $interp_name:ident, $interp_type:ident, $input:ty, $new_fn:ident, $call_fn:ident;
        $($variant:ident => $strategy:path),+ $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $enum_name {
            #[default]
            $($variant),+
        }

        pub enum $interp_name {
            $($variant($interp_type<$input, $strategy>)),+
        }

        impl $interp_name {
            #[allow(clippy::missing_errors_doc)]
            pub fn $new_fn<T: Into<ndarray::Array1<$input>>>(
                x: T,
                f_x: T,
                strategy: $enum_name,
                extrapolate: Extrapolate<$input>,
            ) -> Result<Self, InterpError> {
                match strategy {
                    $($enum_name::$variant => Ok(Self::$variant(
                        $interp_type::new(x.into(), f_x.into(), $strategy, extrapolate.into())?
                    )),)+
                }
            }

            #[allow(clippy::missing_errors_doc)]
            pub fn $call_fn(&self, input: $input) -> Result<$input, InterpError> {
                match self {
                    $(Self::$variant(i) => i.interpolate(&[input]).map_err(Into::into),)+
                }
            }
        }

        impl Model for $interp_name {
            type Input = $input;
            type Output = $input;
            type Error = InterpError;

            fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
                self.$call_fn(*input)
            }
        }
    };
}

define_interpolators!(
    Strategy1D, Interp1D, Interp1DOwned, f64, new, interpolate;
    Linear => ninterp::strategy::Linear,
    Nearest => ninterp::strategy::Nearest,
    LeftNearest => ninterp::strategy::LeftNearest,
    RightNearest => ninterp::strategy::RightNearest,
);

/// Entrywise interpolant of equally shaped matrices.
pub struct MatrixInterp {
    shape: (usize, usize),
    kind: Kind,
}

enum Kind {
    /// A single sample is returned unchanged everywhere.
    Constant(DMatrix<f64>),
    /// One interpolant per entry, in column-major order.
    Entries(Vec<Interp1D>),
}

impl MatrixInterp {
    /// Builds an interpolant through `samples[i]` at `x[i]`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no samples, if the sample count differs
    /// from `x.len()`, if the samples differ in shape, or if `ninterp` rejects
    /// the grid (for example when it is not sorted).
    pub fn new(
        x: &[f64],
        samples: &[DMatrix<f64>],
        strategy: Strategy1D,
        extrapolate: Extrapolate<f64>,
    ) -> Result<Self, InterpError> {
        let first = samples.first().ok_or(InterpError::Empty)?;
        if samples.len() != x.len() {
            return Err(InterpError::CountMismatch {
                points: x.len(),
                samples: samples.len(),
            });
        }
        let shape = first.shape();
        if let Some(bad) = samples.iter().find(|s| s.shape() != shape) {
            return Err(InterpError::ShapeMismatch {
                expected: shape,
                actual: bad.shape(),
            });
        }

        if samples.len() == 1 {
            return Ok(Self {
                shape,
                kind: Kind::Constant(first.clone()),
            });
        }

        let entries = (0..first.len())
            .map(|entry| {
                let f_x: Vec<f64> = samples.iter().map(|s| s[entry]).collect();
                Interp1D::new(x.to_vec(), f_x, strategy, extrapolate)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            shape,
            kind: Kind::Entries(entries),
        })
    }

    /// Builds an interpolant through the columns of `columns`, with column `j`
    /// sampled at `x[j]`. Evaluates to `nrows × 1` matrices.
    ///
    /// # Errors
    ///
    /// See [`MatrixInterp::new`].
    pub fn from_columns(
        x: &[f64],
        columns: &DMatrix<f64>,
        strategy: Strategy1D,
        extrapolate: Extrapolate<f64>,
    ) -> Result<Self, InterpError> {
        let samples: Vec<DMatrix<f64>> = columns
            .column_iter()
            .map(|column| DMatrix::from_iterator(column.nrows(), 1, column.iter().copied()))
            .collect();
        Self::new(x, &samples, strategy, extrapolate)
    }

    /// Shape of the interpolated matrices.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Evaluates every entry at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be interpolated, which happens
    /// outside the grid when extrapolation is [`Extrapolate::Error`].
    pub fn evaluate(&self, at: f64) -> Result<DMatrix<f64>, InterpError> {
        match &self.kind {
            Kind::Constant(matrix) => Ok(matrix.clone()),
            Kind::Entries(entries) => {
                let values = entries
                    .iter()
                    .map(|entry| entry.interpolate(at))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DMatrix::from_vec(self.shape.0, self.shape.1, values))
            }
        }
    }
}

impl fmt::Debug for MatrixInterp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            Kind::Constant(_) => "constant",
            Kind::Entries(_) => "entrywise",
        };
        f.debug_struct("MatrixInterp")
            .field("shape", &self.shape)
            .field("kind", &kind)
            .finish()
    }
}
