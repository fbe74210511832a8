use nalgebra::{DMatrix, DVector};
use opinf_solvers::interpolate::{Extrapolate, MatrixInterp, Strategy1D};

use crate::Error;

/// Sampled input data: an `m × k` matrix, or a length-`k` vector when `m = 1`.
#[derive(Debug, Clone, Copy)]
pub enum InputData<'a> {
    Matrix(&'a DMatrix<f64>),
    Vector(&'a DVector<f64>),
}

impl InputData<'_> {
    /// Shape as `(m, k)`; a vector is a single row.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        match self {
            InputData::Matrix(u) => u.shape(),
            InputData::Vector(u) => (1, u.len()),
        }
    }

    /// Copies the data into an `m × k` matrix.
    #[must_use]
    pub fn to_matrix(&self) -> DMatrix<f64> {
        match self {
            InputData::Matrix(u) => (*u).clone(),
            InputData::Vector(u) => DMatrix::from_row_slice(1, u.len(), u.as_slice()),
        }
    }

    /// Checks the data against an expected `(m, k)` shape.
    ///
    /// A vector is accepted only when `m = 1`.
    pub(crate) fn expect_shape(&self, expected: (usize, usize)) -> Result<DMatrix<f64>, Error> {
        let actual = self.shape();
        if actual != expected {
            return Err(Error::InputShapeMismatch { expected, actual });
        }
        Ok(self.to_matrix())
    }
}

impl<'a> From<&'a DMatrix<f64>> for InputData<'a> {
    fn from(u: &'a DMatrix<f64>) -> Self {
        InputData::Matrix(u)
    }
}

impl<'a> From<&'a DVector<f64>> for InputData<'a> {
    fn from(u: &'a DVector<f64>) -> Self {
        InputData::Vector(u)
    }
}

/// An input signal for prediction.
#[derive(Clone, Copy, Default)]
pub enum Input<'a> {
    /// No input; only valid when the model has no input operator.
    #[default]
    None,
    /// Inputs sampled at the prediction times (continuous) or steps (discrete).
    Discrete(InputData<'a>),
    /// `u(t)` returning a length-`m` vector.
    Function(&'a dyn Fn(f64) -> DVector<f64>),
    /// `u(t)` returning a scalar; only valid when `m = 1`.
    Scalar(&'a dyn Fn(f64) -> f64),
}

impl Input<'_> {
    /// Returns `true` unless this is [`Input::None`].
    #[must_use]
    pub fn is_some(&self) -> bool {
        !matches!(self, Input::None)
    }
}

impl<'a> From<InputData<'a>> for Input<'a> {
    fn from(data: InputData<'a>) -> Self {
        Input::Discrete(data)
    }
}

impl<'a> From<&'a DMatrix<f64>> for Input<'a> {
    fn from(u: &'a DMatrix<f64>) -> Self {
        Input::Discrete(InputData::Matrix(u))
    }
}

impl<'a> From<&'a DVector<f64>> for Input<'a> {
    fn from(u: &'a DVector<f64>) -> Self {
        Input::Discrete(InputData::Vector(u))
    }
}

impl std::fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::None => f.write_str("None"),
            Input::Discrete(data) => f.debug_tuple("Discrete").field(data).finish(),
            Input::Function(_) => f.write_str("Function(..)"),
            Input::Scalar(_) => f.write_str("Scalar(..)"),
        }
    }
}

/// A validated input signal, callable at any time in the prediction window.
pub(crate) enum Signal<'a> {
    None,
    Function(&'a dyn Fn(f64) -> DVector<f64>),
    Scalar(&'a dyn Fn(f64) -> f64),
    Sampled(MatrixInterp),
}

impl<'a> Signal<'a> {
    /// Classifies and checks a continuous-time input against `m` inputs and
    /// the time grid `t`.
    ///
    /// Functions are evaluated at every time in `t`. Sampled data must have
    /// one column per time and is linearly interpolated between them.
    pub(crate) fn continuous(input: Input<'a>, m: usize, t: &[f64]) -> Result<Self, Error> {
        match input {
            Input::None => Ok(Signal::None),
            Input::Function(u) => {
                if t.iter().any(|&time| u(time).len() != m) {
                    return Err(Error::InputSignatureMismatch { m });
                }
                Ok(Signal::Function(u))
            }
            Input::Scalar(u) => {
                if m != 1 {
                    return Err(Error::InputSignatureMismatch { m });
                }
                Ok(Signal::Scalar(u))
            }
            Input::Discrete(data) => {
                let samples = data.expect_shape((m, t.len()))?;
                let interp = MatrixInterp::from_columns(
                    t,
                    &samples,
                    Strategy1D::Linear,
                    Extrapolate::Clamp,
                )?;
                Ok(Signal::Sampled(interp))
            }
        }
    }

    pub(crate) fn is_some(&self) -> bool {
        !matches!(self, Signal::None)
    }

    /// Input vector at time `t`, or `None` for a model without inputs.
    pub(crate) fn at(&self, t: f64, m: usize) -> Result<Option<DVector<f64>>, Error> {
        let u = match self {
            Signal::None => return Ok(None),
            Signal::Function(u) => u(t),
            Signal::Scalar(u) => DVector::from_element(1, u(t)),
            Signal::Sampled(interp) => {
                let column = interp.evaluate(t)?;
                DVector::from_column_slice(column.as_slice())
            }
        };
        if u.len() != m {
            return Err(Error::InputSignatureMismatch { m });
        }
        Ok(Some(u))
    }
}
