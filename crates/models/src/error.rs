use opinf_core::{AffineError, FormError, OperatorError, quadratic::QuadraticError};
use opinf_solvers::{
    interpolate::InterpError,
    lstsq,
    transient::{self, GridError},
};
use thiserror::Error;

/// Errors raised while fitting or evaluating a reduced-order model.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Operator(#[from] OperatorError),

    #[error(transparent)]
    Affine(#[from] AffineError),

    #[error(transparent)]
    Quadratic(#[from] QuadraticError),

    #[error("regression failed: {0}")]
    Lstsq(#[from] lstsq::Error),

    #[error("integration failed: {0}")]
    Integration(#[from] transient::Error),

    #[error("interpolation failed: {0}")]
    Interpolation(#[from] InterpError),

    #[error(transparent)]
    InvalidTimeGrid(#[from] GridError),

    #[error("argument '{argname}' required since has_inputs=true")]
    MissingInput { argname: &'static str },

    #[error("argument '{argname}' invalid since has_inputs=false")]
    UnexpectedInput { argname: &'static str },

    #[error("shape of X != shape of Xdot ({x:?} != {xdot:?})")]
    ShapeMismatch {
        x: (usize, usize),
        xdot: (usize, usize),
    },

    #[error("X and Vr not aligned, first dimension {x} != {vr}")]
    BasisMismatch { x: usize, vr: usize },

    #[error("basis Vr and FOM operator {operator} not aligned")]
    OperatorBasisMismatch { operator: &'static str },

    #[error("basis Vr has {actual} columns but the model has r = {expected}")]
    BasisRankMismatch { expected: usize, actual: usize },

    #[error("model has no basis Vr")]
    MissingBasis,

    #[error("expected {expected} operators, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("num parameter samples != num {sets} snapshot sets ({parameters} != {actual})")]
    SampleCountMismatch {
        sets: &'static str,
        parameters: usize,
        actual: usize,
    },

    #[error("invalid initial state size ({actual} != {expected})")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("number of iterations must be positive")]
    NoIterations,

    #[error("input function u() must return a vector of shape (m,)=({m},){}", scalar_hint(.m))]
    InputSignatureMismatch { m: usize },

    #[error("discrete models take sampled inputs, not input functions")]
    InputFunctionNotSupported,

    #[error("invalid input shape ({actual:?} != {expected:?})")]
    InputShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("only scalar parameter values are supported")]
    NonScalarParameter,

    #[error("shape of 'U' inconsistent across samples")]
    InconsistentInputShape,

    #[error("improper use of the right-hand side builder")]
    ImproperUse,
}

fn scalar_hint(m: &usize) -> &'static str {
    if *m == 1 { " or scalar" } else { "" }
}
