//! Core types and traits for operator inference reduced-order models.
//!
//! This crate defines the shared abstractions that the solvers and the model
//! constructors build on:
//!
//! - [`ModelForm`]: which polynomial terms (linear, quadratic, constant) a
//!   reduced model carries
//! - [`ReducedOperators`]: the reduced operators `A_`, `F_`, `c_`, `B_` and the
//!   validator that checks them against a model form
//! - [`AffineOperator`]: an operator that varies affinely with a scalar parameter
//! - [`quadratic`]: conversions between the Kronecker (`H`) and
//!   half-vectorized (`F`) quadratic forms
//! - [`Model`], [`Observer`], [`StepIntegrable`]: the seams used by the
//!   time-stepping solvers

mod affine;
mod form;
mod model;
mod observer;
mod operators;
mod step;

pub mod quadratic;

pub use affine::{AffineError, AffineOperator, Coefficient};
pub use form::{FormError, ModelForm, Term};
pub use model::Model;
pub use observer::Observer;
pub use operators::{OperatorError, Problem, ReducedOperators, Slot};
pub use step::{DerivativeOf, StepIntegrable};
