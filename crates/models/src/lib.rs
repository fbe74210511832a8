//! Reduced-order models learned by operator inference.
//!
//! A [`ReducedModel`] holds the structure of a polynomial reduced model,
//! `d/dt x = c + A x + H (x ⊗ x) + B u` in continuous time or the analogous
//! one-step map in discrete time, together with its reduced operators once
//! trained. Operators are obtained in one of three ways:
//!
//! - [`InferredModel`]: least-squares regression on reduced snapshot data.
//! - [`IntrusiveModel`]: Galerkin projection of known full-order operators.
//! - [`AffineIntrusiveModel`]: projection of parameter-affine operators,
//!   evaluated at a parameter value on demand.
//!
//! [`InterpolatedInferredContinuousModel`] fits one inferred model per
//! parameter sample and interpolates the operators between samples.

mod affine;
mod base;
mod config;
mod continuous;
mod discrete;
mod error;
mod evolution;
mod inferred;
mod input;
mod interpolated;
mod intrusive;

pub use affine::AffineIntrusiveModel;
pub use base::ReducedModel;
pub use config::{ConfigError, FitConfig, InterpolationConfig};
pub use error::Error;
pub use evolution::{Continuous, Discrete, Evolution};
pub use inferred::{Diagnostics, InferredModel};
pub use input::{Input, InputData};
pub use interpolated::{InterpolatedInferredContinuousModel, ParameterValue};
pub use intrusive::{FullOperator, FullOperators, IntrusiveModel};
