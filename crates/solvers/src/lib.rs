//! Numerical kernels used to build and evaluate reduced-order models.
//!
//! - [`lstsq`]: least squares with an optional Tikhonov penalty, reporting the
//!   condition number of the data matrix and the residual
//! - [`transient`]: fixed-grid integration of `dx/dt = f(t, x)` with observer
//!   events
//! - [`interpolate`]: 1-D interpolation of scalars and matrices over `ninterp`

pub mod interpolate;
pub mod lstsq;
pub mod transient;
