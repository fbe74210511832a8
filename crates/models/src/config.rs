use opinf_solvers::{
    interpolate::{Extrapolate, Strategy1D},
    lstsq,
};
use thiserror::Error;

/// Configuration for fitting an inferred model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitConfig {
    lstsq: lstsq::Config,
    cond_warn_threshold: f64,
}

/// Errors that can occur when validating a fit config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cond_warn_threshold must be positive")]
    CondWarnThreshold,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            lstsq: lstsq::Config::default(),
            cond_warn_threshold: 1e12,
        }
    }
}

impl FitConfig {
    /// Creates a new fit config.
    ///
    /// A warning is logged whenever the regression data matrix has a condition
    /// number above `cond_warn_threshold`. Use `f64::INFINITY` to silence it.
    ///
    /// # Errors
    ///
    /// Returns an error if `cond_warn_threshold` is NaN or not positive.
    pub fn new(lstsq: lstsq::Config, cond_warn_threshold: f64) -> Result<Self, ConfigError> {
        if cond_warn_threshold.is_nan() || cond_warn_threshold <= 0.0 {
            return Err(ConfigError::CondWarnThreshold);
        }
        Ok(Self {
            lstsq,
            cond_warn_threshold,
        })
    }

    /// Returns the least-squares solver config.
    #[must_use]
    pub fn lstsq(&self) -> &lstsq::Config {
        &self.lstsq
    }

    /// Returns the condition number above which a warning is logged.
    #[must_use]
    pub fn cond_warn_threshold(&self) -> f64 {
        self.cond_warn_threshold
    }
}

/// How operators are interpolated across parameter samples.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolationConfig {
    pub strategy: Strategy1D,
    pub extrapolate: Extrapolate<f64>,
}

impl Default for InterpolationConfig {
    /// Piecewise linear, extrapolating linearly past the sampled range.
    fn default() -> Self {
        Self {
            strategy: Strategy1D::Linear,
            extrapolate: Extrapolate::Enable,
        }
    }
}
