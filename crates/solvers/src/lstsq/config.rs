use thiserror::Error;

/// Configuration for the least-squares solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    regularization: f64,
    rcond: f64,
}

/// Errors that can occur when validating a least-squares config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("regularization must be finite and non-negative")]
    Regularization,

    #[error("rcond must be finite and non-negative")]
    Rcond,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            regularization: 0.0,
            rcond: 1e-12,
        }
    }
}

impl Config {
    /// Creates a new config with a validated penalty and cutoff.
    ///
    /// `regularization` is the Tikhonov parameter `λ` in
    /// `min ‖D O − R‖² + λ‖O‖²`. `rcond` is the relative cutoff below which
    /// singular values of the data matrix are treated as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is negative or non-finite.
    pub fn new(regularization: f64, rcond: f64) -> Result<Self, ConfigError> {
        if !regularization.is_finite() || regularization < 0.0 {
            return Err(ConfigError::Regularization);
        }
        if !rcond.is_finite() || rcond < 0.0 {
            return Err(ConfigError::Rcond);
        }

        Ok(Self {
            regularization,
            rcond,
        })
    }

    /// Returns the Tikhonov regularization parameter.
    #[must_use]
    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Returns the relative singular-value cutoff.
    #[must_use]
    pub fn rcond(&self) -> f64 {
        self.rcond
    }
}
