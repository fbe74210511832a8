use thiserror::Error;

/// Explicit time-stepping scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// First-order forward Euler.
    ForwardEuler,
    /// Classical fourth-order Runge-Kutta.
    #[default]
    Rk4,
}

/// Configuration for the transient solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    method: Method,
    substeps: usize,
}

/// Errors that can occur when validating a transient solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("substeps must be at least 1")]
    Substeps,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::Rk4,
            substeps: 10,
        }
    }
}

impl Config {
    /// Creates a new config.
    ///
    /// Each interval between consecutive grid times is split into `substeps`
    /// equal steps of `method`.
    ///
    /// # Errors
    ///
    /// Returns an error if `substeps` is zero.
    pub fn new(method: Method, substeps: usize) -> Result<Self, ConfigError> {
        if substeps == 0 {
            return Err(ConfigError::Substeps);
        }
        Ok(Self { method, substeps })
    }

    /// Returns the stepping scheme.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the number of steps taken per grid interval.
    #[must_use]
    pub fn substeps(&self) -> usize {
        self.substeps
    }
}
