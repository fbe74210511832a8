use thiserror::Error;

/// Errors raised by an unusable time grid.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("time grid 't' is empty")]
    Empty,

    #[error("time grid 't' has a non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("time grid 't' must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },
}

/// Checks that `times` is non-empty, finite and strictly increasing.
///
/// # Errors
///
/// Returns the first problem found, scanning from the start of the grid.
pub fn validate_grid(times: &[f64]) -> Result<(), GridError> {
    if times.is_empty() {
        return Err(GridError::Empty);
    }
    if let Some(index) = times.iter().position(|t| !t.is_finite()) {
        return Err(GridError::NonFinite { index });
    }
    if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
        return Err(GridError::NotIncreasing { index: index + 1 });
    }
    Ok(())
}
