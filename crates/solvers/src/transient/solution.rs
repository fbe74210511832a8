use nalgebra::{DMatrix, DVector};

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached the last grid time.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,

    /// Stopped because the state became non-finite.
    NonFinite,
}

/// The result of a transient integration.
#[derive(Debug, Clone)]
pub struct Solution {
    /// How the solver terminated.
    pub status: Status,

    /// States at each reached grid time, starting with the initial state.
    pub states: Vec<DVector<f64>>,

    /// Number of grid intervals completed.
    pub steps: usize,
}

impl Solution {
    /// Collects the states as columns of a `size × columns` matrix.
    ///
    /// Columns past the last reached state are filled with NaN.
    #[must_use]
    pub fn to_matrix(&self, size: usize, columns: usize) -> DMatrix<f64> {
        let mut out = DMatrix::from_element(size, columns, f64::NAN);
        for (j, state) in self.states.iter().take(columns).enumerate() {
            out.set_column(j, state);
        }
        out
    }
}
