use nalgebra::DVector;

/// Event emitted by the transient solver at each output time.
///
/// Step 0 is the initial state before any integration.
/// Steps 1..N are emitted after the state reaches each later grid time.
#[derive(Debug, Clone)]
pub struct Event {
    /// Index of the grid time this event reports.
    pub step: usize,

    /// The grid time.
    pub time: f64,

    /// State at `time`.
    pub state: DVector<f64>,
}
