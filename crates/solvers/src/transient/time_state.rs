use nalgebra::DVector;

/// Input to a right-hand-side model: a time and the state at that time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeState {
    pub time: f64,
    pub state: DVector<f64>,
}
