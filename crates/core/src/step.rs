use nalgebra::DVector;

/// A trait for types that can be stepped using their derivative.
///
/// Implementing this trait lets the explicit integrators advance a state via
/// `state + derivative * delta`. Reduced states are plain `DVector<f64>`s, for
/// which an implementation is provided.
pub trait StepIntegrable<Delta> {
    /// The derivative of the type with respect to `Delta`.
    type Derivative;

    /// Returns the value after stepping with a derivative and step size.
    #[must_use]
    fn step(&self, derivative: Self::Derivative, delta: Delta) -> Self;
}

/// Type alias for the derivative of a `StepIntegrable` type.
pub type DerivativeOf<T, Delta> = <T as StepIntegrable<Delta>>::Derivative;

impl StepIntegrable<f64> for DVector<f64> {
    type Derivative = DVector<f64>;

    fn step(&self, derivative: DVector<f64>, delta: f64) -> Self {
        self + derivative * delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::dvector;

    #[test]
    fn step_vector_state() {
        let state = dvector![1.0, 2.0, 3.0];
        let deriv: DerivativeOf<DVector<f64>, f64> = dvector![0.1, 0.2, 0.3];

        let next = state.step(deriv, 10.0);

        assert_relative_eq!(next, dvector![2.0, 4.0, 6.0], epsilon = 1e-12);
    }

    #[test]
    fn zero_step_is_identity() {
        let state = dvector![-1.5, 0.25];

        let next = state.step(dvector![100.0, -100.0], 0.0);

        assert_eq!(next, state);
    }
}
