/// A callable model that maps a typed input to a typed output.
///
/// The time-stepping solvers evaluate right-hand sides through this trait, so
/// a reduced system is just a model from `(t, x)` to `dx/dt`. Models must be
/// deterministic, always producing the same result for a given input.
pub trait Model {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Calls the model with the given input.
    ///
    /// # Errors
    ///
    /// Each model defines its own `Error` type to represent domain-specific failures.
    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}
