use std::fmt::Debug;

use opinf_solvers::transient;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Continuous {}
    impl Sealed for super::Discrete {}
}

/// How a reduced model evolves in time.
///
/// Chosen at construction as the type parameter of
/// [`ReducedModel`](crate::ReducedModel), which decides the `predict`
/// signature and the rendering of the model structure.
pub trait Evolution: sealed::Sealed + Debug + Clone + Copy + Default + 'static {
    /// Evolution-specific prediction settings.
    type Settings: Debug + Clone + Default;

    const LHS: &'static str;
    const LINEAR: &'static str;
    const QUADRATIC: &'static str;
    const INPUT: &'static str;
}

/// `dx / dt = f(t, x, u)`, integrated over a time grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Continuous;

/// `x_{j+1} = f(x_j, u_j)`, iterated for a number of steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Discrete;

impl Evolution for Continuous {
    type Settings = transient::Config;

    const LHS: &'static str = "dx / dt";
    const LINEAR: &'static str = "Ax(t)";
    const QUADRATIC: &'static str = "H(x ⊗ x)(t)";
    const INPUT: &'static str = "Bu(t)";
}

impl Evolution for Discrete {
    type Settings = ();

    const LHS: &'static str = "x_{j+1}";
    const LINEAR: &'static str = "Ax_{j}";
    const QUADRATIC: &'static str = "H(x_{j} ⊗ x_{j})";
    const INPUT: &'static str = "Bu_{j}";
}
