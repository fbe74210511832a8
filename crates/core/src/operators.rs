use std::fmt;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::{
    ModelForm, Term,
    quadratic::{self, compressed_len},
};

/// A named operator slot on a reduced model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    F,
    C,
    B,
}

impl Slot {
    /// Slots in the order they are validated.
    pub const CHECK_ORDER: [Slot; 4] = [Slot::C, Slot::A, Slot::F, Slot::B];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::A => "A_",
            Slot::F => "F_",
            Slot::C => "c_",
            Slot::B => "B_",
        };
        f.write_str(name)
    }
}

/// What is wrong with an operator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    /// The model has not been trained at all.
    Missing,
    /// The slot is required by the model form but empty.
    IsNone,
    /// The slot is forbidden by the model form but populated.
    ShouldBeNone,
    /// The slot is populated with the wrong shape.
    WrongShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing => f.write_str("missing"),
            Problem::IsNone => f.write_str("is None"),
            Problem::ShouldBeNone => f.write_str("should be None"),
            Problem::WrongShape { expected, actual } => {
                write!(f, "has shape {actual:?} != {expected:?}")
            }
        }
    }
}

/// Errors raised when reduced operators disagree with a model's structure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OperatorError {
    #[error("attribute '{slot}' {problem}; call fit() to train model")]
    UntrainedOrCorrupted { slot: Slot, problem: Problem },
}

impl OperatorError {
    /// The error for a model that has never been fit.
    ///
    /// Names the first slot the form requires, in validation order.
    #[must_use]
    pub fn untrained(form: ModelForm, has_inputs: bool) -> Self {
        let slot = Slot::CHECK_ORDER
            .into_iter()
            .find(|&slot| is_required(slot, form, has_inputs))
            .unwrap_or(Slot::A);
        Self::UntrainedOrCorrupted {
            slot,
            problem: Problem::Missing,
        }
    }
}

fn is_required(slot: Slot, form: ModelForm, has_inputs: bool) -> bool {
    match slot {
        Slot::A => form.has(Term::Linear),
        Slot::F => form.has(Term::Quadratic),
        Slot::C => form.has(Term::Constant),
        Slot::B => has_inputs,
    }
}

/// The operators of a reduced model.
///
/// The quadratic operator is stored in half-vectorized form `F_`; the
/// Kronecker form is available through [`ReducedOperators::h`]. Which slots
/// must be populated is decided by a [`ModelForm`] and the `has_inputs` flag,
/// and checked by [`ReducedOperators::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReducedOperators {
    /// Linear operator, `r × r`.
    pub a: Option<DMatrix<f64>>,
    /// Half-vectorized quadratic operator, `r × r(r+1)/2`.
    pub f: Option<DMatrix<f64>>,
    /// Constant term, length `r`.
    pub c: Option<DVector<f64>>,
    /// Input operator, `r × m`.
    pub b: Option<DMatrix<f64>>,
}

impl ReducedOperators {
    /// Kronecker form of the quadratic operator, `r × r²`.
    ///
    /// Derived from `F_` on every call; `None` when there is no quadratic term
    /// or `F_` does not have a triangular column count.
    #[must_use]
    pub fn h(&self) -> Option<DMatrix<f64>> {
        self.f.as_ref().and_then(|f| quadratic::f2h(f).ok())
    }

    /// Input dimension, if an input operator is present.
    #[must_use]
    pub fn m(&self) -> Option<usize> {
        self.b.as_ref().map(DMatrix::ncols)
    }

    /// Checks the operators against a model structure of reduced dimension `r`.
    ///
    /// Slots are checked in the order `c_`, `A_`, `F_`, `B_`, and the first
    /// problem found is reported.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorError::UntrainedOrCorrupted`] naming the offending
    /// slot if a required slot is empty, a forbidden slot is populated, or a
    /// populated slot has the wrong shape.
    pub fn validate(
        &self,
        form: ModelForm,
        has_inputs: bool,
        r: usize,
    ) -> Result<(), OperatorError> {
        for slot in Slot::CHECK_ORDER {
            let actual = self.shape_of(slot);
            let problem = match (is_required(slot, form, has_inputs), actual) {
                (true, None) => Some(Problem::IsNone),
                (false, Some(_)) => Some(Problem::ShouldBeNone),
                (true, Some(actual)) => {
                    let expected = match slot {
                        Slot::A => (r, r),
                        Slot::F => (r, compressed_len(r)),
                        Slot::C => (r, 1),
                        // Any input dimension is acceptable; only the rows are fixed.
                        Slot::B => (r, actual.1),
                    };
                    (actual != expected).then_some(Problem::WrongShape { expected, actual })
                }
                (false, None) => None,
            };
            if let Some(problem) = problem {
                return Err(OperatorError::UntrainedOrCorrupted { slot, problem });
            }
        }
        Ok(())
    }

    /// Evaluates `c_ + A_ x + F_ (x ⊙ x) + B_ u` using the populated slots.
    ///
    /// The input term is skipped when either `B_` or `u` is absent. Shapes are
    /// assumed to have been validated.
    #[must_use]
    pub fn apply(&self, x: &DVector<f64>, u: Option<&DVector<f64>>) -> DVector<f64> {
        let mut out = self.c.clone().unwrap_or_else(|| DVector::zeros(x.len()));
        if let Some(a) = &self.a {
            out.gemv(1.0, a, x, 1.0);
        }
        if let Some(f) = &self.f {
            out.gemv(1.0, f, &quadratic::kron2c(x), 1.0);
        }
        if let (Some(b), Some(u)) = (&self.b, u) {
            out.gemv(1.0, b, u, 1.0);
        }
        out
    }

    fn shape_of(&self, slot: Slot) -> Option<(usize, usize)> {
        match slot {
            Slot::A => self.a.as_ref().map(DMatrix::shape),
            Slot::F => self.f.as_ref().map(DMatrix::shape),
            Slot::C => self.c.as_ref().map(|c| (c.len(), 1)),
            Slot::B => self.b.as_ref().map(DMatrix::shape),
        }
    }
}
