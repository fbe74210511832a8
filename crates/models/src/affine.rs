//! Intrusive projection of operators that vary affinely with a parameter.
//!
//! Each full-order operator is an [`AffineOperator`] `Σ θ_i(p) M_i`. Since
//! projection is linear, every constituent `M_i` is projected once at fit
//! time and the reduced operator at `p` is `Σ θ_i(p) (Vrᵀ M_i ...)`.

use nalgebra::{DMatrix, DVector};
use opinf_core::{AffineError, AffineOperator, ModelForm, ReducedOperators, Term};

use crate::{
    Continuous, Discrete, Error, Evolution, Input, ReducedModel,
    intrusive::{self, FullOperator},
};

#[derive(Debug, Clone, Default)]
struct AffineOperators {
    a: Option<AffineOperator>,
    f: Option<AffineOperator>,
    c: Option<AffineOperator>,
    b: Option<AffineOperator>,
}

/// An intrusive model whose operators depend affinely on a scalar parameter.
#[derive(Debug, Clone)]
pub struct AffineIntrusiveModel<E: Evolution> {
    template: ReducedModel<E>,
    reduced: Option<(usize, AffineOperators)>,
}

impl<E: Evolution> AffineIntrusiveModel<E> {
    #[must_use]
    pub fn new(form: ModelForm, has_inputs: bool) -> Self {
        Self {
            template: ReducedModel::new(form, has_inputs),
            reduced: None,
        }
    }

    /// Projects every constituent matrix of `operators` onto `vr` (`n × r`).
    ///
    /// `operators` follow the order and shapes of
    /// [`IntrusiveModel::fit`](crate::IntrusiveModel::fit), with the constant
    /// term given as an `n × 1` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CountMismatch`], [`Error::OperatorBasisMismatch`], or
    /// [`AffineError::Uninitialized`] for an operator without matrices.
    pub fn fit(&mut self, operators: Vec<AffineOperator>, vr: &DMatrix<f64>) -> Result<(), Error> {
        let form = self.template.form();
        let has_inputs = self.template.has_inputs();
        let expected = form.len() + usize::from(has_inputs);
        if operators.len() != expected {
            return Err(Error::CountMismatch {
                expected,
                actual: operators.len(),
            });
        }

        let n = vr.nrows();
        let mut reduced = AffineOperators::default();
        let mut supplied = operators.into_iter();
        for term in form.terms() {
            let Some(operator) = supplied.next() else {
                break;
            };
            let shape = operator.shape().ok_or(AffineError::Uninitialized)?;
            match term {
                Term::Linear => {
                    if shape != (n, n) {
                        return Err(Error::OperatorBasisMismatch { operator: "A" });
                    }
                    reduced.a = Some(operator.map_matrices(|a| {
                        Ok::<_, Error>(intrusive::project_linear(a, vr))
                    })?);
                }
                Term::Quadratic => {
                    reduced.f = Some(operator.map_matrices(|q| {
                        let (h, _) = intrusive::quadratic_pair(FullOperator::Matrix(q.clone()), n)?;
                        intrusive::project_quadratic(&h, vr)
                    })?);
                }
                Term::Constant => {
                    if shape != (n, 1) {
                        return Err(Error::OperatorBasisMismatch { operator: "c" });
                    }
                    reduced.c = Some(operator.map_matrices(|c| Ok::<_, Error>(vr.tr_mul(c)))?);
                }
            }
        }
        if let Some(operator) = supplied.next() {
            let shape = operator.shape().ok_or(AffineError::Uninitialized)?;
            if shape.0 != n {
                return Err(Error::OperatorBasisMismatch { operator: "B" });
            }
            reduced.b = Some(operator.map_matrices(|b| Ok::<_, Error>(vr.tr_mul(b)))?);
        }

        self.template.set_basis(vr);
        self.reduced = Some((vr.ncols(), reduced));
        Ok(())
    }

    /// Checks every coefficient function at `sample`.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::NonScalarReturn`] for the first coefficient that
    /// does not evaluate to a finite scalar.
    pub fn validate_coefficients(&self, sample: f64) -> Result<(), Error> {
        let Some((_, reduced)) = &self.reduced else {
            return Err(self.untrained());
        };
        for operator in [&reduced.a, &reduced.f, &reduced.c, &reduced.b].into_iter().flatten() {
            operator.validate_coefficients(sample)?;
        }
        Ok(())
    }

    /// The reduced model at `parameter`.
    ///
    /// # Errors
    ///
    /// Fails if the model has not been fit or a coefficient cannot be
    /// evaluated at `parameter`.
    pub fn model_at(&self, parameter: f64) -> Result<ReducedModel<E>, Error> {
        let Some((r, reduced)) = &self.reduced else {
            return Err(self.untrained());
        };
        let evaluate = |operator: &Option<AffineOperator>| {
            operator.as_ref().map(|op| op.evaluate(parameter)).transpose()
        };
        let operators = ReducedOperators {
            a: evaluate(&reduced.a)?,
            f: evaluate(&reduced.f)?,
            c: evaluate(&reduced.c)?.map(|c| DVector::from_column_slice(c.as_slice())),
            b: evaluate(&reduced.b)?,
        };
        let mut model = self.template.clone();
        model.set_operators(*r, operators)?;
        Ok(model)
    }

    fn untrained(&self) -> Error {
        opinf_core::OperatorError::untrained(self.template.form(), self.template.has_inputs())
            .into()
    }
}

impl AffineIntrusiveModel<Continuous> {
    /// Uses `config` to integrate in [`AffineIntrusiveModel::predict`].
    #[must_use]
    pub fn with_integrator(mut self, config: opinf_solvers::transient::Config) -> Self {
        self.template = self.template.with_integrator(config);
        self
    }

    /// Integrates the reduced model at `parameter`; see [`ReducedModel::predict`].
    ///
    /// # Errors
    ///
    /// As for [`AffineIntrusiveModel::model_at`] and the reduced model.
    pub fn predict(
        &self,
        parameter: f64,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model_at(parameter)?.predict(x0, t, u)
    }
}

impl AffineIntrusiveModel<Discrete> {
    /// Iterates the reduced map at `parameter`; see [`ReducedModel::predict`].
    ///
    /// # Errors
    ///
    /// As for [`AffineIntrusiveModel::model_at`] and the reduced model.
    pub fn predict(
        &self,
        parameter: f64,
        x0: &DVector<f64>,
        niters: usize,
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model_at(parameter)?.predict(x0, niters, u)
    }
}
