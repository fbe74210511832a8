use std::fmt;

use nalgebra::{DMatrix, DVector};
use opinf_core::{ModelForm, OperatorError, ReducedOperators, Term};

use crate::{Error, Evolution};

/// A reduced-order model of the form
///
/// ```text
/// lhs = c_ + A_ x + H_ (x ⊗ x) + B_ u
/// ```
///
/// with only the terms named by its [`ModelForm`] (and `B_ u` when
/// `has_inputs`). The type parameter fixes whether `lhs` is `dx/dt` or
/// `x_{j+1}`, and with it the `predict` signature.
///
/// A model starts untrained. It becomes trained through a construction path
/// (inference, intrusive projection, interpolation) or
/// [`ReducedModel::from_operators`]. Changing the form or the input flag
/// discards the operators.
#[derive(Debug, Clone)]
pub struct ReducedModel<E: Evolution> {
    form: ModelForm,
    has_inputs: bool,
    trained: Option<Trained>,
    basis: Option<DMatrix<f64>>,
    settings: E::Settings,
}

#[derive(Debug, Clone)]
struct Trained {
    r: usize,
    operators: ReducedOperators,
}

impl<E: Evolution> ReducedModel<E> {
    /// Creates an untrained model.
    #[must_use]
    pub fn new(form: ModelForm, has_inputs: bool) -> Self {
        Self {
            form,
            has_inputs,
            trained: None,
            basis: None,
            settings: E::Settings::default(),
        }
    }

    /// Creates a trained model of reduced dimension `r` from given operators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Operator`] if the operators do not match the form,
    /// the input flag, or `r`.
    pub fn from_operators(
        form: ModelForm,
        has_inputs: bool,
        r: usize,
        operators: ReducedOperators,
    ) -> Result<Self, Error> {
        let mut model = Self::new(form, has_inputs);
        model.set_operators(r, operators)?;
        Ok(model)
    }

    /// Attaches the basis `Vr` used by `predict_full`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BasisRankMismatch`] if the model is trained and `Vr`
    /// does not have `r` columns.
    pub fn with_basis(mut self, vr: DMatrix<f64>) -> Result<Self, Error> {
        if let Some(r) = self.r() {
            if vr.ncols() != r {
                return Err(Error::BasisRankMismatch {
                    expected: r,
                    actual: vr.ncols(),
                });
            }
        }
        self.basis = Some(vr);
        Ok(self)
    }

    /// Replaces the evolution-specific prediction settings.
    #[must_use]
    pub fn with_settings(mut self, settings: E::Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn form(&self) -> ModelForm {
        self.form
    }

    pub fn has_inputs(&self) -> bool {
        self.has_inputs
    }

    pub fn settings(&self) -> &E::Settings {
        &self.settings
    }

    /// Changes the model form, discarding any trained operators.
    pub fn set_form(&mut self, form: ModelForm) {
        self.form = form;
        self.trained = None;
    }

    /// Changes the input flag, discarding any trained operators.
    pub fn set_has_inputs(&mut self, has_inputs: bool) {
        self.has_inputs = has_inputs;
        self.trained = None;
    }

    /// Full-order dimension, known once a basis is attached.
    pub fn n(&self) -> Option<usize> {
        self.basis.as_ref().map(DMatrix::nrows)
    }

    /// Reduced dimension, known once trained.
    pub fn r(&self) -> Option<usize> {
        self.trained.as_ref().map(|t| t.r)
    }

    /// Input dimension, known once trained with inputs.
    pub fn m(&self) -> Option<usize> {
        self.operators().and_then(ReducedOperators::m)
    }

    pub fn basis(&self) -> Option<&DMatrix<f64>> {
        self.basis.as_ref()
    }

    pub fn operators(&self) -> Option<&ReducedOperators> {
        self.trained.as_ref().map(|t| &t.operators)
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// Checks the model structure.
    ///
    /// The form itself is valid by construction. With `trained`, every
    /// operator the form implies must be present and correctly shaped, and
    /// every other operator must be absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Operator`] naming the first offending attribute.
    pub fn check_modelform(&self, trained: bool) -> Result<(), Error> {
        if !trained {
            return Ok(());
        }
        match &self.trained {
            None => Err(OperatorError::untrained(self.form, self.has_inputs).into()),
            Some(t) => Ok(t.operators.validate(self.form, self.has_inputs, t.r)?),
        }
    }

    /// Checks that an input argument is given exactly when the model has inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] or [`Error::UnexpectedInput`].
    pub fn check_has_inputs(&self, provided: bool, argname: &'static str) -> Result<(), Error> {
        match (self.has_inputs, provided) {
            (true, false) => Err(Error::MissingInput { argname }),
            (false, true) => Err(Error::UnexpectedInput { argname }),
            _ => Ok(()),
        }
    }

    /// Validates and installs trained operators.
    pub(crate) fn set_operators(
        &mut self,
        r: usize,
        operators: ReducedOperators,
    ) -> Result<(), Error> {
        operators.validate(self.form, self.has_inputs, r)?;
        if let Some(vr) = &self.basis {
            if vr.ncols() != r {
                self.basis = None;
            }
        }
        self.trained = Some(Trained { r, operators });
        Ok(())
    }

    pub(crate) fn set_basis(&mut self, vr: &DMatrix<f64>) {
        self.basis = Some(vr.clone());
    }

    /// The validated operators and reduced dimension.
    pub(crate) fn trained(&self) -> Result<(usize, &ReducedOperators), Error> {
        self.check_modelform(true)?;
        match &self.trained {
            Some(t) => Ok((t.r, &t.operators)),
            None => Err(OperatorError::untrained(self.form, self.has_inputs).into()),
        }
    }

    /// Checks a reduced initial state against `r`.
    pub(crate) fn check_initial_state(&self, x0: &DVector<f64>, r: usize) -> Result<(), Error> {
        if x0.len() != r {
            return Err(Error::DimensionMismatch {
                expected: r,
                actual: x0.len(),
            });
        }
        Ok(())
    }

    /// Projects a full-order initial state, returning it with the basis.
    pub(crate) fn project_initial_state(
        &self,
        x0: &DVector<f64>,
    ) -> Result<(DVector<f64>, &DMatrix<f64>), Error> {
        let vr = self.basis.as_ref().ok_or(Error::MissingBasis)?;
        if x0.len() != vr.nrows() {
            return Err(Error::DimensionMismatch {
                expected: vr.nrows(),
                actual: x0.len(),
            });
        }
        Ok((vr.tr_mul(x0), vr))
    }
}

impl<E: Evolution> fmt::Display for ReducedModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut terms = Vec::with_capacity(4);
        if self.form.has(Term::Constant) {
            terms.push("c");
        }
        if self.form.has(Term::Linear) {
            terms.push(E::LINEAR);
        }
        if self.form.has(Term::Quadratic) {
            terms.push(E::QUADRATIC);
        }
        if self.has_inputs {
            terms.push(E::INPUT);
        }
        let rhs = if terms.is_empty() {
            "0".to_string()
        } else {
            terms.join(" + ")
        };
        write!(f, "Reduced-order model structure: {} = {rhs}", E::LHS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use opinf_core::quadratic::compressed_len;

    use crate::{Continuous, Discrete};

    fn form(s: &str) -> ModelForm {
        s.parse().unwrap()
    }

    fn operators(form: ModelForm, has_inputs: bool, r: usize, m: usize) -> ReducedOperators {
        ReducedOperators {
            a: form.has(Term::Linear).then(|| DMatrix::identity(r, r)),
            f: form
                .has(Term::Quadratic)
                .then(|| DMatrix::zeros(r, compressed_len(r))),
            c: form.has(Term::Constant).then(|| DVector::from_element(r, 1.0)),
            b: has_inputs.then(|| DMatrix::from_element(r, m, 0.5)),
        }
    }

    #[test]
    fn untrained_model_reports_first_missing_attribute() {
        let model = ReducedModel::<Continuous>::new(form("LQc"), false);
        model.check_modelform(false).unwrap();

        let err = model.check_modelform(true).unwrap_err();
        assert_eq!(err.to_string(), "attribute 'c_' missing; call fit() to train model");
    }

    #[test]
    fn from_operators_validates() {
        let model = ReducedModel::<Continuous>::from_operators(
            form("LQc"),
            true,
            4,
            operators(form("LQc"), true, 4, 3),
        )
        .unwrap();
        model.check_modelform(true).unwrap();
        assert_eq!((model.r(), model.m(), model.n()), (Some(4), Some(3), None));

        let err = ReducedModel::<Continuous>::from_operators(
            form("Lc"),
            true,
            4,
            operators(form("LQc"), true, 4, 3),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "attribute 'F_' should be None; call fit() to train model"
        );

        let err = ReducedModel::<Continuous>::from_operators(
            form("LQc"),
            true,
            4,
            operators(form("LQc"), false, 4, 3),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "attribute 'B_' is None; call fit() to train model");
    }

    #[test]
    fn changing_structure_discards_operators() {
        let mut model = ReducedModel::<Discrete>::from_operators(
            form("L"),
            false,
            2,
            operators(form("L"), false, 2, 0),
        )
        .unwrap();
        model.set_has_inputs(true);
        assert!(!model.is_trained());
        assert_eq!(
            model.check_modelform(true).unwrap_err().to_string(),
            "attribute 'A_' missing; call fit() to train model"
        );
    }

    #[test]
    fn basis_must_match_reduced_dimension() {
        let model = ReducedModel::<Continuous>::from_operators(
            form("L"),
            false,
            2,
            operators(form("L"), false, 2, 0),
        )
        .unwrap();
        let err = model.clone().with_basis(DMatrix::zeros(10, 3)).unwrap_err();
        assert!(matches!(err, Error::BasisRankMismatch { expected: 2, actual: 3 }));

        let model = model.with_basis(DMatrix::zeros(10, 2)).unwrap();
        assert_eq!(model.n(), Some(10));
    }

    #[test]
    fn checks_input_arguments() {
        let mut model = ReducedModel::<Continuous>::new(form("L"), true);
        assert_eq!(
            model.check_has_inputs(false, "U").unwrap_err().to_string(),
            "argument 'U' required since has_inputs=true"
        );
        model.check_has_inputs(true, "U").unwrap();

        model.set_has_inputs(false);
        assert_eq!(
            model.check_has_inputs(true, "u").unwrap_err().to_string(),
            "argument 'u' invalid since has_inputs=false"
        );
        model.check_has_inputs(false, "u").unwrap();
    }

    #[test]
    fn renders_continuous_structure() {
        let cases = [
            ("L", "dx / dt = Ax(t)"),
            ("Lc", "dx / dt = c + Ax(t)"),
            ("Q", "dx / dt = H(x ⊗ x)(t)"),
            ("Qc", "dx / dt = c + H(x ⊗ x)(t)"),
            ("LQ", "dx / dt = Ax(t) + H(x ⊗ x)(t)"),
            ("LQc", "dx / dt = c + Ax(t) + H(x ⊗ x)(t)"),
            ("", "dx / dt = 0"),
        ];
        for (key, structure) in cases {
            let model = ReducedModel::<Continuous>::new(form(key), false);
            assert_eq!(
                model.to_string(),
                format!("Reduced-order model structure: {structure}")
            );
        }

        let model = ReducedModel::<Continuous>::new(form("LQc"), true);
        assert_eq!(
            model.to_string(),
            "Reduced-order model structure: dx / dt = c + Ax(t) + H(x ⊗ x)(t) + Bu(t)"
        );
    }

    #[test]
    fn renders_discrete_structure() {
        let model = ReducedModel::<Discrete>::new(form("LQc"), true);
        assert_eq!(
            model.to_string(),
            "Reduced-order model structure: x_{j+1} = c + Ax_{j} + H(x_{j} ⊗ x_{j}) + Bu_{j}"
        );

        let model = ReducedModel::<Discrete>::new(form("L"), false);
        assert_eq!(
            model.to_string(),
            "Reduced-order model structure: x_{j+1} = Ax_{j}"
        );
    }
}
