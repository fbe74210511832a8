use nalgebra::{DMatrix, DVector};
use opinf_core::{Model, ReducedOperators};
use opinf_solvers::transient::{self, Status, TimeState, validate_grid};

use crate::{
    Continuous, Error, ReducedModel,
    input::{Input, Signal},
};

/// Right-hand side `f(t, x) = c_ + A_ x + F_ (x ⊙ x) + B_ u(t)`.
struct Rhs<'a> {
    operators: &'a ReducedOperators,
    signal: &'a Signal<'a>,
    m: usize,
}

impl Model for Rhs<'_> {
    type Input = TimeState;
    type Output = DVector<f64>;
    type Error = Error;

    fn call(&self, input: &TimeState) -> Result<DVector<f64>, Error> {
        let u = self.signal.at(input.time, self.m)?;
        Ok(self.operators.apply(&input.state, u.as_ref()))
    }
}

impl ReducedModel<Continuous> {
    /// Uses `config` to integrate in [`ReducedModel::predict`].
    #[must_use]
    pub fn with_integrator(self, config: transient::Config) -> Self {
        self.with_settings(config)
    }

    /// Integrates the reduced model from `x0` over the time grid `t`.
    ///
    /// Returns an `r × t.len()` matrix whose first column is `x0`. If the state
    /// stops being finite, a warning is logged and the remaining columns are
    /// NaN.
    ///
    /// # Errors
    ///
    /// Fails fast, before integrating, if the model is untrained or corrupted,
    /// if `x0` does not have `r` entries, if `t` is not a non-empty, finite,
    /// strictly increasing grid, or if `u` contradicts the input operator.
    pub fn predict(
        &self,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        let (r, operators) = self.trained()?;
        self.check_initial_state(x0, r)?;
        validate_grid(t)?;
        self.check_has_inputs(u.is_some(), "u")?;

        let m = operators.m().unwrap_or(0);
        let signal = Signal::continuous(u, m, t)?;
        let rhs = self.construct_rhs(operators, &signal, m)?;

        let solution = transient::solve_unobserved(&rhs, x0.clone(), t, self.settings())?;
        if solution.status == Status::NonFinite {
            log::warn!(
                "integration produced a non-finite state after {} of {} steps; remaining columns are NaN",
                solution.steps,
                t.len() - 1
            );
        }
        Ok(solution.to_matrix(r, t.len()))
    }

    /// Projects a full-order `x0` through `Vr`, predicts, and lifts the
    /// trajectory back to full order (`n × t.len()`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBasis`] without a basis, or any error from
    /// [`ReducedModel::predict`].
    pub fn predict_full(
        &self,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        let (x0_, vr) = self.project_initial_state(x0)?;
        Ok(vr * self.predict(&x0_, t, u)?)
    }

    fn construct_rhs<'a>(
        &self,
        operators: &'a ReducedOperators,
        signal: &'a Signal<'a>,
        m: usize,
    ) -> Result<Rhs<'a>, Error> {
        if self.has_inputs() != signal.is_some() {
            return Err(Error::ImproperUse);
        }
        Ok(Rhs {
            operators,
            signal,
            m,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::dvector;
    use opinf_core::{ModelForm, quadratic::compressed_len};
    use opinf_solvers::interpolate::{Extrapolate, MatrixInterp, Strategy1D};

    use crate::input::InputData;

    fn linspace(n: usize, end: f64) -> Vec<f64> {
        (0..n).map(|i| end * i as f64 / (n - 1) as f64).collect()
    }

    fn trained(form: &str, has_inputs: bool, r: usize, m: usize) -> ReducedModel<Continuous> {
        let form: ModelForm = form.parse().unwrap();
        let operators = ReducedOperators {
            a: form.has(opinf_core::Term::Linear).then(|| -DMatrix::identity(r, r)),
            f: form
                .has(opinf_core::Term::Quadratic)
                .then(|| DMatrix::zeros(r, compressed_len(r))),
            c: form.has(opinf_core::Term::Constant).then(|| DVector::zeros(r)),
            b: has_inputs.then(|| DMatrix::from_element(r, m, 1.0)),
        };
        ReducedModel::from_operators(form, has_inputs, r, operators).unwrap()
    }

    #[test]
    fn decays_under_negative_identity() {
        let model = trained("L", false, 3, 0);
        let t = linspace(6, 1.0);
        let x0 = dvector![1.0, -2.0, 0.5];

        let states = model.predict(&x0, &t, Input::None).unwrap();

        assert_eq!(states.shape(), (3, 6));
        for (j, time) in t.iter().enumerate() {
            let expected = &x0 * (-time).exp();
            assert_relative_eq!(states.column(j).into_owned(), expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn input_function_drives_state() {
        // dx/dt = -x + u with u = 1 relaxes to 1.
        let model = trained("L", true, 1, 1);
        let t = linspace(11, 1.0);
        let u = |_t: f64| dvector![1.0];

        let states = model.predict(&dvector![0.0], &t, Input::Function(&u)).unwrap();

        for (j, time) in t.iter().enumerate() {
            assert_relative_eq!(states[(0, j)], 1.0 - (-time).exp(), epsilon = 1e-8);
        }

        let scalar = |_t: f64| 1.0;
        let from_scalar = model.predict(&dvector![0.0], &t, Input::Scalar(&scalar)).unwrap();
        assert_relative_eq!(from_scalar, states);
    }

    #[test]
    fn sampled_inputs_match_constant_function() {
        let model = trained("Lc", true, 2, 3);
        let t = linspace(5, 0.04);
        let x0 = dvector![0.3, 0.7];

        let u = |_t: f64| DVector::from_element(3, 1.0);
        let from_function = model.predict(&x0, &t, Input::Function(&u)).unwrap();

        let samples = DMatrix::from_element(3, t.len(), 1.0);
        let from_samples = model.predict(&x0, &t, (&samples).into()).unwrap();

        assert_relative_eq!(from_function, from_samples, epsilon = 1e-12);

        let one_input = trained("Lc", true, 2, 1);
        let samples = DVector::from_element(t.len(), 1.0);
        let states = one_input.predict(&x0, &t, (&samples).into()).unwrap();
        assert_eq!(states.shape(), (2, t.len()));
    }

    #[test]
    fn rejects_bad_initial_state() {
        let model = trained("LQc", false, 10, 0);
        let err = model.predict(&DVector::zeros(200), &[0.0, 0.1], Input::None).unwrap_err();
        assert_eq!(err.to_string(), "invalid initial state size (200 != 10)");
    }

    #[test]
    fn rejects_bad_time_grid() {
        let model = trained("L", false, 2, 0);
        let err = model.predict(&DVector::zeros(2), &[0.0, 0.2, 0.1], Input::None).unwrap_err();
        assert!(matches!(err, Error::InvalidTimeGrid(_)));
        let err = model.predict(&DVector::zeros(2), &[], Input::None).unwrap_err();
        assert!(matches!(err, Error::InvalidTimeGrid(_)));
    }

    #[test]
    fn rejects_misshapen_sampled_inputs() {
        let t = linspace(5, 0.05);
        let model = trained("LQc", true, 4, 20);
        let bad = DMatrix::zeros(19, 5);
        let err = model.predict(&DVector::zeros(4), &t, (&bad).into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid input shape ((19, 5) != (20, 5))");

        let model = trained("LQc", true, 4, 1);
        let bad = DMatrix::zeros(2, 5);
        let err = model.predict(&DVector::zeros(4), &t, (&bad).into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid input shape ((2, 5) != (1, 5))");
    }

    #[test]
    fn rejects_misshapen_input_functions() {
        let t = linspace(5, 0.05);
        let model = trained("LQc", true, 4, 20);

        let short = |_t: f64| DVector::from_element(19, 1.0);
        let err = model.predict(&DVector::zeros(4), &t, Input::Function(&short)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input function u() must return a vector of shape (m,)=(20,)"
        );

        let scalar = |_t: f64| 1.0;
        let err = model.predict(&DVector::zeros(4), &t, Input::Scalar(&scalar)).unwrap_err();
        assert!(matches!(err, Error::InputSignatureMismatch { m: 20 }));

        let model = trained("LQc", true, 4, 1);
        let wide = |_t: f64| DVector::from_element(20, 1.0);
        let err = model.predict(&DVector::zeros(4), &t, Input::Function(&wide)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input function u() must return a vector of shape (m,)=(1,) or scalar"
        );
    }

    #[test]
    fn checks_input_presence() {
        let t = [0.0, 0.1];
        let with_inputs = trained("L", true, 2, 1);
        let err = with_inputs.predict(&DVector::zeros(2), &t, Input::None).unwrap_err();
        assert!(matches!(err, Error::MissingInput { argname: "u" }));

        let without = trained("L", false, 2, 0);
        let u = DVector::zeros(2);
        let err = without
            .predict(&DVector::zeros(2), &t, Input::Discrete(InputData::Vector(&u)))
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedInput { argname: "u" }));
    }

    #[test]
    fn rhs_builder_rejects_mismatched_signal() {
        let with_inputs = trained("", true, 2, 1);
        let operators = with_inputs.operators().unwrap();
        let err = with_inputs
            .construct_rhs(operators, &Signal::None, 1)
            .err()
            .unwrap();
        assert!(matches!(err, Error::ImproperUse));

        let without = trained("", false, 2, 0);
        let operators = without.operators().unwrap();
        let interp = MatrixInterp::new(
            &[0.0],
            &[DMatrix::zeros(1, 1)],
            Strategy1D::Linear,
            Extrapolate::Clamp,
        )
        .unwrap();
        let signal = Signal::Sampled(interp);
        let err = without.construct_rhs(operators, &signal, 1).err().unwrap();
        assert!(matches!(err, Error::ImproperUse));
    }

    #[test]
    fn predict_full_lifts_through_basis() {
        let vr = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let model = trained("L", false, 2, 0).with_basis(vr).unwrap();
        let t = linspace(3, 0.5);

        let states = model.predict_full(&dvector![2.0, 4.0, 9.0], &t, Input::None).unwrap();

        assert_eq!(states.shape(), (3, 3));
        assert_relative_eq!(states[(0, 2)], 2.0 * (-0.5f64).exp(), epsilon = 1e-8);
        assert_relative_eq!(states[(1, 2)], 4.0 * (-0.5f64).exp(), epsilon = 1e-8);
        assert_relative_eq!(states[(2, 2)], 0.0);

        let err = trained("L", false, 2, 0)
            .predict_full(&DVector::zeros(3), &t, Input::None)
            .unwrap_err();
        assert!(matches!(err, Error::MissingBasis));
    }
}
