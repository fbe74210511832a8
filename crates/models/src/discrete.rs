use nalgebra::{DMatrix, DVector};

use crate::{Discrete, Error, Input, ReducedModel};

impl ReducedModel<Discrete> {
    /// Iterates the reduced map `niters − 1` times starting from `x0`.
    ///
    /// Returns an `r × niters` matrix whose first column is `x0`. Inputs must
    /// be sampled, with column `j` driving the step from `x_j` to `x_{j+1}`,
    /// so at least `niters − 1` columns are needed. If the state stops being
    /// finite, a warning is logged and the remaining columns are NaN.
    ///
    /// # Errors
    ///
    /// Fails fast if the model is untrained or corrupted, if `x0` does not
    /// have `r` entries, if `niters` is zero, or if `u` contradicts the input
    /// operator.
    pub fn predict(
        &self,
        x0: &DVector<f64>,
        niters: usize,
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        let (r, operators) = self.trained()?;
        self.check_initial_state(x0, r)?;
        if niters == 0 {
            return Err(Error::NoIterations);
        }
        self.check_has_inputs(u.is_some(), "u")?;

        let inputs = match u {
            Input::None => None,
            Input::Discrete(data) => {
                let m = operators.m().unwrap_or(0);
                let (rows, cols) = data.shape();
                if rows != m || cols + 1 < niters {
                    return Err(Error::InputShapeMismatch {
                        expected: (m, niters - 1),
                        actual: (rows, cols),
                    });
                }
                Some(data.to_matrix())
            }
            Input::Function(_) | Input::Scalar(_) => return Err(Error::InputFunctionNotSupported),
        };

        let mut states = DMatrix::from_element(r, niters, f64::NAN);
        states.set_column(0, x0);
        let mut current = x0.clone();
        for j in 1..niters {
            let u_j = inputs.as_ref().map(|u| u.column(j - 1).into_owned());
            current = operators.apply(&current, u_j.as_ref());
            states.set_column(j, &current);
            if current.iter().any(|v| !v.is_finite()) {
                log::warn!(
                    "iteration produced a non-finite state at step {j} of {}; remaining columns are NaN",
                    niters - 1
                );
                break;
            }
        }
        Ok(states)
    }

    /// Projects a full-order `x0` through `Vr`, iterates, and lifts the
    /// result back to full order (`n × niters`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBasis`] without a basis, or any error from
    /// [`ReducedModel::predict`].
    pub fn predict_full(
        &self,
        x0: &DVector<f64>,
        niters: usize,
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        let (x0_, vr) = self.project_initial_state(x0)?;
        Ok(vr * self.predict(&x0_, niters, u)?)
    }
}
