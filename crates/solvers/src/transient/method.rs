use nalgebra::DVector;
use opinf_core::{Model, StepIntegrable};

use super::{Error, Method, TimeState};

impl Method {
    /// Advances `state` from `time` by one step of size `dt`.
    pub(crate) fn advance<M>(
        self,
        model: &M,
        time: f64,
        state: &DVector<f64>,
        dt: f64,
    ) -> Result<DVector<f64>, Error>
    where
        M: Model<Input = TimeState, Output = DVector<f64>>,
    {
        let rhs = |time: f64, state: DVector<f64>| -> Result<DVector<f64>, Error> {
            let expected = state.len();
            let derivative = model.call(&TimeState { time, state }).map_err(Error::model)?;
            if derivative.len() != expected {
                return Err(Error::DerivativeSize {
                    expected,
                    actual: derivative.len(),
                });
            }
            Ok(derivative)
        };

        match self {
            Method::ForwardEuler => {
                let k1 = rhs(time, state.clone())?;
                Ok(state.step(k1, dt))
            }
            Method::Rk4 => {
                let half = 0.5 * dt;
                let k1 = rhs(time, state.clone())?;
                let k2 = rhs(time + half, state.step(k1.clone(), half))?;
                let k3 = rhs(time + half, state.step(k2.clone(), half))?;
                let k4 = rhs(time + dt, state.step(k3.clone(), dt))?;
                let slope = (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0;
                Ok(state.step(slope, dt))
            }
        }
    }
}
