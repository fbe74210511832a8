//! Fixed-grid integration of `dx/dt = f(t, x)`.
//!
//! The right-hand side is any [`Model`] from [`TimeState`] to the state
//! derivative. The solver reports the state at every time of a caller-supplied
//! grid, taking a configurable number of explicit steps inside each interval:
//!
//! ```text
//! forward Euler: x_{n+1} = x_n + h f(t_n, x_n)
//! RK4:           x_{n+1} = x_n + h (k1 + 2 k2 + 2 k3 + k4) / 6
//! ```
//!
//! # Example
//!
//! ```ignore
//! use opinf_solvers::transient;
//!
//! let solution = transient::solve_unobserved(&rhs, x0, &times, &transient::Config::default())?;
//!
//! for state in &solution.states {
//!     println!("{state}");
//! }
//! ```

mod action;
mod config;
mod error;
mod event;
mod grid;
mod method;
mod solution;
mod time_state;

pub use action::Action;
pub use config::{Config, ConfigError, Method};
pub use error::Error;
pub use event::Event;
pub use grid::{GridError, validate_grid};
pub use solution::{Solution, Status};
pub use time_state::TimeState;

use nalgebra::DVector;
use opinf_core::{Model, Observer};

/// Integrates `dx/dt = model(t, x)` over `times`, starting from `initial`.
///
/// # Algorithm
///
/// 1. Validate the time grid and emit the initial state as step 0.
/// 2. For each grid interval `[t_j, t_{j+1}]`:
///    - Take `config.substeps()` equal steps of `config.method()`.
///    - If the state is no longer finite, stop with [`Status::NonFinite`].
///    - Emit an [`Event`] to the observer.
///    - If the observer returns `StopEarly`, terminate.
/// 3. Return every reached state.
///
/// # Observer
///
/// The observer receives an [`Event`] at every reached grid time and may
/// return [`Action::StopEarly`] to terminate the integration early.
///
/// # Errors
///
/// Returns an error if the grid is invalid, if the model fails, or if it
/// returns a derivative of the wrong size.
pub fn solve<M, Obs>(
    model: &M,
    initial: DVector<f64>,
    times: &[f64],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    M: Model<Input = TimeState, Output = DVector<f64>>,
    Obs: Observer<Event, Action>,
{
    validate_grid(times)?;

    let mut states = Vec::with_capacity(times.len());
    states.push(initial.clone());

    // Emit initial event.
    let event = Event {
        step: 0,
        time: times[0],
        state: initial,
    };
    if let Some(Action::StopEarly) = observer.observe(&event) {
        return Ok(Solution {
            status: Status::StoppedByObserver,
            states,
            steps: 0,
        });
    }

    let mut current = event.state;
    let substeps = config.substeps();

    for (interval, window) in times.windows(2).enumerate() {
        let step = interval + 1;
        let (start, end) = (window[0], window[1]);
        let dt = (end - start) / substeps as f64;

        let mut next = current;
        for k in 0..substeps {
            let time = start + k as f64 * dt;
            next = config.method().advance(model, time, &next, dt)?;
        }

        let finite = next.iter().all(|v| v.is_finite());
        states.push(next.clone());

        if !finite {
            log::debug!("state became non-finite at t = {end}");
            return Ok(Solution {
                status: Status::NonFinite,
                states,
                steps: step,
            });
        }

        // Emit event to observer.
        let event = Event {
            step,
            time: end,
            state: next,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(Solution {
                status: Status::StoppedByObserver,
                states,
                steps: step,
            });
        }

        current = event.state;
    }

    Ok(Solution {
        status: Status::Complete,
        states,
        steps: times.len() - 1,
    })
}

/// Integrates over `times` without observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error if the grid is invalid or the model fails.
pub fn solve_unobserved<M>(
    model: &M,
    initial: DVector<f64>,
    times: &[f64],
    config: &Config,
) -> Result<Solution, Error>
where
    M: Model<Input = TimeState, Output = DVector<f64>>,
{
    solve(model, initial, times, config, ())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use nalgebra::dvector;

    // --- Test fixtures ---

    /// dx/dt = rate * x
    struct Exponential {
        rate: f64,
    }

    impl Model for Exponential {
        type Input = TimeState;
        type Output = DVector<f64>;
        type Error = Infallible;

        fn call(&self, input: &TimeState) -> Result<DVector<f64>, Infallible> {
            Ok(&input.state * self.rate)
        }
    }

    /// dx/dt = [1, t]
    struct Ramp;

    impl Model for Ramp {
        type Input = TimeState;
        type Output = DVector<f64>;
        type Error = Infallible;

        fn call(&self, input: &TimeState) -> Result<DVector<f64>, Infallible> {
            Ok(dvector![1.0, input.time])
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("rhs unavailable")]
    struct Unavailable;

    struct Failing;

    impl Model for Failing {
        type Input = TimeState;
        type Output = DVector<f64>;
        type Error = Unavailable;

        fn call(&self, _input: &TimeState) -> Result<DVector<f64>, Unavailable> {
            Err(Unavailable)
        }
    }

    /// Derivative blows up once t >= 1.
    struct Blowup;

    impl Model for Blowup {
        type Input = TimeState;
        type Output = DVector<f64>;
        type Error = Infallible;

        fn call(&self, input: &TimeState) -> Result<DVector<f64>, Infallible> {
            let rate = if input.time >= 1.0 { f64::INFINITY } else { 1.0 };
            Ok(DVector::from_element(input.state.len(), rate))
        }
    }

    fn grid(n: usize, end: f64) -> Vec<f64> {
        (0..n).map(|i| end * i as f64 / (n - 1) as f64).collect()
    }

    // --- Tests ---

    #[test]
    fn rk4_tracks_exponential_decay() {
        let model = Exponential { rate: -1.0 };
        let times = grid(11, 2.0);

        let solution =
            solve_unobserved(&model, dvector![1.0, 2.0], &times, &Config::default()).unwrap();

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 10);
        assert_eq!(solution.states.len(), 11);
        for (t, state) in times.iter().zip(&solution.states) {
            assert_relative_eq!(state[0], (-t).exp(), epsilon = 1e-8);
            assert_relative_eq!(state[1], 2.0 * (-t).exp(), epsilon = 1e-8);
        }
    }

    #[test]
    fn forward_euler_matches_hand_computation() {
        let model = Exponential { rate: 1.0 };
        let config = Config::new(Method::ForwardEuler, 2).unwrap();

        let solution = solve_unobserved(&model, dvector![1.0], &[0.0, 1.0], &config).unwrap();

        // Two steps of size 0.5: 1 * 1.5 * 1.5.
        assert_relative_eq!(solution.states[1][0], 2.25);
    }

    #[test]
    fn uses_interval_times() {
        let config = Config::new(Method::ForwardEuler, 1).unwrap();

        let solution =
            solve_unobserved(&Ramp, dvector![0.0, 0.0], &[0.0, 0.5, 2.0], &config).unwrap();

        // x1 = x0 + 0.5 * [1, 0]; x2 = x1 + 1.5 * [1, 0.5].
        assert_relative_eq!(solution.states[1], dvector![0.5, 0.0]);
        assert_relative_eq!(solution.states[2], dvector![2.0, 0.75]);
    }

    #[test]
    fn single_time_returns_initial() {
        let model = Exponential { rate: 3.0 };

        let solution =
            solve_unobserved(&model, dvector![5.0], &[0.0], &Config::default()).unwrap();

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 0);
        assert_eq!(solution.states, vec![dvector![5.0]]);
    }

    #[test]
    fn observer_can_stop_early() {
        let model = Exponential { rate: 0.0 };
        let times = grid(101, 1.0);

        let observer = |event: &Event| (event.step >= 5).then_some(Action::StopEarly);

        let solution =
            solve(&model, dvector![1.0], &times, &Config::default(), observer).unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.steps, 5);
        assert_eq!(solution.states.len(), 6);
    }

    #[test]
    fn step_numbers_start_at_zero() {
        let model = Exponential { rate: 0.0 };

        let mut seen = Vec::new();
        solve(
            &model,
            dvector![1.0],
            &[0.0, 0.25, 0.5, 0.75, 1.0],
            &Config::default(),
            |event: &Event| {
                seen.push((event.step, event.time));
                None
            },
        )
        .unwrap();

        assert_eq!(
            seen,
            vec![(0, 0.0), (1, 0.25), (2, 0.5), (3, 0.75), (4, 1.0)]
        );
    }

    #[test]
    fn stops_on_non_finite_state() {
        let config = Config::new(Method::ForwardEuler, 1).unwrap();

        let solution =
            solve_unobserved(&Blowup, dvector![0.0], &[0.0, 1.0, 2.0, 3.0], &config).unwrap();

        assert_eq!(solution.status, Status::NonFinite);
        assert_eq!(solution.steps, 2);
        assert_eq!(solution.states.len(), 3);

        let matrix = solution.to_matrix(1, 4);
        assert_relative_eq!(matrix[(0, 1)], 1.0);
        assert!(matrix[(0, 2)].is_infinite());
        assert!(matrix[(0, 3)].is_nan());
    }

    #[test]
    fn propagates_model_errors() {
        let err = solve_unobserved(&Failing, dvector![1.0], &[0.0, 1.0], &Config::default())
            .unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        assert_eq!(err.to_string(), "model error: rhs unavailable");
    }

    #[test]
    fn rejects_invalid_grid() {
        let model = Exponential { rate: 1.0 };
        let err = solve_unobserved(&model, dvector![1.0], &[0.0, 0.0], &Config::default())
            .unwrap_err();
        assert!(matches!(err, Error::Grid(GridError::NotIncreasing { index: 1 })));
    }

    #[test]
    fn config_rejects_zero_substeps() {
        assert_eq!(
            Config::new(Method::Rk4, 0).unwrap_err(),
            ConfigError::Substeps
        );
        assert_eq!(Config::default().method(), Method::Rk4);
    }
}
