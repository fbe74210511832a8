//! Data-driven construction: operators inferred by least-squares regression.
//!
//! Given snapshots `X`, targets `R` (time derivatives for continuous models,
//! successor snapshots for discrete ones), a basis `Vr` and optional inputs
//! `U`, the reduced operators solve
//!
//! ```text
//! min ‖D Oᵀ − (Vrᵀ R)ᵀ‖,   D = [ X̂ᵀ | (X̂ ⊙ X̂)ᵀ | 1 | Uᵀ ],   X̂ = Vrᵀ X
//! ```
//!
//! where only the blocks named by the model form (and inputs) appear, always in
//! the order linear, quadratic, constant, input. `O` is sliced back into
//! `A_`, `F_`, `c_`, `B_` in that same order.

use nalgebra::{DMatrix, DVector};
use opinf_core::{ModelForm, ReducedOperators, Term, quadratic};
use opinf_solvers::lstsq;

use crate::{Continuous, Discrete, Error, Evolution, FitConfig, Input, InputData, ReducedModel};

/// Conditioning and misfit of the last regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    /// Two-norm condition number of the data matrix `D`.
    pub datacond: f64,
    /// Squared Frobenius norm of the regression residual.
    pub residual: f64,
}

/// A reduced model whose operators are inferred from snapshot data.
#[derive(Debug, Clone)]
pub struct InferredModel<E: Evolution> {
    model: ReducedModel<E>,
    config: FitConfig,
    diagnostics: Option<Diagnostics>,
}

impl<E: Evolution> InferredModel<E> {
    /// Creates an unfitted model with the default [`FitConfig`].
    #[must_use]
    pub fn new(form: ModelForm, has_inputs: bool) -> Self {
        Self {
            model: ReducedModel::new(form, has_inputs),
            config: FitConfig::default(),
            diagnostics: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: FitConfig) -> Self {
        self.config = config;
        self
    }

    /// The fitted model.
    pub fn model(&self) -> &ReducedModel<E> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut ReducedModel<E> {
        &mut self.model
    }

    pub fn into_model(self) -> ReducedModel<E> {
        self.model
    }

    /// Diagnostics of the last fit, if any.
    pub fn diagnostics(&self) -> Option<Diagnostics> {
        self.diagnostics
    }

    /// Condition number of the last regression data matrix.
    pub fn datacond(&self) -> Option<f64> {
        self.diagnostics.map(|d| d.datacond)
    }

    /// Residual of the last regression.
    pub fn residual(&self) -> Option<f64> {
        self.diagnostics.map(|d| d.residual)
    }

    fn fit_pairs(
        &mut self,
        x: &DMatrix<f64>,
        targets: &DMatrix<f64>,
        vr: &DMatrix<f64>,
        u: Option<InputData<'_>>,
    ) -> Result<(), Error> {
        let (operators, diagnostics) = regress(
            self.model.form(),
            self.model.has_inputs(),
            x,
            targets,
            vr,
            u,
            &self.config,
        )?;
        self.model.set_operators(vr.ncols(), operators)?;
        self.model.set_basis(vr);
        self.diagnostics = Some(diagnostics);
        Ok(())
    }
}

impl InferredModel<Continuous> {
    /// Infers `dx/dt = f(x, u)` from states `x` (`n × k`), their time
    /// derivatives `xdot` (`n × k`), basis `vr` (`n × r`) and, when the model
    /// has inputs, `u` (`m × k`, or length `k` for a single input).
    ///
    /// # Errors
    ///
    /// Fails before any projection if the shapes disagree or `u` contradicts
    /// the input flag; otherwise fails only if the regression itself does.
    /// An ill-conditioned regression is reported through
    /// [`InferredModel::datacond`], not as an error.
    pub fn fit(
        &mut self,
        x: &DMatrix<f64>,
        xdot: &DMatrix<f64>,
        vr: &DMatrix<f64>,
        u: Option<InputData<'_>>,
    ) -> Result<(), Error> {
        self.fit_pairs(x, xdot, vr, u)
    }

    /// Predicts with the fitted model; see [`ReducedModel::predict`].
    ///
    /// # Errors
    ///
    /// As for the underlying model.
    pub fn predict(
        &self,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model.predict(x0, t, u)
    }

    /// Predicts with the fitted model; see [`ReducedModel::predict_full`].
    ///
    /// # Errors
    ///
    /// As for the underlying model.
    pub fn predict_full(
        &self,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model.predict_full(x0, t, u)
    }
}

impl InferredModel<Discrete> {
    /// Infers `x_{j+1} = f(x_j, u_j)` from a trajectory `x` (`n × k`), pairing
    /// each column with its successor. `u`, when required, is aligned with `x`
    /// (`m × k`); its last column is unused.
    ///
    /// # Errors
    ///
    /// As for the continuous fit, plus [`Error::InputShapeMismatch`] when `u`
    /// is not aligned with `x`.
    pub fn fit(
        &mut self,
        x: &DMatrix<f64>,
        vr: &DMatrix<f64>,
        u: Option<InputData<'_>>,
    ) -> Result<(), Error> {
        let k = x.ncols();
        if k < 2 {
            return Err(Error::ShapeMismatch {
                x: x.shape(),
                xdot: (x.nrows(), k.saturating_sub(1)),
            });
        }
        let states = x.columns(0, k - 1).into_owned();
        let successors = x.columns(1, k - 1).into_owned();

        let shifted = match u {
            Some(data) => {
                self.model.check_has_inputs(true, "U")?;
                let m = data.shape().0;
                let full = data.expect_shape((m, k))?;
                Some(full.columns(0, k - 1).into_owned())
            }
            None => None,
        };
        self.fit_pairs(&states, &successors, vr, shifted.as_ref().map(InputData::Matrix))
    }

    /// Predicts with the fitted model; see [`ReducedModel::predict`].
    ///
    /// # Errors
    ///
    /// As for the underlying model.
    pub fn predict(
        &self,
        x0: &DVector<f64>,
        niters: usize,
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model.predict(x0, niters, u)
    }

    /// Predicts with the fitted model; see [`ReducedModel::predict_full`].
    ///
    /// # Errors
    ///
    /// As for the underlying model.
    pub fn predict_full(
        &self,
        x0: &DVector<f64>,
        niters: usize,
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model.predict_full(x0, niters, u)
    }
}

impl<E: Evolution> std::fmt::Display for InferredModel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.model, f)
    }
}

/// Checks the training data shapes before any projection.
pub(crate) fn check_training_data(
    x: &DMatrix<f64>,
    targets: &DMatrix<f64>,
    vr: &DMatrix<f64>,
) -> Result<(), Error> {
    if x.shape() != targets.shape() {
        return Err(Error::ShapeMismatch {
            x: x.shape(),
            xdot: targets.shape(),
        });
    }
    if vr.nrows() != x.nrows() {
        return Err(Error::BasisMismatch {
            x: x.nrows(),
            vr: vr.nrows(),
        });
    }
    Ok(())
}

/// Projects the data, assembles `D`, solves, and slices the operators.
pub(crate) fn regress(
    form: ModelForm,
    has_inputs: bool,
    x: &DMatrix<f64>,
    targets: &DMatrix<f64>,
    vr: &DMatrix<f64>,
    u: Option<InputData<'_>>,
    config: &FitConfig,
) -> Result<(ReducedOperators, Diagnostics), Error> {
    check_training_data(x, targets, vr)?;
    match (has_inputs, u.is_some()) {
        (true, false) => return Err(Error::MissingInput { argname: "U" }),
        (false, true) => return Err(Error::UnexpectedInput { argname: "U" }),
        _ => {}
    }

    let k = x.ncols();
    let u = match u {
        Some(data) => {
            let m = data.shape().0;
            Some(data.expect_shape((m, k))?)
        }
        None => None,
    };

    let x_ = vr.tr_mul(x);
    let r_ = vr.tr_mul(targets);
    let r = vr.ncols();

    let data = data_matrix(form, &x_, u.as_ref());
    log::debug!(
        "fitting '{form}' (inputs: {has_inputs}) with n = {}, k = {k}, r = {r}, data matrix {:?}",
        x.nrows(),
        data.shape()
    );

    let solution = lstsq::solve(&data, &r_.transpose(), config.lstsq())?;
    if solution.condition > config.cond_warn_threshold() {
        log::warn!(
            "regression data matrix is ill-conditioned (cond = {:.3e}); inferred operators may be unreliable",
            solution.condition
        );
    }

    let operators = slice_operators(form, r, &solution.coefficients.transpose());
    Ok((
        operators,
        Diagnostics {
            datacond: solution.condition,
            residual: solution.residual,
        },
    ))
}

/// Column blocks of `D` in canonical order: `X̂ᵀ`, `(X̂ ⊙ X̂)ᵀ`, `1`, `Uᵀ`.
fn data_matrix(form: ModelForm, x_: &DMatrix<f64>, u: Option<&DMatrix<f64>>) -> DMatrix<f64> {
    let k = x_.ncols();
    let mut blocks: Vec<DMatrix<f64>> = Vec::with_capacity(4);
    for term in form.terms() {
        blocks.push(match term {
            Term::Linear => x_.transpose(),
            Term::Quadratic => quadratic::kron2c_columns(x_).transpose(),
            Term::Constant => DMatrix::from_element(k, 1, 1.0),
        });
    }
    if let Some(u) = u {
        blocks.push(u.transpose());
    }

    let d: usize = blocks.iter().map(DMatrix::ncols).sum();
    let mut data = DMatrix::zeros(k, d);
    let mut offset = 0;
    for block in &blocks {
        data.columns_mut(offset, block.ncols()).copy_from(block);
        offset += block.ncols();
    }
    data
}

/// Splits `O` (`r × d`) into operators, in the order used by [`data_matrix`].
fn slice_operators(form: ModelForm, r: usize, o: &DMatrix<f64>) -> ReducedOperators {
    let mut operators = ReducedOperators::default();
    let mut offset = 0;
    for term in form.terms() {
        match term {
            Term::Linear => {
                operators.a = Some(o.columns(offset, r).into_owned());
                offset += r;
            }
            Term::Quadratic => {
                let width = quadratic::compressed_len(r);
                operators.f = Some(o.columns(offset, width).into_owned());
                offset += width;
            }
            Term::Constant => {
                operators.c = Some(o.column(offset).into_owned());
                offset += 1;
            }
        }
    }
    if offset < o.ncols() {
        operators.b = Some(o.columns(offset, o.ncols() - offset).into_owned());
    }
    operators
}
