//! A family of inferred continuous models interpolated across a scalar
//! parameter.
//!
//! One [`InferredModel<Continuous>`] is fit per parameter sample. The reduced
//! operators are then interpolated entrywise in the parameter (piecewise
//! linear by default, exact at every sample) and evaluated to build a one-off
//! model for each prediction.

use nalgebra::{DMatrix, DVector};
use opinf_core::{ModelForm, OperatorError, ReducedOperators};
use opinf_solvers::{interpolate::MatrixInterp, transient};

use crate::{
    Continuous, Error, FitConfig, InferredModel, Input, InputData, InterpolationConfig,
    ReducedModel,
};

/// A value usable as a scalar parameter.
///
/// Implemented for `f64` and for one-element vectors and slices. Anything
/// with more than one element is rejected with [`Error::NonScalarParameter`].
pub trait ParameterValue {
    /// The scalar value, or `None` if the value is not a scalar.
    fn as_scalar(&self) -> Option<f64>;
}

impl ParameterValue for f64 {
    fn as_scalar(&self) -> Option<f64> {
        Some(*self)
    }
}

impl ParameterValue for DVector<f64> {
    fn as_scalar(&self) -> Option<f64> {
        self.as_slice().as_scalar()
    }
}

impl ParameterValue for [f64] {
    fn as_scalar(&self) -> Option<f64> {
        match self {
            [value] => Some(*value),
            _ => None,
        }
    }
}

impl ParameterValue for Vec<f64> {
    fn as_scalar(&self) -> Option<f64> {
        self.as_slice().as_scalar()
    }
}

impl<const N: usize> ParameterValue for [f64; N] {
    fn as_scalar(&self) -> Option<f64> {
        self.as_slice().as_scalar()
    }
}

impl<T: ParameterValue + ?Sized> ParameterValue for &T {
    fn as_scalar(&self) -> Option<f64> {
        (**self).as_scalar()
    }
}

/// Per-slot interpolants over the parameter.
#[derive(Debug)]
struct Interpolants {
    a: Option<MatrixInterp>,
    f: Option<MatrixInterp>,
    c: Option<MatrixInterp>,
    b: Option<MatrixInterp>,
}

#[derive(Debug)]
struct Fitted {
    parameters: Vec<f64>,
    models: Vec<InferredModel<Continuous>>,
    interpolants: Interpolants,
    r: usize,
    basis: DMatrix<f64>,
}

/// Inferred continuous models fit at parameter samples and interpolated
/// between them.
#[derive(Debug)]
pub struct InterpolatedInferredContinuousModel {
    form: ModelForm,
    has_inputs: bool,
    fit_config: FitConfig,
    interpolation: InterpolationConfig,
    integrator: transient::Config,
    fitted: Option<Fitted>,
}

impl InterpolatedInferredContinuousModel {
    #[must_use]
    pub fn new(form: ModelForm, has_inputs: bool) -> Self {
        Self {
            form,
            has_inputs,
            fit_config: FitConfig::default(),
            interpolation: InterpolationConfig::default(),
            integrator: transient::Config::default(),
            fitted: None,
        }
    }

    #[must_use]
    pub fn with_fit_config(mut self, config: FitConfig) -> Self {
        self.fit_config = config;
        self
    }

    #[must_use]
    pub fn with_interpolation(mut self, config: InterpolationConfig) -> Self {
        self.interpolation = config;
        self
    }

    #[must_use]
    pub fn with_integrator(mut self, config: transient::Config) -> Self {
        self.integrator = config;
        self
    }

    pub fn form(&self) -> ModelForm {
        self.form
    }

    pub fn has_inputs(&self) -> bool {
        self.has_inputs
    }

    /// Changes the model form, discarding any fit.
    pub fn set_form(&mut self, form: ModelForm) {
        self.form = form;
        self.fitted = None;
    }

    /// Changes the input flag, discarding any fit.
    pub fn set_has_inputs(&mut self, has_inputs: bool) {
        self.has_inputs = has_inputs;
        self.fitted = None;
    }

    /// Fits one inferred model per parameter sample.
    ///
    /// `xs[i]` and `xdots[i]` (`n × k_i`) are the snapshots and time
    /// derivatives at `parameters[i]`; `us[i]` holds the inputs when the
    /// model has them, with one shared shape across samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonScalarParameter`], [`Error::SampleCountMismatch`],
    /// [`Error::InconsistentInputShape`], any error from the per-sample fits,
    /// or an interpolation error (for example for repeated parameters).
    pub fn fit<P: ParameterValue>(
        &mut self,
        parameters: &[P],
        xs: &[DMatrix<f64>],
        xdots: &[DMatrix<f64>],
        vr: &DMatrix<f64>,
        us: Option<&[InputData<'_>]>,
    ) -> Result<(), Error> {
        let parameters = parameters
            .iter()
            .map(ParameterValue::as_scalar)
            .collect::<Option<Vec<f64>>>()
            .ok_or(Error::NonScalarParameter)?;

        let count = parameters.len();
        check_count("state", count, xs.len())?;
        check_count("velocity", count, xdots.len())?;

        let us = match (self.has_inputs, us) {
            (true, None) => return Err(Error::MissingInput { argname: "Us" }),
            (false, Some(_)) => return Err(Error::UnexpectedInput { argname: "Us" }),
            (_, us) => us,
        };
        if let Some(us) = us {
            check_count("input", count, us.len())?;
            if let Some(first) = us.first() {
                if us.iter().any(|u| u.shape() != first.shape()) {
                    return Err(Error::InconsistentInputShape);
                }
            }
        }

        self.fitted = None;
        let mut models = Vec::with_capacity(count);
        for i in 0..count {
            let mut model = InferredModel::<Continuous>::new(self.form, self.has_inputs)
                .with_config(self.fit_config);
            model.fit(&xs[i], &xdots[i], vr, us.map(|us| us[i]))?;
            log::debug!(
                "fit sample {i} at parameter {}: cond = {:.3e}, residual = {:.3e}",
                parameters[i],
                model.datacond().unwrap_or(f64::NAN),
                model.residual().unwrap_or(f64::NAN)
            );
            models.push(model);
        }

        let interpolants = self.build_interpolants(&parameters, &models)?;
        self.fitted = Some(Fitted {
            parameters,
            models,
            interpolants,
            r: vr.ncols(),
            basis: vr.clone(),
        });
        Ok(())
    }

    /// The parameter samples, in the order given to `fit`.
    pub fn parameters(&self) -> &[f64] {
        self.fitted.as_ref().map_or(&[], |f| &f.parameters)
    }

    /// One fitted model per parameter sample.
    pub fn models(&self) -> &[InferredModel<Continuous>] {
        self.fitted.as_ref().map_or(&[], |f| &f.models)
    }

    /// Regression condition number for each sample.
    pub fn dataconds(&self) -> Vec<f64> {
        self.models()
            .iter()
            .map(|m| m.datacond().unwrap_or(f64::NAN))
            .collect()
    }

    /// Regression residual for each sample.
    pub fn residuals(&self) -> Vec<f64> {
        self.models()
            .iter()
            .map(|m| m.residual().unwrap_or(f64::NAN))
            .collect()
    }

    /// The reduced model with operators interpolated at `parameter`.
    ///
    /// # Errors
    ///
    /// Fails if the model has not been fit, if `parameter` is not a scalar,
    /// or if an operator cannot be interpolated there.
    pub fn model_at<P: ParameterValue>(
        &self,
        parameter: P,
    ) -> Result<ReducedModel<Continuous>, Error> {
        let parameter = parameter.as_scalar().ok_or(Error::NonScalarParameter)?;
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::from(OperatorError::untrained(self.form, self.has_inputs)))?;

        let at = |interp: &Option<MatrixInterp>| {
            interp
                .as_ref()
                .map(|interp| interp.evaluate(parameter))
                .transpose()
        };
        let operators = ReducedOperators {
            a: at(&fitted.interpolants.a)?,
            f: at(&fitted.interpolants.f)?,
            c: at(&fitted.interpolants.c)?.map(|c| DVector::from_column_slice(c.as_slice())),
            b: at(&fitted.interpolants.b)?,
        };

        ReducedModel::from_operators(self.form, self.has_inputs, fitted.r, operators)?
            .with_basis(fitted.basis.clone())
            .map(|model| model.with_integrator(self.integrator))
    }

    /// Integrates the model interpolated at `parameter`; see
    /// [`ReducedModel::predict`].
    ///
    /// # Errors
    ///
    /// As for [`InterpolatedInferredContinuousModel::model_at`] and the
    /// reduced model.
    pub fn predict<P: ParameterValue>(
        &self,
        parameter: P,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model_at(parameter)?.predict(x0, t, u)
    }

    /// Projects a full-order `x0`, integrates at `parameter`, and lifts the
    /// result back to full order.
    ///
    /// # Errors
    ///
    /// As for [`InterpolatedInferredContinuousModel::predict`].
    pub fn predict_full<P: ParameterValue>(
        &self,
        parameter: P,
        x0: &DVector<f64>,
        t: &[f64],
        u: Input<'_>,
    ) -> Result<DMatrix<f64>, Error> {
        self.model_at(parameter)?.predict_full(x0, t, u)
    }

    fn build_interpolants(
        &self,
        parameters: &[f64],
        models: &[InferredModel<Continuous>],
    ) -> Result<Interpolants, Error> {
        // ninterp needs an increasing grid.
        let mut order: Vec<usize> = (0..parameters.len()).collect();
        order.sort_by(|&i, &j| parameters[i].total_cmp(&parameters[j]));
        let grid: Vec<f64> = order.iter().map(|&i| parameters[i]).collect();

        type Pick<'a> = &'a dyn Fn(&ReducedOperators) -> Option<DMatrix<f64>>;
        let slot = |pick: Pick<'_>| -> Result<Option<MatrixInterp>, Error> {
            let samples = order
                .iter()
                .filter_map(|&i| models[i].model().operators().and_then(pick))
                .collect::<Vec<_>>();
            if samples.is_empty() {
                return Ok(None);
            }
            let InterpolationConfig {
                strategy,
                extrapolate,
            } = self.interpolation;
            Ok(Some(MatrixInterp::new(&grid, &samples, strategy, extrapolate)?))
        };

        Ok(Interpolants {
            a: slot(&|ops| ops.a.clone())?,
            f: slot(&|ops| ops.f.clone())?,
            c: slot(&|ops| {
                ops.c
                    .as_ref()
                    .map(|c| DMatrix::from_column_slice(c.len(), 1, c.as_slice()))
            })?,
            b: slot(&|ops| ops.b.clone())?,
        })
    }
}

impl std::fmt::Display for InterpolatedInferredContinuousModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let structure = ReducedModel::<Continuous>::new(self.form, self.has_inputs);
        std::fmt::Display::fmt(&structure, f)
    }
}

fn check_count(sets: &'static str, parameters: usize, actual: usize) -> Result<(), Error> {
    if parameters != actual {
        return Err(Error::SampleCountMismatch {
            sets,
            parameters,
            actual,
        });
    }
    Ok(())
}
