//! Projection-based construction: known full-order operators reduced through
//! a basis `Vr`.
//!
//! ```text
//! A_ = Vrᵀ A Vr,   H_ = Vrᵀ H (Vr ⊗ Vr),   c_ = Vrᵀ c,   B_ = Vrᵀ B
//! ```

use nalgebra::{DMatrix, DVector};
use opinf_core::{ModelForm, ReducedOperators, Term, quadratic};

use crate::{Continuous, Discrete, Error, Evolution, Input, ReducedModel};

/// A full-order operator as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FullOperator {
    Matrix(DMatrix<f64>),
    Vector(DVector<f64>),
}

impl From<DMatrix<f64>> for FullOperator {
    fn from(value: DMatrix<f64>) -> Self {
        FullOperator::Matrix(value)
    }
}

impl From<DVector<f64>> for FullOperator {
    fn from(value: DVector<f64>) -> Self {
        FullOperator::Vector(value)
    }
}

impl FullOperator {
    /// Views the operator as a matrix; a vector becomes a single column.
    fn into_matrix(self) -> DMatrix<f64> {
        match self {
            FullOperator::Matrix(m) => m,
            FullOperator::Vector(v) => DMatrix::from_column_slice(v.len(), 1, v.as_slice()),
        }
    }
}

/// The full-order operators retained by an intrusive model.
///
/// The quadratic operator is kept in both Kronecker (`h`) and
/// half-vectorized (`f`) form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FullOperators {
    pub a: Option<DMatrix<f64>>,
    pub h: Option<DMatrix<f64>>,
    pub f: Option<DMatrix<f64>>,
    pub c: Option<DVector<f64>>,
    pub b: Option<DMatrix<f64>>,
}

/// A reduced model obtained by projecting known full-order operators.
#[derive(Debug, Clone)]
pub struct IntrusiveModel<E: Evolution> {
    model: ReducedModel<E>,
    full: Option<FullOperators>,
}

impl<E: Evolution> IntrusiveModel<E> {
    #[must_use]
    pub fn new(form: ModelForm, has_inputs: bool) -> Self {
        Self {
            model: ReducedModel::new(form, has_inputs),
            full: None,
        }
    }

    /// Projects `operators` onto the basis `vr` (`n × r`).
    ///
    /// `operators` lists exactly the operators implied by the model form and
    /// input flag, in the order `A`, `H` or `F`, `c`, `B`. The quadratic
    /// operator may be given as `n × n²` (`H`) or `n × n(n+1)/2` (`F`); `B`
    /// may be a length-`n` vector for a single input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CountMismatch`] if the number of operators is wrong,
    /// or [`Error::OperatorBasisMismatch`] naming the first operator whose
    /// shape does not align with `vr`.
    pub fn fit(&mut self, operators: Vec<FullOperator>, vr: &DMatrix<f64>) -> Result<(), Error> {
        let form = self.model.form();
        let has_inputs = self.model.has_inputs();
        let expected = form.len() + usize::from(has_inputs);
        if operators.len() != expected {
            return Err(Error::CountMismatch {
                expected,
                actual: operators.len(),
            });
        }

        let n = vr.nrows();
        let mut full = FullOperators::default();
        let mut supplied = operators.into_iter();
        for term in form.terms() {
            let Some(operator) = supplied.next() else {
                break;
            };
            match term {
                Term::Linear => full.a = Some(linear(operator, n)?),
                Term::Quadratic => {
                    let (h, f) = quadratic_pair(operator, n)?;
                    full.h = Some(h);
                    full.f = Some(f);
                }
                Term::Constant => full.c = Some(constant(operator, n)?),
            }
        }
        if let Some(operator) = supplied.next() {
            full.b = Some(input(operator, n)?);
        }

        let reduced = ReducedOperators {
            a: full.a.as_ref().map(|a| project_linear(a, vr)),
            f: full.h.as_ref().map(|h| project_quadratic(h, vr)).transpose()?,
            c: full.c.as_ref().map(|c| vr.tr_mul(c)),
            b: full.b.as_ref().map(|b| vr.tr_mul(b)),
        };

        log::debug!(
            "projected '{form}' (inputs: {has_inputs}) from n = {n} to r = {}",
            vr.ncols()
        );

        self.model.set_operators(vr.ncols(), reduced)?;
        self.model.set_basis(vr);
        self.full = Some(full);
        Ok(())
    }

    pub fn model(&self) -> &ReducedModel<E> {
        &self.model
    }

    pub fn into_model(self) -> ReducedModel<E> {
        self.model
    }

    /// All retained full-order operators.
    pub fn full_operators(&self) -> Option<&FullOperators> {
        self.full.as_ref()
    }

    /// Full-order linear operator `A`.
    pub fn a(&self) -> Option<&DMatrix<f64>> {
        self.full.as_ref().and_then(|full| full.a.as_ref())
    }

    /// Full-order quadratic operator in Kronecker form `H`.
    pub fn h(&self) -> Option<&DMatrix<f64>> {
        self.full.as_ref().and_then(|full| full.h.as_ref())
    }

    /// Full-order quadratic operator in half-vectorized form `F`.
    pub fn f(&self) -> Option<&DMatrix<f64>> {
        self.full.as_ref().and_then(|full| full.f.as_ref())
    }

    /// Full-order constant term `c`.
    pub fn c(&self) -> Option<&DVector<f64>> {
        self.full.as_ref().and_then(|full| full.c.as_ref())
    }

    /// Full-order input operator `B`.
    pub fn b(&self) -> Option<&DMatrix<f64>> {
        self.full.as_ref().and_then(|full| full.b.as_ref())
    }
}

impl IntrusiveModel<Continuous> {
    /// Predicts with the projected model; see [`ReducedModel::predict`].
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

    /// Predicts with the projected model; see [`ReducedModel::predict_full`].
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

impl IntrusiveModel<Discrete> {
    /// Predicts with the projected model; see [`ReducedModel::predict`].
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

    /// Predicts with the projected model; see [`ReducedModel::predict_full`].
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

impl<E: Evolution> std::fmt::Display for IntrusiveModel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.model, f)
    }
}

fn linear(operator: FullOperator, n: usize) -> Result<DMatrix<f64>, Error> {
    match operator {
        FullOperator::Matrix(a) if a.shape() == (n, n) => Ok(a),
        _ => Err(Error::OperatorBasisMismatch { operator: "A" }),
    }
}

/// Accepts `H` (`n × n²`) or `F` (`n × n(n+1)/2`) and returns both.
pub(crate) fn quadratic_pair(
    operator: FullOperator,
    n: usize,
) -> Result<(DMatrix<f64>, DMatrix<f64>), Error> {
    let mismatch = Error::OperatorBasisMismatch { operator: "H (F)" };
    let FullOperator::Matrix(q) = operator else {
        return Err(mismatch);
    };
    if q.nrows() != n {
        return Err(mismatch);
    }
    if q.ncols() == n * n {
        let f = quadratic::h2f(&q)?;
        Ok((q, f))
    } else if q.ncols() == quadratic::compressed_len(n) {
        let h = quadratic::f2h(&q)?;
        Ok((h, q))
    } else {
        Err(mismatch)
    }
}

fn constant(operator: FullOperator, n: usize) -> Result<DVector<f64>, Error> {
    let c = operator.into_matrix();
    if c.shape() != (n, 1) {
        return Err(Error::OperatorBasisMismatch { operator: "c" });
    }
    Ok(c.column(0).into_owned())
}

fn input(operator: FullOperator, n: usize) -> Result<DMatrix<f64>, Error> {
    let b = operator.into_matrix();
    if b.nrows() != n {
        return Err(Error::OperatorBasisMismatch { operator: "B" });
    }
    Ok(b)
}

/// `Vrᵀ A Vr`.
pub(crate) fn project_linear(a: &DMatrix<f64>, vr: &DMatrix<f64>) -> DMatrix<f64> {
    vr.tr_mul(a) * vr
}

/// `Vrᵀ H (Vr ⊗ Vr)`, returned in half-vectorized form `F_`.
pub(crate) fn project_quadratic(
    h: &DMatrix<f64>,
    vr: &DMatrix<f64>,
) -> Result<DMatrix<f64>, Error> {
    Ok(quadratic::h2f(&quadratic::project_kron(h, vr))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::dvector;

    const N: usize = 6;
    const R: usize = 2;

    fn basis() -> DMatrix<f64> {
        // Two orthonormal columns.
        let mut vr = DMatrix::zeros(N, R);
        vr[(0, 0)] = 1.0;
        vr[(1, 1)] = 0.6;
        vr[(2, 1)] = 0.8;
        vr
    }

    fn a() -> DMatrix<f64> {
        DMatrix::from_fn(N, N, |i, j| (i as f64 - j as f64) / 10.0)
    }

    fn h() -> DMatrix<f64> {
        DMatrix::from_fn(N, N * N, |i, j| ((i + 2 * j) % 5) as f64 - 2.0)
    }

    fn c() -> DVector<f64> {
        DVector::from_fn(N, |i, _| i as f64)
    }

    fn b() -> DMatrix<f64> {
        DMatrix::from_fn(N, 3, |i, j| (i * j) as f64)
    }

    fn model(form: &str, has_inputs: bool) -> IntrusiveModel<Continuous> {
        IntrusiveModel::new(form.parse().unwrap(), has_inputs)
    }

    #[test]
    fn projects_every_operator() {
        let mut model = model("LQc", true);
        let vr = basis();
        model
            .fit(vec![a().into(), h().into(), c().into(), b().into()], &vr)
            .unwrap();

        let ops = model.model().operators().unwrap();
        assert_relative_eq!(ops.a.clone().unwrap(), vr.transpose() * a() * &vr, epsilon = 1e-12);
        assert_relative_eq!(ops.c.clone().unwrap(), vr.transpose() * c(), epsilon = 1e-12);
        assert_relative_eq!(ops.b.clone().unwrap(), vr.transpose() * b(), epsilon = 1e-12);

        let explicit = vr.transpose() * h() * vr.kronecker(&vr);
        let symmetrized = quadratic::f2h(&quadratic::h2f(&explicit).unwrap()).unwrap();
        assert_relative_eq!(ops.h().unwrap(), symmetrized, epsilon = 1e-10);

        assert_eq!(model.model().n(), Some(N));
        assert_eq!(model.model().m(), Some(3));
        assert_eq!(model.a().unwrap().shape(), (N, N));
        assert_eq!(model.h().unwrap().shape(), (N, N * N));
        assert_eq!(model.f().unwrap().shape(), (N, N * (N + 1) / 2));
        assert_eq!(model.c().unwrap().len(), N);
        assert_eq!(model.b().unwrap().shape(), (N, 3));
    }

    #[test]
    fn accepts_quadratic_in_either_form() {
        let vr = basis();
        let mut from_h = model("Q", false);
        from_h.fit(vec![h().into()], &vr).unwrap();
        let mut from_f = model("Q", false);
        let f = quadratic::h2f(&h()).unwrap();
        from_f.fit(vec![f.into()], &vr).unwrap();

        assert_relative_eq!(
            from_h.model().operators().unwrap().f.clone().unwrap(),
            from_f.model().operators().unwrap().f.clone().unwrap(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn vector_input_operator_becomes_column() {
        let mut model = model("L", true);
        let b1 = b().column(1).into_owned();
        model.fit(vec![a().into(), b1.into()], &basis()).unwrap();

        assert_eq!(model.b().unwrap().shape(), (N, 1));
        assert_eq!(model.model().operators().unwrap().b.as_ref().unwrap().shape(), (R, 1));
    }

    #[test]
    fn rejects_wrong_operator_count() {
        let mut model = model("LQc", true);
        let err = model
            .fit(vec![a().into(), h().into(), b().into()], &basis())
            .unwrap_err();
        assert_eq!(err.to_string(), "expected 4 operators, got 3");
    }

    #[test]
    fn names_misaligned_operator() {
        let vr = basis();
        let a_bad = a().columns(0, N - 2).into_owned();
        let h_bad = h().columns(1, N * N - 1).into_owned();
        let c_bad = dvector![1.0, 2.0, 3.0];
        let b_bad = b().rows(1, N - 1).into_owned();

        let cases: [(Vec<FullOperator>, &str); 4] = [
            (
                vec![a_bad.into(), h().into(), c().into(), b().into()],
                "basis Vr and FOM operator A not aligned",
            ),
            (
                vec![a().into(), h_bad.into(), c().into(), b().into()],
                "basis Vr and FOM operator H (F) not aligned",
            ),
            (
                vec![a().into(), h().into(), c_bad.into(), b().into()],
                "basis Vr and FOM operator c not aligned",
            ),
            (
                vec![a().into(), h().into(), c().into(), b_bad.into()],
                "basis Vr and FOM operator B not aligned",
            ),
        ];

        for (operators, message) in cases {
            let mut model = model("LQc", true);
            let err = model.fit(operators, &vr).unwrap_err();
            assert_eq!(err.to_string(), message);
            assert!(!model.model().is_trained());
        }
    }
}
