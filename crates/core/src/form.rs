use std::{fmt, str::FromStr};

use thiserror::Error;

/// A polynomial term that a reduced model may carry.
///
/// The declaration order is the canonical order used everywhere operators are
/// stacked or sliced: linear, quadratic, constant (inputs always come last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    /// `A x`, keyed by `L`.
    Linear,
    /// `H (x ⊗ x)`, keyed by `Q`.
    Quadratic,
    /// `c`, keyed by `c`.
    Constant,
}

impl Term {
    /// All terms in canonical order.
    pub const ALL: [Term; 3] = [Term::Linear, Term::Quadratic, Term::Constant];

    /// Returns the modelform key for this term.
    #[must_use]
    pub fn key(self) -> char {
        match self {
            Term::Linear => 'L',
            Term::Quadratic => 'Q',
            Term::Constant => 'c',
        }
    }

    /// Returns the term for a modelform key, if the key is valid.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|term| term.key() == key)
    }
}

/// Errors raised while parsing a modelform string.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid modelform key '{key}'; options are L, Q, c")]
    InvalidKey { key: char },

    #[error("duplicate modelform key '{key}'")]
    DuplicateKey { key: char },
}

/// The structure of a reduced model: which polynomial terms are present.
///
/// Parsed from strings such as `"LQc"`, `"Lc"` or `""`. Key order in the
/// input does not matter; the canonical rendering is always `L`, `Q`, `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct ModelForm {
    linear: bool,
    quadratic: bool,
    constant: bool,
}

impl ModelForm {
    /// Creates a form from explicit term flags.
    #[must_use]
    pub fn new(linear: bool, quadratic: bool, constant: bool) -> Self {
        Self {
            linear,
            quadratic,
            constant,
        }
    }

    /// Returns `true` if the form includes `term`.
    #[must_use]
    pub fn has(&self, term: Term) -> bool {
        match term {
            Term::Linear => self.linear,
            Term::Quadratic => self.quadratic,
            Term::Constant => self.constant,
        }
    }

    /// Iterates over the included terms in canonical order.
    pub fn terms(&self) -> impl Iterator<Item = Term> + '_ {
        Term::ALL.into_iter().filter(|&term| self.has(term))
    }

    /// Number of included terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms().count()
    }

    /// Returns `true` if no polynomial term is included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set(&mut self, term: Term) {
        match term {
            Term::Linear => self.linear = true,
            Term::Quadratic => self.quadratic = true,
            Term::Constant => self.constant = true,
        }
    }
}

impl FromStr for ModelForm {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut form = ModelForm::default();
        for key in s.chars() {
            let term = Term::from_key(key).ok_or(FormError::InvalidKey { key })?;
            if form.has(term) {
                return Err(FormError::DuplicateKey { key });
            }
            form.set(term);
        }
        Ok(form)
    }
}

impl TryFrom<String> for ModelForm {
    type Error = FormError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelForm> for String {
    fn from(form: ModelForm) -> Self {
        form.to_string()
    }
}

impl fmt::Display for ModelForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.terms().try_for_each(|term| write!(f, "{}", term.key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_combination() {
        let forms = ["L", "Q", "c", "LQ", "Lc", "Qc", "LQc"];
        for s in forms {
            let form: ModelForm = s.parse().unwrap();
            assert_eq!(form.to_string(), s);
            assert_eq!(form.len(), s.len());
        }
    }

    #[test]
    fn canonicalizes_key_order() {
        let form: ModelForm = "cQL".parse().unwrap();
        assert_eq!(form.to_string(), "LQc");
        assert_eq!(
            form.terms().collect::<Vec<_>>(),
            vec![Term::Linear, Term::Quadratic, Term::Constant]
        );
    }

    #[test]
    fn empty_form_is_valid() {
        let form: ModelForm = "".parse().unwrap();
        assert!(form.is_empty());
        assert_eq!(form.to_string(), "");
    }

    #[test]
    fn rejects_invalid_key() {
        let err = "bad_form".parse::<ModelForm>().unwrap_err();
        assert_eq!(err, FormError::InvalidKey { key: 'b' });
        assert_eq!(err.to_string(), "invalid modelform key 'b'; options are L, Q, c");

        let err = "LQC".parse::<ModelForm>().unwrap_err();
        assert_eq!(err, FormError::InvalidKey { key: 'C' });
    }

    #[test]
    fn rejects_duplicate_key() {
        let err = "LQL".parse::<ModelForm>().unwrap_err();
        assert_eq!(err, FormError::DuplicateKey { key: 'L' });
        assert_eq!(err.to_string(), "duplicate modelform key 'L'");
    }
}
