use std::error::Error as StdError;

use super::GridError;

/// Errors that can occur during transient integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("model error: {0}")]
    Model(#[source] Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("right-hand side returned {actual} values for a state of size {expected}")]
    DerivativeSize { expected: usize, actual: usize },
}

impl Error {
    pub(crate) fn model<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Model(Box::new(err))
    }
}
