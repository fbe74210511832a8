/// Errors that can occur during a least-squares solve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("data matrix has {data} rows but right-hand side has {rhs}")]
    RowMismatch { data: usize, rhs: usize },

    #[error("least-squares problem is empty (data {data:?}, rhs {rhs:?})")]
    Empty {
        data: (usize, usize),
        rhs: (usize, usize),
    },

    #[error("least-squares data contains non-finite values")]
    NonFinite,

    #[error("decomposition failed: {0}")]
    Decomposition(&'static str),
}
