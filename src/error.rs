use thiserror::Error;

/// Errors surfaced by the library.
///
/// Classification and candidate selection never fail; these cover malformed
/// datasets and lookups against the host namespace.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuickchartError {
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("no dataset named '{0}' in the namespace")]
    NameNotFound(String),
}
