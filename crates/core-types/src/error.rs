use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Column '{column}' has {actual} values but the index has {expected} dates")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Date index must be strictly ascending, found {previous} followed by {next}")]
    UnsortedIndex { previous: NaiveDate, next: NaiveDate },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}
