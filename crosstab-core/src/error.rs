//! Structured error types for the crosstab workspace.

use thiserror::Error;

/// Unified error type for all crosstab operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrosstabError {
    /// A column pair produced an empty or malformed contingency table.
    #[error("shape error: {0}")]
    Shape(String),

    /// Expected frequencies are undefined (zero total, empty row or column).
    #[error("degenerate table: {0}")]
    DegenerateTable(String),

    /// The column selection cannot be analysed (unknown or repeated name).
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Invalid input (bad arguments, out-of-range values, malformed data)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CrosstabError {
    /// Whether this error is confined to a single column pair.
    ///
    /// Pair-local errors are recorded in the report; all others abort the
    /// analysis.
    pub fn is_pair_local(&self) -> bool {
        matches!(self, Self::Shape(_) | Self::DegenerateTable(_))
    }
}

/// Convenience alias used throughout the crosstab workspace.
pub type Result<T> = std::result::Result<T, CrosstabError>;
