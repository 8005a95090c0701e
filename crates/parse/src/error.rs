//! Error types for history-page parsing.
//!
//! Only structural failures are errors: an unrecognized document shape, or
//! a recognized table from which no valid row survived. Individual bad
//! rows are dropped and counted on the outcome, never fatal.

use thiserror::Error;

/// Structural parse failures for a history document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No price table could be located in the document.
    #[error("no price table found in document")]
    TableNotFound,

    /// A table was located but zero rows survived validation.
    #[error("no valid price rows extracted ({dropped} dropped)")]
    NoValidRows {
        /// Rows that were present but failed normalization/validation.
        dropped: usize,
    },
}
