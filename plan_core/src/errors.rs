//! # Error Types
//!
//! Structured error types for plan_core. Malformed numeric input is never an
//! error here: blank or non-numeric values degrade to "no value" inside the
//! formulas. Errors are reserved for addressing mistakes (unknown table or
//! row), locked rows, and failed external lookups.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::errors::{PlanError, PlanResult};
//!
//! fn require_table(found: bool, table_id: &str) -> PlanResult<()> {
//!     if !found {
//!         return Err(PlanError::table_not_found(table_id));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(
//!     require_table(false, "t-1").unwrap_err().error_code(),
//!     "TABLE_NOT_FOUND"
//! );
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for plan_core operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Structured error type for planning operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PlanError {
    /// No table with this id in the collection
    #[error("Table not found: {table_id}")]
    TableNotFound { table_id: String },

    /// No row with this id in the table
    #[error("Row not found: {row_id} in table {table_id}")]
    RowNotFound { table_id: String, row_id: String },

    /// Row phase/status forbids edits
    #[error("Row {row_id} is not editable (status: {status})")]
    RowNotEditable { row_id: String, status: String },

    /// A row or table was handed to a collection of another technique
    #[error("Technique mismatch: expected {expected}, found {found}")]
    TechniqueMismatch { expected: String, found: String },

    /// The table's highest sequence number leaves no room for another row
    #[error("No sequence number left in table {table_id}")]
    SequenceExhausted { table_id: String },

    /// Marker catalog or dye-lot piece lookup failed
    #[error("Lookup failed: {source_name} - {reason}")]
    LookupFailed { source_name: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlanError {
    /// Create a TableNotFound error
    pub fn table_not_found(table_id: impl ToString) -> Self {
        PlanError::TableNotFound {
            table_id: table_id.to_string(),
        }
    }

    /// Create a RowNotFound error
    pub fn row_not_found(table_id: impl ToString, row_id: impl ToString) -> Self {
        PlanError::RowNotFound {
            table_id: table_id.to_string(),
            row_id: row_id.to_string(),
        }
    }

    /// Create a RowNotEditable error
    pub fn row_not_editable(row_id: impl ToString, status: impl Into<String>) -> Self {
        PlanError::RowNotEditable {
            row_id: row_id.to_string(),
            status: status.into(),
        }
    }

    /// Create a TechniqueMismatch error
    pub fn technique_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        PlanError::TechniqueMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a SequenceExhausted error
    pub fn sequence_exhausted(table_id: impl ToString) -> Self {
        PlanError::SequenceExhausted {
            table_id: table_id.to_string(),
        }
    }

    /// Create a LookupFailed error
    pub fn lookup_failed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::LookupFailed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., the lookup can be retried
    /// by editing the row again)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlanError::LookupFailed { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::TableNotFound { .. } => "TABLE_NOT_FOUND",
            PlanError::RowNotFound { .. } => "ROW_NOT_FOUND",
            PlanError::RowNotEditable { .. } => "ROW_NOT_EDITABLE",
            PlanError::TechniqueMismatch { .. } => "TECHNIQUE_MISMATCH",
            PlanError::SequenceExhausted { .. } => "SEQUENCE_EXHAUSTED",
            PlanError::LookupFailed { .. } => "LOOKUP_FAILED",
            PlanError::SerializationError { .. } => "SERIALIZATION_ERROR",
            PlanError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::SerializationError {
            reason: err.to_string(),
        }
    }
}
