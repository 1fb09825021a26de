// Copyright 2025 Tellus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for Tellus
//!
//! This module defines all error types used throughout the join core.

use thiserror::Error;

/// Result type alias for Tellus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Tellus operations
///
/// This enum covers all error cases including both sentinel errors
/// and structured errors with context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Malformed input that failed to parse
    #[error("parse error: {0}")]
    Parse(String),

    // =========================================================================
    // Operator contract errors
    // =========================================================================
    /// `add_child` was called with a variable that matches neither join side
    #[error("variable '{0}' matches neither join variable")]
    UnknownJoinVariable(String),

    /// A join variable is not produced by the child it was attached for
    #[error("variable '{variable}' is not defined by the attached child")]
    VariableNotInChild { variable: String },

    /// An operation that requires both children was called on an
    /// incomplete node
    #[error("spatial join needs two children, but at least one is missing")]
    MissingChild,

    /// A variable was inserted twice into a variable-to-column map
    #[error("duplicate variable '{0}'")]
    DuplicateVariable(String),

    // =========================================================================
    // Data errors
    // =========================================================================
    /// A point column held something other than a text literal
    #[error("point column does not hold a text literal: {0}")]
    PointColumnNotText(String),

    /// A text literal could not be parsed as a WKT point
    #[error("malformed WKT point: '{0}'")]
    InvalidWktPoint(String),

    /// Row width does not match the table it is appended to
    #[error("table columns don't match, expected {expected}, got {got}")]
    TableColumnsNotMatch { expected: usize, got: usize },

    // =========================================================================
    // Execution errors
    // =========================================================================
    /// Query cancelled
    #[error("query cancelled")]
    QueryCancelled,

    /// The memory-limited allocator rejected an allocation
    #[error("memory limit of {limit} bytes exceeded (requested {requested} more bytes)")]
    MemoryExhausted { limit: usize, requested: usize },
}

impl Error {
    /// Create a new Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Create a new TableColumnsNotMatch error
    pub fn table_columns_not_match(expected: usize, got: usize) -> Self {
        Error::TableColumnsNotMatch { expected, got }
    }

    /// Create a new MemoryExhausted error
    pub fn memory_exhausted(limit: usize, requested: usize) -> Self {
        Error::MemoryExhausted { limit, requested }
    }

    /// Check if this is a violation of the operator contract
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::UnknownJoinVariable(_)
                | Error::VariableNotInChild { .. }
                | Error::MissingChild
                | Error::DuplicateVariable(_)
        )
    }

    /// Check if this is a data error (malformed cell content)
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::PointColumnNotText(_)
                | Error::InvalidWktPoint(_)
                | Error::TableColumnsNotMatch { .. }
        )
    }

    /// Check if this error aborts execution rather than planning
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Error::QueryCancelled | Error::MemoryExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::parse("bad predicate").to_string(),
            "parse error: bad predicate"
        );
        assert_eq!(
            Error::UnknownJoinVariable("?x".to_string()).to_string(),
            "variable '?x' matches neither join variable"
        );
        assert_eq!(
            Error::MissingChild.to_string(),
            "spatial join needs two children, but at least one is missing"
        );
        assert_eq!(Error::QueryCancelled.to_string(), "query cancelled");
        assert_eq!(
            Error::InvalidWktPoint("POINT(a b)".to_string()).to_string(),
            "malformed WKT point: 'POINT(a b)'"
        );
    }

    #[test]
    fn test_structured_error_display() {
        let err = Error::table_columns_not_match(5, 3);
        assert_eq!(
            err.to_string(),
            "table columns don't match, expected 5, got 3"
        );

        let err = Error::memory_exhausted(1024, 256);
        assert_eq!(
            err.to_string(),
            "memory limit of 1024 bytes exceeded (requested 256 more bytes)"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::MissingChild.is_contract_violation());
        assert!(Error::UnknownJoinVariable("?p".into()).is_contract_violation());
        assert!(!Error::QueryCancelled.is_contract_violation());

        assert!(Error::InvalidWktPoint("x".into()).is_data_error());
        assert!(Error::PointColumnNotText("42".into()).is_data_error());
        assert!(!Error::MissingChild.is_data_error());

        assert!(Error::QueryCancelled.is_execution_error());
        assert!(Error::memory_exhausted(1, 1).is_execution_error());
        assert!(!Error::parse("x").is_execution_error());
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(Error::MissingChild, Error::MissingChild);
        assert_ne!(
            Error::UnknownJoinVariable("?a".into()),
            Error::UnknownJoinVariable("?b".into())
        );
    }
}
