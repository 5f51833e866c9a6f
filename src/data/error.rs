//! Error types for replicate input parsing and validation
//!
//! [`ParseError`] covers every way raw input can fail to become a
//! [`ReplicateMatrix`](crate::data::ReplicateMatrix) or a
//! [`ReplicatePair`](crate::data::ReplicatePair). Each variant carries the
//! method side and subject position so a caller can point the user at the
//! offending value. Subject positions in messages are 1-based.

use thiserror::Error;

use super::matrix::Method;

/// Errors arising from parsing or validating replicate input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A token could not be read as a finite number
    #[error("Malformed value {token:?} for method {side}, subject {}", .subject + 1)]
    MalformedValue {
        /// Method the token belongs to
        side: Method,
        /// Subject index (0-based)
        subject: usize,
        /// The offending token, trimmed
        token: String,
    },

    /// No subjects were found after parsing
    #[error("No values were supplied for method {side}")]
    EmptyInput { side: Method },

    /// A subject row has no replicate values
    #[error("Subject {} of method {side} has no replicate values", .subject + 1)]
    EmptySubject { side: Method, subject: usize },

    /// Subjects within one matrix have different replicate counts
    #[error(
        "Method {side} must have the same number of replicates for every subject: subject 1 has {expected}, subject {} has {found}",
        .subject + 1
    )]
    NonRectangular {
        side: Method,
        subject: usize,
        expected: usize,
        found: usize,
    },

    /// X and Y do not contain the same number of subjects
    #[error("The number of subjects for X and Y must match: X has {x}, Y has {y}")]
    SampleCountMismatch {
        /// Subject count of the X matrix
        x: usize,
        /// Subject count of the Y matrix
        y: usize,
    },

    /// A CSV row names a method other than X or Y
    #[error("Unknown method {label:?} for subject {subject}")]
    UnknownMethod { label: String, subject: String },

    /// A CSV subject has readings for only one of the two methods
    #[error("Subject {subject} has no readings for method {missing}")]
    UnpairedSubject { subject: String, missing: Method },

    /// Error encountered when reading CSV data
    #[error("CSV error: {0}")]
    CSVError(String),
}
