//! Type-tagged replicate input
//!
//! Replicates reach the library either as delimited text typed by a user or as a
//! grid of cells collected by a data-entry surface. [`MatrixInput`] carries both
//! forms, and [`ReplicateMatrix::from_input`] is the single constructor that
//! dispatches on the variant.

use serde::{Deserialize, Serialize};

use super::error::ParseError;
use super::matrix::{Method, ReplicateMatrix, ReplicatePair};
use super::parser::text;

/// The kind of values an input carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// Delimited free text
    Text,
    /// A grid of whole-number cells
    Integer,
    /// A grid of floating point cells
    Numeric,
}

/// Raw replicate input for one method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatrixInput {
    /// Delimited text, see [text::parse_rows] for the layout
    Text(String),
    /// Whole-number cells, one row per subject
    Integer(Vec<Vec<i64>>),
    /// Floating point cells, one row per subject
    Numeric(Vec<Vec<f64>>),
}

impl MatrixInput {
    pub fn kind(&self) -> InputKind {
        match self {
            MatrixInput::Text(_) => InputKind::Text,
            MatrixInput::Integer(_) => InputKind::Integer,
            MatrixInput::Numeric(_) => InputKind::Numeric,
        }
    }
}

impl From<&str> for MatrixInput {
    fn from(text: &str) -> Self {
        MatrixInput::Text(text.to_string())
    }
}

impl From<String> for MatrixInput {
    fn from(text: String) -> Self {
        MatrixInput::Text(text)
    }
}

impl From<Vec<Vec<f64>>> for MatrixInput {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        MatrixInput::Numeric(rows)
    }
}

impl From<Vec<Vec<i64>>> for MatrixInput {
    fn from(rows: Vec<Vec<i64>>) -> Self {
        MatrixInput::Integer(rows)
    }
}

/// Options for reading text input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Separator between replicate values (default: `,`)
    pub delimiter: char,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl ParseOptions {
    /// Set the value delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl ReplicateMatrix {
    /// Build a matrix from any supported input kind
    ///
    /// Text is tokenized with [text::parse_rows]; integer grids are rejected past
    /// the exact `f64` range, then every grid is checked for shape
    /// and finiteness.
    pub fn from_input(
        side: Method,
        input: MatrixInput,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let rows = match input {
            MatrixInput::Text(raw) => text::parse_rows(side, &raw, options)?,
            MatrixInput::Integer(cells) => cells
                .into_iter()
                .enumerate()
                .map(|(subject, row)| widen_row(side, subject, row))
                .collect::<Result<Vec<_>, ParseError>>()?,
            MatrixInput::Numeric(cells) => cells,
        };
        let matrix = ReplicateMatrix::new(side, rows)?;
        tracing::debug!(
            side = %side,
            subjects = matrix.n_subjects(),
            replicates = matrix.n_replicates(),
            "parsed replicate matrix"
        );
        Ok(matrix)
    }
}

/// Largest magnitude at which every integer has an exact `f64`
const MAX_EXACT_INTEGER: u64 = 1 << f64::MANTISSA_DIGITS;

fn widen_row(side: Method, subject: usize, row: Vec<i64>) -> Result<Vec<f64>, ParseError> {
    row.into_iter()
        .map(|v| {
            if v.unsigned_abs() > MAX_EXACT_INTEGER {
                return Err(ParseError::MalformedValue {
                    side,
                    subject,
                    token: v.to_string(),
                });
            }
            Ok(v as f64)
        })
        .collect()
}

impl ReplicatePair {
    /// Build and pair both matrices
    ///
    /// X is validated before Y, and both before the subject counts are compared,
    /// so a malformed token is reported ahead of a count mismatch.
    pub fn from_inputs(
        x: impl Into<MatrixInput>,
        y: impl Into<MatrixInput>,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let x = ReplicateMatrix::from_input(Method::X, x.into(), options)?;
        let y = ReplicateMatrix::from_input(Method::Y, y.into(), options)?;
        ReplicatePair::new(x, y)
    }
}
