use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ParseError;

/// The measurement method a matrix of replicates belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Reference or first method, plotted on the horizontal axis
    X,
    /// Test or second method
    Y,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::X => write!(f, "X"),
            Method::Y => write!(f, "Y"),
        }
    }
}

/// Replicate readings of one method, one row per subject
///
/// A [ReplicateMatrix] is always rectangular: every subject has the same number of
/// replicates, there is at least one subject, at least one replicate, and every
/// value is finite. These invariants are checked once on construction, after
/// which the matrix is immutable.
///
/// # Examples
///
/// ```
/// use methcomp::data::{Method, ReplicateMatrix};
///
/// let x = ReplicateMatrix::new(Method::X, vec![vec![2.0, 4.0], vec![6.0, 8.0]]).unwrap();
/// assert_eq!(x.n_subjects(), 2);
/// assert_eq!(x.n_replicates(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateMatrix {
    side: Method,
    values: DMatrix<f64>,
}

impl ReplicateMatrix {
    /// Constructs a new [ReplicateMatrix] from rows of replicate values
    ///
    /// # Arguments
    ///
    /// * `side` - The method the readings were taken with
    /// * `rows` - One vector of replicates per subject
    ///
    /// # Errors
    ///
    /// Returns a [ParseError] if there are no subjects, a subject has no replicates,
    /// replicate counts differ between subjects, or a value is not finite.
    pub fn new(side: Method, rows: Vec<Vec<f64>>) -> Result<Self, ParseError> {
        let n_subjects = rows.len();
        if n_subjects == 0 {
            return Err(ParseError::EmptyInput { side });
        }

        let expected = rows[0].len();
        for (subject, row) in rows.iter().enumerate() {
            if row.is_empty() {
                return Err(ParseError::EmptySubject { side, subject });
            }
            if row.len() != expected {
                return Err(ParseError::NonRectangular {
                    side,
                    subject,
                    expected,
                    found: row.len(),
                });
            }
            if let Some(value) = row.iter().find(|v| !v.is_finite()) {
                return Err(ParseError::MalformedValue {
                    side,
                    subject,
                    token: value.to_string(),
                });
            }
        }

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(ReplicateMatrix {
            side,
            values: DMatrix::from_row_slice(n_subjects, expected, &flat),
        })
    }

    /// The method these replicates were measured with
    pub fn side(&self) -> Method {
        self.side
    }

    /// Number of subjects (rows)
    pub fn n_subjects(&self) -> usize {
        self.values.nrows()
    }

    /// Number of replicates per subject (columns)
    pub fn n_replicates(&self) -> usize {
        self.values.ncols()
    }

    /// The underlying subjects × replicates matrix
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Replicates of a single subject
    ///
    /// # Panics
    ///
    /// Panics if `subject` is out of bounds.
    pub fn row(&self, subject: usize) -> Vec<f64> {
        self.values.row(subject).iter().copied().collect()
    }

    /// Iterate over the replicate rows in subject order
    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        self.values
            .row_iter()
            .map(|row| row.iter().copied().collect())
    }

    /// Arithmetic mean of each subject's replicates
    pub fn means(&self) -> Vec<f64> {
        let n = self.n_replicates() as f64;
        self.values
            .row_iter()
            .map(|row| row.iter().sum::<f64>() / n)
            .collect()
    }
}

impl fmt::Display for ReplicateMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Method {}: {} subjects x {} replicates",
            self.side,
            self.n_subjects(),
            self.n_replicates()
        )?;
        for (i, row) in self.rows().enumerate() {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "  {:>4}: {}", i + 1, values.join(", "))?;
        }
        Ok(())
    }
}

/// The paired X and Y replicate matrices of one comparison
///
/// Subjects are paired by row index, so both matrices must hold the same number
/// of subjects. Replicate counts may differ between the two methods.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatePair {
    x: ReplicateMatrix,
    y: ReplicateMatrix,
}

impl ReplicatePair {
    /// Pair two matrices by subject index
    ///
    /// # Errors
    ///
    /// Returns [ParseError::SampleCountMismatch] when the subject counts differ.
    pub fn new(x: ReplicateMatrix, y: ReplicateMatrix) -> Result<Self, ParseError> {
        if x.n_subjects() != y.n_subjects() {
            return Err(ParseError::SampleCountMismatch {
                x: x.n_subjects(),
                y: y.n_subjects(),
            });
        }
        Ok(ReplicatePair { x, y })
    }

    pub fn x(&self) -> &ReplicateMatrix {
        &self.x
    }

    pub fn y(&self) -> &ReplicateMatrix {
        &self.y
    }

    /// Number of paired subjects
    pub fn n_subjects(&self) -> usize {
        self.x.n_subjects()
    }
}

impl fmt::Display for ReplicatePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.x)?;
        write!(f, "{}", self.y)
    }
}
