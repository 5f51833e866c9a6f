//! Per-subject summary statistics of replicate readings
//!
//! Every analysis in this crate works on per-subject summaries rather than on
//! raw replicates: the mean of each subject's replicates is the reading that is
//! compared, and the replicate standard deviation sets the subject's weight in
//! the regression fits.
//!
//! A standard deviation needs at least two replicates. What happens with single
//! replicates is controlled by [`ReplicatePolicy`].

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};
use std::fmt;
use thiserror::Error;

use crate::data::{Method, ReplicateMatrix};

/// Minimum replicate count for a sample standard deviation
pub const MIN_REPLICATES_FOR_SD: usize = 2;

/// Errors that can occur while summarizing replicates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    /// Too few replicates to compute a standard deviation
    ///
    /// Matrices are rectangular, so the count applies to every subject of `side`.
    #[error(
        "Method {side} needs at least {required} replicates per subject to estimate its spread, found {found}"
    )]
    InsufficientReplicates {
        side: Method,
        found: usize,
        required: usize,
    },
}

/// How to treat subjects whose standard deviation is undefined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicatePolicy {
    /// Fail with [SummaryError::InsufficientReplicates] (default)
    #[default]
    Reject,
    /// Use a standard deviation of 1 for every subject, so every subject gets
    /// the same unit weight downstream
    UnitWeightFallback,
}

/// Mean and standard deviation of each subject's replicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryVectors {
    /// Method the summaries were computed for
    pub side: Method,
    /// Replicates per subject in the source matrix
    pub replicates: usize,
    /// Arithmetic mean per subject
    pub mean: Vec<f64>,
    /// Sample standard deviation (n − 1 divisor) per subject
    pub sd: Vec<f64>,
}

impl SummaryVectors {
    /// Reduce a replicate matrix to per-subject summaries
    ///
    /// # Errors
    ///
    /// With [ReplicatePolicy::Reject], a matrix with a single replicate per subject
    /// fails with [SummaryError::InsufficientReplicates].
    pub fn from_matrix(
        matrix: &ReplicateMatrix,
        policy: ReplicatePolicy,
    ) -> Result<Self, SummaryError> {
        let replicates = matrix.n_replicates();
        let side = matrix.side();

        if replicates < MIN_REPLICATES_FOR_SD {
            return match policy {
                ReplicatePolicy::Reject => Err(SummaryError::InsufficientReplicates {
                    side,
                    found: replicates,
                    required: MIN_REPLICATES_FOR_SD,
                }),
                ReplicatePolicy::UnitWeightFallback => {
                    tracing::warn!(
                        side = %side,
                        "single replicate per subject, falling back to unit weights"
                    );
                    Ok(SummaryVectors {
                        side,
                        replicates,
                        mean: matrix.means(),
                        sd: vec![1.0; matrix.n_subjects()],
                    })
                }
            };
        }

        let (mean, sd): (Vec<f64>, Vec<f64>) = matrix
            .rows()
            .map(|row| {
                let data = Data::new(row);
                (
                    data.mean().unwrap_or(f64::NAN),
                    data.std_dev().unwrap_or(f64::NAN),
                )
            })
            .unzip();

        Ok(SummaryVectors {
            side,
            replicates,
            mean,
            sd,
        })
    }

    /// Number of subjects summarized
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Regression weights, the reciprocal of each subject's standard deviation
    pub fn weights(&self) -> Vec<f64> {
        self.sd.iter().map(|sd| 1.0 / sd).collect()
    }
}

impl fmt::Display for SummaryVectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Method {} ({} replicates per subject)",
            self.side, self.replicates
        )?;
        writeln!(f, "  {:>4}  {:>12}  {:>12}", "#", "mean", "sd")?;
        for (i, (mean, sd)) in self.mean.iter().zip(self.sd.iter()).enumerate() {
            writeln!(f, "  {:>4}  {:>12.4}  {:>12.4}", i + 1, mean, sd)?;
        }
        Ok(())
    }
}
