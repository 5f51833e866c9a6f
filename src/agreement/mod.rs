//! Bland–Altman agreement analysis
//!
//! Compares two methods by looking at the per-subject differences `Y − X`
//! against the per-subject magnitude `(X + Y) / 2`. The mean difference is the
//! bias of Y relative to X, and the limits of agreement `bias ± k·SD` bound the
//! range expected to contain most differences.
//!
//! Only the raw limits are produced. No confidence interval is placed around the
//! bias or the limits themselves.
//!
//! # Example
//!
//! ```rust
//! use methcomp::agreement::{bland_altman, AgreementOptions};
//!
//! let x = [1.0, 2.0, 3.0];
//! let y = [1.0, 3.0, 5.0];
//! let result = bland_altman(&x, &y, &AgreementOptions::default()).unwrap();
//! assert_eq!(result.bias, 1.0);
//! ```

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use thiserror::Error;

/// Default multiplier for the limits of agreement (~95% of differences)
pub const DEFAULT_LIMIT_MULTIPLIER: f64 = 1.96;

/// Errors that can occur during agreement analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgreementError {
    /// The spread of differences needs at least two subjects
    #[error("Agreement analysis needs at least 2 subjects, got {n}")]
    InsufficientSubjects { n: usize },

    /// A percentage difference was requested for a subject whose mean is zero
    #[error("Subject {} has a mean of zero, percentage difference is undefined", .subject + 1)]
    ZeroMean { subject: usize },
}

/// Scale on which differences are expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferenceScale {
    /// `Y − X` in measurement units
    #[default]
    Absolute,
    /// `100 · (Y − X) / mean`, in percent of the subject's mean
    Percentage,
}

/// Agreement analysis options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementOptions {
    /// Multiplier `k` of the standard deviation in `bias ± k·SD` (default: 1.96)
    pub limit_multiplier: f64,
    /// Scale of the differences (default: Absolute)
    pub scale: DifferenceScale,
}

impl Default for AgreementOptions {
    fn default() -> Self {
        Self {
            limit_multiplier: DEFAULT_LIMIT_MULTIPLIER,
            scale: DifferenceScale::Absolute,
        }
    }
}

impl AgreementOptions {
    /// Set the limits of agreement multiplier
    pub fn with_limit_multiplier(mut self, k: f64) -> Self {
        self.limit_multiplier = k;
        self
    }

    /// Set the difference scale
    pub fn with_scale(mut self, scale: DifferenceScale) -> Self {
        self.scale = scale;
        self
    }
}

/// Bland–Altman agreement statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementResult {
    /// Per-subject difference `Y − X` (or its percentage)
    pub differences: Vec<f64>,
    /// Per-subject mean `(X + Y) / 2`
    pub means: Vec<f64>,
    /// Mean difference
    pub bias: f64,
    /// Sample standard deviation of the differences
    pub sd_diff: f64,
    /// Lower limit of agreement, `bias − k·sd_diff`
    pub lower_limit: f64,
    /// Upper limit of agreement, `bias + k·sd_diff`
    pub upper_limit: f64,
    /// The multiplier `k` used for the limits
    pub limit_multiplier: f64,
    /// Scale of `differences`, `bias` and the limits
    pub scale: DifferenceScale,
}

impl AgreementResult {
    /// Limits of agreement as `(lower, upper)`
    pub fn limits(&self) -> (f64, f64) {
        (self.lower_limit, self.upper_limit)
    }

    /// Number of subjects
    pub fn n_subjects(&self) -> usize {
        self.differences.len()
    }

    /// `(mean, difference)` points for a mean-difference plot
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.means
            .iter()
            .copied()
            .zip(self.differences.iter().copied())
            .collect()
    }

    /// Number of differences falling inside the limits of agreement
    pub fn n_within_limits(&self) -> usize {
        self.differences
            .iter()
            .filter(|d| **d >= self.lower_limit && **d <= self.upper_limit)
            .count()
    }
}

/// Compute Bland–Altman agreement statistics from paired subject means
///
/// # Arguments
///
/// * `mean_x` - Per-subject means of method X
/// * `mean_y` - Per-subject means of method Y, paired with `mean_x` by index
/// * `options` - Limits multiplier and difference scale
///
/// # Panics
///
/// Panics if `mean_x` and `mean_y` have different lengths. Pairing is
/// established when the input is parsed, so a mismatch here is a caller bug.
pub fn bland_altman(
    mean_x: &[f64],
    mean_y: &[f64],
    options: &AgreementOptions,
) -> Result<AgreementResult, AgreementError> {
    assert_eq!(
        mean_x.len(),
        mean_y.len(),
        "bland_altman requires paired means of equal length"
    );

    let n = mean_x.len();
    if n < 2 {
        return Err(AgreementError::InsufficientSubjects { n });
    }

    let means: Vec<f64> = mean_x
        .iter()
        .zip(mean_y)
        .map(|(x, y)| (y + x) / 2.0)
        .collect();

    let differences = match options.scale {
        DifferenceScale::Absolute => mean_x.iter().zip(mean_y).map(|(x, y)| y - x).collect(),
        DifferenceScale::Percentage => {
            let mut differences = Vec::with_capacity(n);
            for (subject, ((x, y), m)) in mean_x.iter().zip(mean_y).zip(&means).enumerate() {
                if *m == 0.0 {
                    return Err(AgreementError::ZeroMean { subject });
                }
                differences.push(100.0 * (y - x) / m);
            }
            differences
        }
    };

    let bias = differences.iter().mean();
    let sd_diff = differences.iter().std_dev();
    let k = options.limit_multiplier;

    Ok(AgreementResult {
        differences,
        means,
        bias,
        sd_diff,
        lower_limit: bias - k * sd_diff,
        upper_limit: bias + k * sd_diff,
        limit_multiplier: k,
        scale: options.scale,
    })
}

impl fmt::Display for AgreementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.scale {
            DifferenceScale::Absolute => "",
            DifferenceScale::Percentage => " %",
        };
        writeln!(f, "╔══════════════════════════════════════╗")?;
        writeln!(f, "║        Bland-Altman Agreement        ║")?;
        writeln!(f, "╠══════════════════════════════════════╣")?;
        writeln!(f, "║ Subjects:      {:<22}║", self.n_subjects())?;
        writeln!(f, "║ Bias:          {:<22}║", format!("{:.4}{}", self.bias, unit))?;
        writeln!(f, "║ SD of diff.:   {:<22}║", format!("{:.4}{}", self.sd_diff, unit))?;
        writeln!(
            f,
            "║ Limits (k={:<4}) {:<21}║",
            self.limit_multiplier,
            format!("{:.4} to {:.4}", self.lower_limit, self.upper_limit)
        )?;
        writeln!(
            f,
            "║ Within limits: {:<22}║",
            format!("{}/{}", self.n_within_limits(), self.n_subjects())
        )?;
        write!(f, "╚══════════════════════════════════════╝")
    }
}
