//! Straight-line method comparison regression
//!
//! Two fitters estimate `Y ≈ intercept + slope·X` from per-subject means:
//!
//! - [`wls::fit`] minimizes weighted vertical residuals, with each subject
//!   weighted by the reciprocal of its Y replicate standard deviation.
//! - [`odr::fit`] accounts for measurement error on both axes, minimizing
//!   weighted orthogonal distances using the X and Y replicate standard
//!   deviations.
//!
//! Both return a [`RegressionResult`] with standard errors and Student-t
//! confidence intervals on `n − 2` degrees of freedom.

pub mod odr;
pub mod types;
pub mod wls;

use nalgebra::{DMatrix, Vector2};
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

use crate::data::Method;

pub use types::{
    Coefficient, FitMethod, FitOptions, OdrOptions, OdrSolver, RegressionResult, DEFAULT_ALPHA,
    LINEAR_PARAMETERS,
};

/// Errors that can occur while fitting a regression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    /// Input vectors do not have the same length
    #[error("Length mismatch: {name} has {found} values, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// Not enough subjects to leave residual degrees of freedom
    #[error("Insufficient data: {n} subjects for {parameters} parameters, at least {} are needed", .parameters + 1)]
    InsufficientData { n: usize, parameters: usize },

    /// A weight derived from a replicate standard deviation is unusable
    #[error("Invalid weight {weight} for method {side}, subject {}: replicate standard deviation must be positive and finite", .subject + 1)]
    InvalidWeight {
        side: Method,
        subject: usize,
        weight: f64,
    },

    /// All X values are equal, so no slope can be estimated
    #[error("Singular design: X does not vary across subjects")]
    Singular,

    /// The iterative solver hit its iteration cap
    #[error("Fit did not converge within {iterations} iterations (tolerance {tolerance:e})")]
    Convergence { iterations: usize, tolerance: f64 },

    /// Failure reported by the optimization backend
    #[error("Solver error: {0}")]
    Solver(String),

    /// The t distribution could not be constructed
    #[error("Distribution error: {0}")]
    Distribution(String),
}

pub(crate) fn check_lengths(
    expected: usize,
    others: &[(&'static str, usize)],
) -> Result<(), RegressionError> {
    for &(name, found) in others {
        if found != expected {
            return Err(RegressionError::LengthMismatch {
                name,
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Residual degrees of freedom of the straight-line model
pub(crate) fn degrees_of_freedom(n: usize) -> Result<usize, RegressionError> {
    if n <= LINEAR_PARAMETERS {
        return Err(RegressionError::InsufficientData {
            n,
            parameters: LINEAR_PARAMETERS,
        });
    }
    Ok(n - LINEAR_PARAMETERS)
}

/// Every weight must be finite and strictly positive
pub(crate) fn validate_weights(side: Method, weights: &[f64]) -> Result<(), RegressionError> {
    match weights
        .iter()
        .position(|w| !w.is_finite() || *w <= 0.0)
    {
        Some(subject) => Err(RegressionError::InvalidWeight {
            side,
            subject,
            weight: weights[subject],
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_spread(x: &[f64]) -> Result<(), RegressionError> {
    if x.iter().all(|v| *v == x[0]) {
        return Err(RegressionError::Singular);
    }
    Ok(())
}

/// Turn estimates and their covariance into coefficient statistics
///
/// Confidence bounds are `estimate ± t(1 − α/2, df) · se`.
pub(crate) fn coefficients(
    estimates: Vector2<f64>,
    covariance: &DMatrix<f64>,
    df: usize,
    alpha: f64,
) -> Result<(Coefficient, Coefficient), RegressionError> {
    let t = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| RegressionError::Distribution(e.to_string()))?;
    let t_crit = t.inverse_cdf(1.0 - alpha / 2.0);

    let coefficient = |k: usize| {
        let estimate = estimates[k];
        let std_error = covariance[(k, k)].max(0.0).sqrt();
        let t_stat = estimate / std_error;
        let p_value = if t_stat.is_nan() {
            f64::NAN
        } else if t_stat.is_infinite() {
            0.0
        } else {
            2.0 * (1.0 - t.cdf(t_stat.abs()))
        };
        let half_width = t_crit * std_error;
        Coefficient {
            estimate,
            std_error,
            t_stat,
            p_value,
            ci_lower: estimate - half_width,
            ci_upper: estimate + half_width,
        }
    };

    Ok((coefficient(0), coefficient(1)))
}
