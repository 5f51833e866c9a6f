//! Weighted least squares fit of Y on X
//!
//! Minimizes `Σ wᵢ·(yᵢ − a − b·xᵢ)²` in closed form. With design matrix `X`
//! (a column of ones and the X means) and `W = diag(w)`:
//!
//! - `β = (XᵀWX)⁻¹ XᵀWy`
//! - `s² = Σ wᵢ·rᵢ² / (n − 2)`
//! - `Cov(β) = s²·(XᵀWX)⁻¹`

use nalgebra::{DMatrix, DVector, Vector2};

use super::{
    check_lengths, check_spread, coefficients, degrees_of_freedom, validate_weights, FitMethod,
    FitOptions, RegressionError, RegressionResult,
};
use crate::data::Method;
use crate::summary::SummaryVectors;

/// Fit `y ≈ intercept + slope·x` by weighted least squares
///
/// # Arguments
///
/// * `x` - Per-subject means of method X
/// * `y` - Per-subject means of method Y
/// * `weights` - Per-subject weights, conventionally `1 / sd_Y`
/// * `options` - Significance level of the confidence intervals
///
/// # Errors
///
/// - [RegressionError::LengthMismatch] if the inputs differ in length
/// - [RegressionError::InsufficientData] with fewer than 3 subjects
/// - [RegressionError::InvalidWeight] if a weight is zero, negative or not finite
/// - [RegressionError::Singular] if every X value is the same
pub fn fit(
    x: &[f64],
    y: &[f64],
    weights: &[f64],
    options: &FitOptions,
) -> Result<RegressionResult, RegressionError> {
    let n = x.len();
    check_lengths(n, &[("y", y.len()), ("weights", weights.len())])?;
    let df = degrees_of_freedom(n)?;
    validate_weights(Method::Y, weights)?;
    check_spread(x)?;

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let w = DMatrix::from_diagonal(&DVector::from_column_slice(weights));
    let response = DVector::from_column_slice(y);

    let weighted_design_t = design.transpose() * &w;
    let gram = &weighted_design_t * &design;
    let gram_inv = gram.try_inverse().ok_or(RegressionError::Singular)?;
    let beta = &gram_inv * (&weighted_design_t * &response);

    let residuals = &response - &design * &beta;
    let weighted_rss: f64 = residuals
        .iter()
        .zip(weights)
        .map(|(r, w)| w * r * r)
        .sum();
    let residual_variance = weighted_rss / df as f64;
    let covariance = &gram_inv * residual_variance;

    let (intercept, slope) = coefficients(
        Vector2::new(beta[0], beta[1]),
        &covariance,
        df,
        options.alpha,
    )?;

    tracing::debug!(
        intercept = intercept.estimate,
        slope = slope.estimate,
        residual_variance,
        "weighted least squares fit"
    );

    Ok(RegressionResult {
        method: FitMethod::WeightedLeastSquares,
        intercept,
        slope,
        n_subjects: n,
        degrees_of_freedom: df,
        alpha: options.alpha,
        residual_variance,
        iterations: 0,
    })
}

/// Fit mean Y on mean X, weighting each subject by `1 / sd_Y`
pub fn fit_summaries(
    x: &SummaryVectors,
    y: &SummaryVectors,
    options: &FitOptions,
) -> Result<RegressionResult, RegressionError> {
    fit(&x.mean, &y.mean, &y.weights(), options)
}
