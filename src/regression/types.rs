//! Regression options and results shared by both fitters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default significance level for confidence intervals
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Number of free parameters of the straight-line model
pub const LINEAR_PARAMETERS: usize = 2;

/// Fitting procedure that produced a [RegressionResult]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMethod {
    /// Weighted least squares on vertical residuals
    WeightedLeastSquares,
    /// Weighted orthogonal distance regression (errors in both variables)
    OrthogonalDistance,
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMethod::WeightedLeastSquares => write!(f, "Weighted least squares"),
            FitMethod::OrthogonalDistance => write!(f, "Weighted orthogonal distance"),
        }
    }
}

/// Solver used for orthogonal distance regression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OdrSolver {
    /// Damped Gauss–Newton iteration (default)
    #[default]
    LevenbergMarquardt,
    /// Derivative-free simplex search, usually needs a higher iteration cap
    NelderMead,
}

/// Orthogonal distance regression solver options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdrOptions {
    /// Convergence tolerance (default: 1e-10)
    ///
    /// For Levenberg–Marquardt this bounds the relative parameter step; for
    /// Nelder–Mead it bounds the standard deviation of the simplex costs.
    pub tolerance: f64,
    /// Maximum number of iterations before giving up (default: 200)
    pub max_iterations: usize,
    /// Solver (default: LevenbergMarquardt)
    pub solver: OdrSolver,
}

impl Default for OdrOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
            solver: OdrSolver::LevenbergMarquardt,
        }
    }
}

impl OdrOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_solver(mut self, solver: OdrSolver) -> Self {
        self.solver = solver;
        self
    }
}

/// Options shared by both fitters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Significance level of the two-sided confidence intervals (default: 0.05)
    pub alpha: f64,
    /// Orthogonal distance regression solver options
    pub odr: OdrOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            odr: OdrOptions::default(),
        }
    }
}

impl FitOptions {
    /// Set the significance level
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the orthogonal distance regression options
    pub fn with_odr(mut self, odr: OdrOptions) -> Self {
        self.odr = odr;
        self
    }
}

/// Estimate and inference statistics of one model coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Point estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: f64,
    /// t statistic, `estimate / std_error`
    pub t_stat: f64,
    /// Two-sided p-value of the t statistic
    pub p_value: f64,
    /// Lower bound of the confidence interval
    pub ci_lower: f64,
    /// Upper bound of the confidence interval
    pub ci_upper: f64,
}

impl Coefficient {
    /// Confidence interval as `(lower, upper)`
    pub fn ci(&self) -> (f64, f64) {
        (self.ci_lower, self.ci_upper)
    }
}

/// Result of fitting `Y ≈ intercept + slope·X`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Fitting procedure
    pub method: FitMethod,
    /// Intercept statistics
    pub intercept: Coefficient,
    /// Slope statistics
    pub slope: Coefficient,
    /// Number of subjects used in the fit
    pub n_subjects: usize,
    /// Residual degrees of freedom, subjects minus parameters
    pub degrees_of_freedom: usize,
    /// Significance level of the confidence intervals
    pub alpha: f64,
    /// Weighted residual sum of squares divided by the degrees of freedom
    pub residual_variance: f64,
    /// Solver iterations (0 for closed-form fits)
    pub iterations: usize,
}

impl RegressionResult {
    pub fn intercept(&self) -> f64 {
        self.intercept.estimate
    }

    pub fn slope(&self) -> f64 {
        self.slope.estimate
    }

    pub fn intercept_se(&self) -> f64 {
        self.intercept.std_error
    }

    pub fn slope_se(&self) -> f64 {
        self.slope.std_error
    }

    pub fn intercept_ci(&self) -> (f64, f64) {
        self.intercept.ci()
    }

    pub fn slope_ci(&self) -> (f64, f64) {
        self.slope.ci()
    }

    /// Value of the fitted line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept.estimate + self.slope.estimate * x
    }
}

impl fmt::Display for RegressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = format!("{}% CI", ((1.0 - self.alpha) * 1000.0).round() / 10.0);
        writeln!(f, "╔══════════════════════════════════════════════════════════════════╗")?;
        writeln!(f, "║ {:<64} ║", format!("{} regression", self.method))?;
        writeln!(f, "╠══════════════════════════════════════════════════════════════════╣")?;
        writeln!(
            f,
            "║ {:<64} ║",
            format!(
                "Subjects: {}   df: {}   residual variance: {:.6}",
                self.n_subjects, self.degrees_of_freedom, self.residual_variance
            )
        )?;
        if self.iterations > 0 {
            writeln!(f, "║ {:<64} ║", format!("Iterations: {}", self.iterations))?;
        }
        writeln!(f, "╠══════════════════════════════════════════════════════════════════╣")?;
        writeln!(
            f,
            "║ {:<10}{:>11}{:>11}{:>8}{:>8}  {:<14} ║",
            "", "estimate", "std err", "t", "p", level
        )?;
        for (name, c) in [("intercept", &self.intercept), ("slope", &self.slope)] {
            writeln!(
                f,
                "║ {:<10}{:>11.4}{:>11.4}{:>8.2}{:>8.4}  {:<14} ║",
                name,
                c.estimate,
                c.std_error,
                c.t_stat,
                c.p_value,
                format!("[{:.3}, {:.3}]", c.ci_lower, c.ci_upper)
            )?;
        }
        write!(f, "╚══════════════════════════════════════════════════════════════════╝")
    }
}
