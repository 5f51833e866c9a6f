//! Weighted orthogonal distance regression
//!
//! Fits `y ≈ a + b·x` when both methods carry measurement error. Each subject
//! has an unknown true X value `xᵢ + δᵢ`, and the fit minimizes
//!
//! `Σ [ (yᵢ − a − b·(xᵢ + δᵢ))² / σyᵢ² + δᵢ² / σxᵢ² ]`
//!
//! For a straight line the optimal corrections `δᵢ` have a closed form, which
//! reduces the problem to two parameters:
//!
//! `S(a, b) = Σ (yᵢ − a − b·xᵢ)² / (σyᵢ² + b²·σxᵢ²)`
//!
//! `S` is minimized from the starting point `(a, b) = (0, 1)` with a damped
//! Gauss–Newton (Levenberg–Marquardt) iteration, or optionally with argmin's
//! Nelder–Mead simplex. Standard errors come from the Jacobian of the reduced
//! residuals at the optimum, scaled by the residual variance `S / (n − 2)`.

use argmin::core::{CostFunction, Error, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use nalgebra::{DMatrix, DVector, Vector2};

use super::{
    check_lengths, check_spread, coefficients, degrees_of_freedom, validate_weights, FitMethod,
    FitOptions, OdrOptions, OdrSolver, RegressionError, RegressionResult,
};
use crate::data::Method;
use crate::summary::SummaryVectors;

/// Starting point of the iteration, the line of identity
const INITIAL_GUESS: [f64; 2] = [0.0, 1.0];
const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DAMPING: f64 = 1e-12;
const DAMPING_FACTOR: f64 = 10.0;

/// The reduced orthogonal distance objective
#[derive(Debug, Clone)]
struct OrthogonalProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    var_x: Vec<f64>,
    var_y: Vec<f64>,
}

impl<'a> OrthogonalProblem<'a> {
    fn new(x: &'a [f64], y: &'a [f64], sd_x: &[f64], sd_y: &[f64]) -> Self {
        Self {
            x,
            y,
            var_x: sd_x.iter().map(|s| s * s).collect(),
            var_y: sd_y.iter().map(|s| s * s).collect(),
        }
    }

    fn residuals(&self, beta: &Vector2<f64>) -> DVector<f64> {
        let (a, b) = (beta[0], beta[1]);
        DVector::from_fn(self.x.len(), |i, _| {
            let scale = (self.var_y[i] + b * b * self.var_x[i]).sqrt();
            (self.y[i] - a - b * self.x[i]) / scale
        })
    }

    fn objective(&self, beta: &Vector2<f64>) -> f64 {
        self.residuals(beta).norm_squared()
    }

    /// Jacobian of the reduced residuals with respect to `(a, b)`
    fn jacobian(&self, beta: &Vector2<f64>) -> DMatrix<f64> {
        let (a, b) = (beta[0], beta[1]);
        let mut jacobian = DMatrix::zeros(self.x.len(), 2);
        for i in 0..self.x.len() {
            let denom = self.var_y[i] + b * b * self.var_x[i];
            let scale = denom.sqrt();
            let error = self.y[i] - a - b * self.x[i];
            jacobian[(i, 0)] = -1.0 / scale;
            jacobian[(i, 1)] = -self.x[i] / scale - error * b * self.var_x[i] / (denom * scale);
        }
        jacobian
    }
}

impl CostFunction for OrthogonalProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.objective(&Vector2::new(param[0], param[1])))
    }
}

/// Result of the minimization, before inference
struct Minimum {
    beta: Vector2<f64>,
    objective: f64,
    iterations: usize,
}

/// Fit `y ≈ intercept + slope·x` by weighted orthogonal distance regression
///
/// # Arguments
///
/// * `x` - Per-subject means of method X
/// * `y` - Per-subject means of method Y
/// * `sd_x` - Per-subject replicate standard deviations of method X
/// * `sd_y` - Per-subject replicate standard deviations of method Y
/// * `options` - Significance level and solver settings
///
/// # Errors
///
/// Fails like [super::wls::fit] on mismatched lengths, fewer than 3 subjects,
/// unusable weights (`1/sd` on either side must be positive and finite) or
/// constant X, and with [RegressionError::Convergence] when the solver reaches
/// its iteration cap.
pub fn fit(
    x: &[f64],
    y: &[f64],
    sd_x: &[f64],
    sd_y: &[f64],
    options: &FitOptions,
) -> Result<RegressionResult, RegressionError> {
    let n = x.len();
    check_lengths(
        n,
        &[("y", y.len()), ("sd_x", sd_x.len()), ("sd_y", sd_y.len())],
    )?;
    let df = degrees_of_freedom(n)?;
    validate_weights(Method::X, &reciprocal(sd_x))?;
    validate_weights(Method::Y, &reciprocal(sd_y))?;
    check_spread(x)?;

    let problem = OrthogonalProblem::new(x, y, sd_x, sd_y);
    let minimum = match options.odr.solver {
        OdrSolver::LevenbergMarquardt => levenberg_marquardt(&problem, &options.odr)?,
        OdrSolver::NelderMead => nelder_mead(&problem, y, &options.odr)?,
    };

    let jacobian = problem.jacobian(&minimum.beta);
    let information = jacobian.transpose() * &jacobian;
    let unscaled = information
        .try_inverse()
        .ok_or(RegressionError::Singular)?;
    let residual_variance = minimum.objective / df as f64;
    let covariance = unscaled * residual_variance;

    let (intercept, slope) = coefficients(minimum.beta, &covariance, df, options.alpha)?;

    tracing::debug!(
        intercept = intercept.estimate,
        slope = slope.estimate,
        iterations = minimum.iterations,
        residual_variance,
        "orthogonal distance fit"
    );

    Ok(RegressionResult {
        method: FitMethod::OrthogonalDistance,
        intercept,
        slope,
        n_subjects: n,
        degrees_of_freedom: df,
        alpha: options.alpha,
        residual_variance,
        iterations: minimum.iterations,
    })
}

/// Fit mean Y on mean X using the replicate spread of both methods
pub fn fit_summaries(
    x: &SummaryVectors,
    y: &SummaryVectors,
    options: &FitOptions,
) -> Result<RegressionResult, RegressionError> {
    fit(&x.mean, &y.mean, &x.sd, &y.sd, options)
}

fn reciprocal(sd: &[f64]) -> Vec<f64> {
    sd.iter().map(|s| 1.0 / s).collect()
}

fn step_is_small(step: &Vector2<f64>, beta: &Vector2<f64>, tolerance: f64) -> bool {
    step.iter()
        .zip(beta.iter())
        .all(|(d, b)| d.abs() <= tolerance * (b.abs() + tolerance))
}

fn levenberg_marquardt(
    problem: &OrthogonalProblem,
    options: &OdrOptions,
) -> Result<Minimum, RegressionError> {
    let mut beta = Vector2::new(INITIAL_GUESS[0], INITIAL_GUESS[1]);
    let mut objective = problem.objective(&beta);
    let mut damping = INITIAL_DAMPING;
    let mut iterations = 0;

    loop {
        if iterations >= options.max_iterations {
            tracing::warn!(
                iterations,
                objective,
                "orthogonal distance regression reached its iteration cap"
            );
            return Err(RegressionError::Convergence {
                iterations,
                tolerance: options.tolerance,
            });
        }
        iterations += 1;

        let residuals = problem.residuals(&beta);
        let jacobian = problem.jacobian(&beta);
        let jacobian_t = jacobian.transpose();
        let hessian = &jacobian_t * &jacobian;
        let gradient = &jacobian_t * &residuals;

        if gradient.iter().all(|g| *g == 0.0) {
            break;
        }

        let mut damped = hessian.clone();
        for k in 0..2 {
            damped[(k, k)] += damping * hessian[(k, k)].max(f64::MIN_POSITIVE);
        }
        let step = match damped.lu().solve(&(-gradient)) {
            Some(step) => Vector2::new(step[0], step[1]),
            None => {
                damping *= DAMPING_FACTOR;
                continue;
            }
        };

        let candidate = beta + step;
        let candidate_objective = problem.objective(&candidate);
        let small = step_is_small(&step, &beta, options.tolerance);

        tracing::trace!(
            iteration = iterations,
            objective,
            candidate_objective,
            damping,
            "levenberg-marquardt step"
        );

        if candidate_objective <= objective {
            beta = candidate;
            objective = candidate_objective;
            damping = (damping / DAMPING_FACTOR).max(MIN_DAMPING);
            if small {
                break;
            }
        } else if small {
            // no representable improvement left
            break;
        } else {
            damping *= DAMPING_FACTOR;
        }
    }

    Ok(Minimum {
        beta,
        objective,
        iterations,
    })
}

fn nelder_mead(
    problem: &OrthogonalProblem,
    y: &[f64],
    options: &OdrOptions,
) -> Result<Minimum, RegressionError> {
    let simplex = create_initial_simplex(&INITIAL_GUESS, y);
    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex)
        .with_sd_tolerance(options.tolerance)
        .map_err(|e| RegressionError::Solver(e.to_string()))?;

    let res = Executor::new(problem.clone(), solver)
        .configure(|state| state.max_iters(options.max_iterations as u64))
        .run()
        .map_err(|e| RegressionError::Solver(e.to_string()))?;

    let iterations = res.state.get_iter() as usize;
    if !matches!(
        res.state.get_termination_reason(),
        Some(TerminationReason::SolverConverged)
    ) {
        tracing::warn!(iterations, "nelder-mead did not converge");
        return Err(RegressionError::Convergence {
            iterations,
            tolerance: options.tolerance,
        });
    }

    let best = res
        .state
        .best_param
        .ok_or_else(|| RegressionError::Solver("no parameters returned".to_string()))?;
    let beta = Vector2::new(best[0], best[1]);
    Ok(Minimum {
        objective: problem.objective(&beta),
        beta,
        iterations,
    })
}

/// Initial simplex around the starting point
///
/// The intercept is perturbed relative to the scale of Y so the simplex is not
/// degenerate when the starting intercept is zero.
fn create_initial_simplex(initial_point: &[f64; 2], y: &[f64]) -> Vec<Vec<f64>> {
    let perturbation_percentage = 0.1;
    let y_scale = y.iter().map(|v| v.abs()).sum::<f64>() / y.len() as f64;

    let mut vertices = vec![initial_point.to_vec()];
    for i in 0..initial_point.len() {
        let perturbation = if initial_point[i] == 0.0 {
            perturbation_percentage * y_scale.max(1.0)
        } else {
            perturbation_percentage * initial_point[i]
        };
        let mut perturbed_point = initial_point.to_vec();
        perturbed_point[i] += perturbation;
        vertices.push(perturbed_point);
    }
    vertices
}
