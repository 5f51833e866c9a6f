//! Full method comparison session
//!
//! [`compare`] runs every analysis on one [`ReplicatePair`]:
//!
//! 1. Each replicate matrix is reduced to per-subject means and standard
//!    deviations ([`SummaryVectors`]).
//! 2. Bland–Altman agreement is computed from the subject means.
//! 3. Mean Y is regressed on mean X by weighted least squares and by weighted
//!    orthogonal distance regression.
//!
//! The analyses are independent. A failure in one (for example a singular fit)
//! is recorded in its slot of the [`ComparisonReport`] and the others still
//! run. Agreement needs only the subject means, so it is computed even when the
//! replicate spread cannot be estimated. Least squares needs only the spread of
//! Y, and orthogonal distance regression needs the spread of both methods.
//!
//! # Example
//!
//! ```rust
//! use methcomp::comparison::{compare_text, ComparisonOptions};
//!
//! let x = "1.0,1.2; 2.1,1.9; 3.0,3.2; 3.9,4.1";
//! let y = "1.1,1.3; 2.2,2.0; 3.1,3.3; 4.2,4.0";
//! let report = compare_text(x, y, &ComparisonOptions::default()).unwrap();
//! assert!(report.agreement.is_ok());
//! assert!(report.wls.is_ok());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::agreement::{bland_altman, AgreementOptions, AgreementResult};
use crate::data::{MatrixInput, ParseOptions, ReplicatePair};
use crate::error::MethcompError;
use crate::regression::{odr, wls, FitOptions, RegressionResult};
use crate::summary::{ReplicatePolicy, SummaryVectors};

/// Options for a full comparison session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonOptions {
    /// Text parsing options
    pub parse: ParseOptions,
    /// Handling of subjects with a single replicate
    pub replicate_policy: ReplicatePolicy,
    /// Bland–Altman options
    pub agreement: AgreementOptions,
    /// Regression options, shared by both fitters
    pub fit: FitOptions,
}

impl ComparisonOptions {
    pub fn with_parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_replicate_policy(mut self, policy: ReplicatePolicy) -> Self {
        self.replicate_policy = policy;
        self
    }

    pub fn with_agreement(mut self, agreement: AgreementOptions) -> Self {
        self.agreement = agreement;
        self
    }

    pub fn with_fit(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    /// Read options from JSON
    ///
    /// Missing fields take their default values. The result is validated.
    ///
    /// ```rust
    /// use methcomp::comparison::ComparisonOptions;
    ///
    /// let options = ComparisonOptions::from_json(r#"{"fit": {"alpha": 0.1}}"#).unwrap();
    /// assert_eq!(options.fit.alpha, 0.1);
    /// assert_eq!(options.agreement.limit_multiplier, 1.96);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, MethcompError> {
        let options: ComparisonOptions =
            serde_json::from_str(json).map_err(|e| MethcompError::Options(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every value is within its valid range
    pub fn validate(&self) -> Result<(), MethcompError> {
        let alpha = self.fit.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(invalid("fit.alpha", alpha));
        }
        let k = self.agreement.limit_multiplier;
        if !(k.is_finite() && k > 0.0) {
            return Err(invalid("agreement.limit_multiplier", k));
        }
        let tolerance = self.fit.odr.tolerance;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(invalid("fit.odr.tolerance", tolerance));
        }
        if self.fit.odr.max_iterations == 0 {
            return Err(invalid("fit.odr.max_iterations", 0));
        }
        if self.parse.delimiter == '\n' {
            return Err(invalid("parse.delimiter", "\\n"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: impl fmt::Display) -> MethcompError {
    MethcompError::InvalidOption {
        name,
        value: value.to_string(),
    }
}

/// Outcome of every analysis in a comparison session
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    /// Number of paired subjects
    pub n_subjects: usize,
    /// Replicates per subject for method X
    pub x_replicates: usize,
    /// Replicates per subject for method Y
    pub y_replicates: usize,
    pub x_summary: Result<SummaryVectors, MethcompError>,
    pub y_summary: Result<SummaryVectors, MethcompError>,
    pub agreement: Result<AgreementResult, MethcompError>,
    pub wls: Result<RegressionResult, MethcompError>,
    pub odr: Result<RegressionResult, MethcompError>,
}

impl ComparisonReport {
    /// True if every analysis succeeded
    pub fn is_complete(&self) -> bool {
        self.x_summary.is_ok()
            && self.y_summary.is_ok()
            && self.agreement.is_ok()
            && self.wls.is_ok()
            && self.odr.is_ok()
    }

    /// The report as a JSON value
    ///
    /// A failed analysis is written as `{"error": "<message>"}`.
    pub fn to_json(&self) -> Value {
        json!({
            "n_subjects": self.n_subjects,
            "x_replicates": self.x_replicates,
            "y_replicates": self.y_replicates,
            "x_summary": section(&self.x_summary),
            "y_summary": section(&self.y_summary),
            "agreement": section(&self.agreement),
            "wls": section(&self.wls),
            "odr": section(&self.odr),
        })
    }
}

fn section<T: Serialize>(result: &Result<T, MethcompError>) -> Value {
    match result {
        Ok(value) => {
            serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
        }
        Err(e) => json!({ "error": e.to_string() }),
    }
}

/// Run every analysis on a pair of replicate matrices
///
/// # Errors
///
/// Only invalid `options` fail the whole session. Failures of individual
/// analyses are reported in the corresponding [`ComparisonReport`] field.
pub fn compare(
    pair: &ReplicatePair,
    options: &ComparisonOptions,
) -> Result<ComparisonReport, MethcompError> {
    options.validate()?;

    let n_subjects = pair.n_subjects();
    tracing::info!(
        subjects = n_subjects,
        x_replicates = pair.x().n_replicates(),
        y_replicates = pair.y().n_replicates(),
        "starting method comparison"
    );

    let x_summary = SummaryVectors::from_matrix(pair.x(), options.replicate_policy)
        .map_err(MethcompError::from);
    let y_summary = SummaryVectors::from_matrix(pair.y(), options.replicate_policy)
        .map_err(MethcompError::from);

    let (mean_x, mean_y) = match (&x_summary, &y_summary) {
        (Ok(x), Ok(y)) => (x.mean.clone(), y.mean.clone()),
        _ => (pair.x().means(), pair.y().means()),
    };
    let agreement =
        bland_altman(&mean_x, &mean_y, &options.agreement).map_err(MethcompError::from);

    // least squares only weighs by the Y spread, so X may lack replicates
    let wls = match &y_summary {
        Ok(y) => {
            wls::fit(&mean_x, &y.mean, &y.weights(), &options.fit).map_err(MethcompError::from)
        }
        Err(e) => Err(e.clone()),
    };
    let odr = match (&x_summary, &y_summary) {
        (Ok(x), Ok(y)) => odr::fit_summaries(x, y, &options.fit).map_err(MethcompError::from),
        (Err(e), _) | (_, Err(e)) => Err(e.clone()),
    };

    for (name, error) in [
        ("agreement", agreement.as_ref().err()),
        ("weighted least squares", wls.as_ref().err()),
        ("orthogonal distance regression", odr.as_ref().err()),
    ] {
        if let Some(error) = error {
            tracing::warn!(analysis = name, %error, "analysis failed");
        }
    }

    Ok(ComparisonReport {
        n_subjects,
        x_replicates: pair.x().n_replicates(),
        y_replicates: pair.y().n_replicates(),
        x_summary,
        y_summary,
        agreement,
        wls,
        odr,
    })
}

/// Parse both inputs and run [`compare`]
///
/// Unlike the analyses, an input that cannot be parsed fails the whole call.
pub fn compare_text(
    x: impl Into<MatrixInput>,
    y: impl Into<MatrixInput>,
    options: &ComparisonOptions,
) -> Result<ComparisonReport, MethcompError> {
    options.validate()?;
    let pair = ReplicatePair::from_inputs(x, y, &options.parse)?;
    compare(&pair, options)
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Method comparison: {} subjects, {} X replicates, {} Y replicates",
            self.n_subjects, self.x_replicates, self.y_replicates
        )?;
        writeln!(f)?;
        match &self.agreement {
            Ok(agreement) => writeln!(f, "{}", agreement)?,
            Err(e) => writeln!(f, "Bland-Altman agreement failed: {}", e)?,
        }
        for (name, fit) in [
            ("Weighted least squares", &self.wls),
            ("Orthogonal distance regression", &self.odr),
        ] {
            writeln!(f)?;
            match fit {
                Ok(result) => writeln!(f, "{}", result)?,
                Err(e) => writeln!(f, "{} failed: {}", name, e)?,
            }
        }
        Ok(())
    }
}
