//! Tests for complete comparison sessions

use approx::assert_relative_eq;
use methcomp::prelude::*;
use methcomp::regression::RegressionError;
use methcomp::summary::SummaryError;
use methcomp::{
    bland_altman, AgreementOptions, DifferenceScale, FitOptions, ReplicatePolicy, SummaryVectors,
};

const X: &str = "4.5,4.7; 5.1,5.3; 6.0,5.8; 7.2,7.0; 8.1,8.3; 9.0,9.4";
const Y: &str = "4.8,4.6; 5.5,5.7; 6.3,6.1; 7.4,7.8; 8.6,8.4; 9.7,9.5";

#[test]
fn test_session_runs_every_analysis() {
    let report = compare_text(X, Y, &ComparisonOptions::default()).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.n_subjects, 6);
    assert_eq!(report.x_replicates, 2);
    assert_eq!(report.y_replicates, 2);

    let agreement = report.agreement.as_ref().unwrap();
    assert!(agreement.bias > 0.0);
    let wls = report.wls.as_ref().unwrap();
    let odr = report.odr.as_ref().unwrap();
    assert!((wls.slope() - 1.0).abs() < 0.2);
    assert!((odr.slope() - 1.0).abs() < 0.2);
    assert_eq!(wls.degrees_of_freedom, 4);
}

#[test]
fn test_session_matches_individual_analyses() {
    let options = ComparisonOptions::default();
    let pair = ReplicatePair::from_inputs(X, Y, &options.parse).unwrap();
    let report = compare(&pair, &options).unwrap();

    let x = SummaryVectors::from_matrix(pair.x(), ReplicatePolicy::Reject).unwrap();
    let y = SummaryVectors::from_matrix(pair.y(), ReplicatePolicy::Reject).unwrap();
    let agreement = bland_altman(&x.mean, &y.mean, &options.agreement).unwrap();
    let wls = methcomp::regression::wls::fit_summaries(&x, &y, &options.fit).unwrap();

    assert_eq!(report.agreement.unwrap(), agreement);
    assert_eq!(report.wls.unwrap(), wls);
}

#[test]
fn test_agreement_survives_missing_spread() {
    let report = compare_text("1,2,3,4,5", "1.2,2.1,2.8,4.1,5.3", &ComparisonOptions::default())
        .unwrap();

    let agreement = report.agreement.as_ref().unwrap();
    assert_eq!(agreement.n_subjects(), 5);
    assert_relative_eq!(agreement.bias, 0.1, epsilon = 1e-12);
    for fit in [&report.wls, &report.odr] {
        assert!(matches!(
            fit,
            Err(MethcompError::Summary(SummaryError::InsufficientReplicates { found: 1, .. }))
        ));
    }
}

#[test]
fn test_single_reference_readings_keep_least_squares() {
    // X read once per subject, Y in duplicate
    let x = "1.0; 2.0; 3.0; 4.0; 5.0";
    let y = "1.1,1.3; 2.0,2.4; 3.1,3.0; 4.0,4.4; 5.2,4.9";
    let report = compare_text(x, y, &ComparisonOptions::default()).unwrap();

    assert!(report.x_summary.is_err());
    assert!(report.y_summary.is_ok());
    assert!(report.agreement.is_ok());
    assert!(matches!(
        report.odr,
        Err(MethcompError::Summary(SummaryError::InsufficientReplicates {
            side: Method::X,
            ..
        }))
    ));

    let wls = report.wls.as_ref().unwrap();
    let pair = ReplicatePair::from_inputs(x, y, &ParseOptions::default()).unwrap();
    let y_summary = SummaryVectors::from_matrix(pair.y(), ReplicatePolicy::Reject).unwrap();
    let expected = methcomp::regression::wls::fit(
        &pair.x().means(),
        &y_summary.mean,
        &y_summary.weights(),
        &FitOptions::default(),
    )
    .unwrap();
    assert_eq!(*wls, expected);
    assert!((wls.slope() - 1.0).abs() < 0.2);
}

#[test]
fn test_single_test_readings_fail_both_fits() {
    let report = compare_text(
        "1.0,1.2; 2.1,1.9; 3.0,3.2; 3.9,4.1",
        "1.1; 2.2; 3.1; 4.2",
        &ComparisonOptions::default(),
    )
    .unwrap();
    assert!(report.agreement.is_ok());
    for fit in [&report.wls, &report.odr] {
        assert!(matches!(
            fit,
            Err(MethcompError::Summary(SummaryError::InsufficientReplicates {
                side: Method::Y,
                ..
            }))
        ));
    }
}

#[test]
fn test_too_few_subjects_only_fails_fits() {
    let report = compare_text("1,2; 3,4", "1,3; 3,5", &ComparisonOptions::default()).unwrap();
    assert!(report.agreement.is_ok());
    assert!(matches!(
        report.wls,
        Err(MethcompError::Regression(RegressionError::InsufficientData { n: 2, .. }))
    ));
    assert!(matches!(
        report.odr,
        Err(MethcompError::Regression(RegressionError::InsufficientData { n: 2, .. }))
    ));
}

#[test]
fn test_zero_spread_is_invalid_weight() {
    // Y subject 2 has identical replicates
    let report = compare_text(
        "1,1.2; 2,2.2; 3,3.2; 4,4.2",
        "1.1,1.3; 2.1,2.1; 3.0,3.4; 4.2,4.4",
        &ComparisonOptions::default(),
    )
    .unwrap();
    assert!(report.agreement.is_ok());
    assert!(matches!(
        report.wls,
        Err(MethcompError::Regression(RegressionError::InvalidWeight {
            side: Method::Y,
            subject: 1,
            ..
        }))
    ));
}

#[test]
fn test_options_change_the_analyses() {
    let options = ComparisonOptions::default()
        .with_agreement(
            AgreementOptions::default()
                .with_limit_multiplier(2.0)
                .with_scale(DifferenceScale::Percentage),
        )
        .with_fit(FitOptions::default().with_alpha(0.1));
    let report = compare_text(X, Y, &options).unwrap();

    let agreement = report.agreement.unwrap();
    assert_eq!(agreement.limit_multiplier, 2.0);
    assert_eq!(agreement.scale, DifferenceScale::Percentage);
    assert_relative_eq!(
        agreement.upper_limit - agreement.bias,
        2.0 * agreement.sd_diff,
        epsilon = 1e-12
    );
    assert_eq!(report.wls.unwrap().alpha, 0.1);
}

#[test]
fn test_invalid_options_fail_before_analysis() {
    let options = ComparisonOptions::default().with_fit(FitOptions::default().with_alpha(1.5));
    let err = compare_text(X, Y, &options).unwrap_err();
    assert!(matches!(
        err,
        MethcompError::InvalidOption {
            name: "fit.alpha",
            ..
        }
    ));
}

#[test]
fn test_report_to_json() {
    let report = compare_text(X, Y, &ComparisonOptions::default()).unwrap();
    let json = report.to_json();

    assert_eq!(json["n_subjects"], 6);
    assert_eq!(json["x_summary"]["mean"].as_array().unwrap().len(), 6);
    assert_eq!(json["wls"]["method"], "WeightedLeastSquares");
    assert_eq!(json["odr"]["method"], "OrthogonalDistance");
    assert!(json["agreement"]["bias"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_report_display() {
    let report = compare_text(X, Y, &ComparisonOptions::default()).unwrap();
    let text = report.to_string();
    assert!(text.contains("6 subjects"));
    assert!(text.contains("Bland-Altman"));
    assert!(text.contains("Weighted least squares regression"));
    assert!(text.contains("Weighted orthogonal distance regression"));
}
