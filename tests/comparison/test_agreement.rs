//! Tests for replicate summaries and Bland-Altman agreement

use approx::assert_relative_eq;
use methcomp::prelude::analysis::*;
use methcomp::prelude::*;
use methcomp::summary::SummaryError;

#[test]
fn test_summary_of_small_matrix() {
    let matrix = ReplicateMatrix::new(Method::X, vec![vec![2.0, 4.0], vec![6.0, 8.0]]).unwrap();
    let summary = SummaryVectors::from_matrix(&matrix, ReplicatePolicy::Reject).unwrap();

    assert_eq!(summary.mean, vec![3.0, 7.0]);
    assert_relative_eq!(summary.sd[0], 2.0_f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(summary.sd[1], 2.0_f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(summary.weights()[0], 1.0 / 2.0_f64.sqrt(), epsilon = 1e-12);
    assert_eq!(summary.replicates, 2);
}

#[test]
fn test_single_replicate_policy() {
    let matrix = ReplicateMatrix::new(Method::Y, vec![vec![2.0], vec![6.0]]).unwrap();

    let err = SummaryVectors::from_matrix(&matrix, ReplicatePolicy::Reject).unwrap_err();
    assert_eq!(
        err,
        SummaryError::InsufficientReplicates {
            side: Method::Y,
            found: 1,
            required: 2
        }
    );

    let summary =
        SummaryVectors::from_matrix(&matrix, ReplicatePolicy::UnitWeightFallback).unwrap();
    assert_eq!(summary.mean, vec![2.0, 6.0]);
    assert_eq!(summary.sd, vec![1.0, 1.0]);
}

#[test]
fn test_agreement_of_known_means() {
    let result = bland_altman(
        &[1.0, 2.0, 3.0],
        &[1.0, 3.0, 5.0],
        &AgreementOptions::default(),
    )
    .unwrap();

    assert_eq!(result.differences, vec![0.0, 1.0, 2.0]);
    assert_relative_eq!(result.bias, 1.0, epsilon = 1e-12);
    assert_relative_eq!(result.sd_diff, 1.0, epsilon = 1e-12);
    assert_relative_eq!(result.lower_limit, -0.96, epsilon = 1e-12);
    assert_relative_eq!(result.upper_limit, 2.96, epsilon = 1e-12);
}

#[test]
fn test_agreement_from_replicates() {
    let pair = ReplicatePair::from_inputs(
        "10,12; 20,22; 30,32; 40,42",
        "12,12; 21,23; 33,33; 41,45",
        &ParseOptions::default(),
    )
    .unwrap();
    let x = SummaryVectors::from_matrix(pair.x(), ReplicatePolicy::Reject).unwrap();
    let y = SummaryVectors::from_matrix(pair.y(), ReplicatePolicy::Reject).unwrap();
    let result = bland_altman(&x.mean, &y.mean, &AgreementOptions::default()).unwrap();

    // means X = 11, 21, 31, 41 and Y = 12, 22, 33, 43
    assert_eq!(result.differences, vec![1.0, 1.0, 2.0, 2.0]);
    assert_eq!(result.means, vec![11.5, 21.5, 32.0, 42.0]);
    assert_relative_eq!(result.bias, 1.5, epsilon = 1e-12);
    // sd of (1, 1, 2, 2) with n - 1 divisor
    assert_relative_eq!(result.sd_diff, (1.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_agreement_is_antisymmetric() {
    let x = [4.1, 5.3, 6.0, 7.7, 9.2];
    let y = [4.4, 5.1, 6.6, 7.9, 9.0];
    let forward = bland_altman(&x, &y, &AgreementOptions::default()).unwrap();
    let backward = bland_altman(&y, &x, &AgreementOptions::default()).unwrap();

    assert_relative_eq!(forward.bias, -backward.bias, epsilon = 1e-12);
    assert_relative_eq!(forward.sd_diff, backward.sd_diff, epsilon = 1e-12);
    assert_relative_eq!(forward.upper_limit, -backward.lower_limit, epsilon = 1e-12);
}

#[test]
fn test_percentage_differences() {
    let options = AgreementOptions::default().with_scale(DifferenceScale::Percentage);
    let result = bland_altman(&[95.0, 190.0, 47.5], &[105.0, 210.0, 52.5], &options).unwrap();
    for d in &result.differences {
        assert_relative_eq!(*d, 10.0, epsilon = 1e-10);
    }
    assert_relative_eq!(result.sd_diff, 0.0, epsilon = 1e-10);
}
