//! Tests for reading replicate data
//!
//! Tests cover:
//! - Delimited text in flat and row layouts
//! - Integer and numeric grids
//! - Long-format CSV
//! - Error reporting for malformed input

use methcomp::data::parser::{self, csv};
use methcomp::prelude::*;
use std::io::Cursor;

#[test]
fn test_format_then_parse_is_exact() {
    let options = ParseOptions::default();
    let values = vec![0.1, -2.5e-7, 1.0 / 3.0, 12345.678, 0.0, std::f64::consts::PI];
    let text = parser::format_values(&values, &options);
    let parsed = parser::parse_values(Method::X, &text, &options).unwrap();
    assert_eq!(parsed, values);
}

#[test]
fn test_subject_count_mismatch() {
    let err = ReplicatePair::from_inputs("1,2,3", "1,2", &ParseOptions::default()).unwrap_err();
    assert_eq!(err, ParseError::SampleCountMismatch { x: 3, y: 2 });
}

#[test]
fn test_row_layouts_agree() {
    let options = ParseOptions::default();
    let by_semicolon = ReplicateMatrix::from_input(Method::Y, "1,2; 3,4; 5,6".into(), &options)
        .unwrap();
    let by_newline =
        ReplicateMatrix::from_input(Method::Y, "1,2\n3,4\n5,6\n".into(), &options).unwrap();
    assert_eq!(by_semicolon, by_newline);
    assert_eq!(by_newline.n_subjects(), 3);
    assert_eq!(by_newline.n_replicates(), 2);
    assert_eq!(by_newline.row(2), vec![5.0, 6.0]);
}

#[test]
fn test_custom_delimiter() {
    let options = ParseOptions::default().with_delimiter('\t');
    let matrix =
        ReplicateMatrix::from_input(Method::X, "1.5\t1.7\n2.5\t2.4".into(), &options).unwrap();
    assert_eq!(matrix.row(0), vec![1.5, 1.7]);
    assert_eq!(matrix.row(1), vec![2.5, 2.4]);
}

#[test]
fn test_integer_grid_matches_text() {
    let options = ParseOptions::default();
    let from_grid =
        ReplicateMatrix::from_input(Method::X, vec![vec![1_i64, 2], vec![3, 4]].into(), &options)
            .unwrap();
    let from_text = ReplicateMatrix::from_input(Method::X, "1,2;3,4".into(), &options).unwrap();
    assert_eq!(from_grid, from_text);
    assert_eq!(MatrixInput::from(vec![vec![1_i64]]).kind(), InputKind::Integer);
}

#[test]
fn test_malformed_token_names_subject() {
    let err = ReplicatePair::from_inputs("1,2;3,4", "1,2;3,abc", &ParseOptions::default())
        .unwrap_err();
    match err {
        ParseError::MalformedValue {
            side,
            subject,
            token,
        } => {
            assert_eq!(side, Method::Y);
            assert_eq!(subject, 1);
            assert_eq!(token, "abc");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_empty_input() {
    let err = ReplicatePair::from_inputs("  ", "1,2", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::EmptyInput { side: Method::X }));
}

#[test]
fn test_ragged_rows_rejected() {
    let err = ReplicateMatrix::from_input(
        Method::X,
        vec![vec![1.0, 2.0], vec![3.0]].into(),
        &ParseOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::NonRectangular {
            subject: 1,
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn test_read_long_csv() {
    let data = "\
# two subjects, duplicate readings
Subject,Method,Value
a,X,4.5
a,Y,4.4
a,X,4.6
b,x,5.0
a,Y,4.7
b,X,5.2
b,Y,5.1
b,y,5.3
";
    let pair = csv::from_reader(Cursor::new(data)).unwrap();
    assert_eq!(pair.n_subjects(), 2);
    assert_eq!(pair.x().row(0), vec![4.5, 4.6]);
    assert_eq!(pair.y().row(0), vec![4.4, 4.7]);
    assert_eq!(pair.x().row(1), vec![5.0, 5.2]);
    assert_eq!(pair.y().row(1), vec![5.1, 5.3]);
}

#[test]
fn test_csv_unknown_method() {
    let data = "subject,method,value\na,X,1\na,Z,2\n";
    let err = csv::from_reader(Cursor::new(data)).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnknownMethod {
            label: "Z".to_string(),
            subject: "a".to_string()
        }
    );
}

#[test]
fn test_csv_unpaired_subject() {
    let data = "subject,method,value\na,X,1\na,Y,2\nb,X,3\n";
    let err = csv::from_reader(Cursor::new(data)).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnpairedSubject {
            subject: "b".to_string(),
            missing: Method::Y
        }
    );
}

#[test]
fn test_csv_file_written_and_read_back() {
    let pair = ReplicatePair::from_inputs(
        "1.25,1.5; 2.0,2.125; 3.5,3.0",
        "1.0,1.75; 2.5,2.25; 3.25,3.75",
        &ParseOptions::default(),
    )
    .unwrap();

    let path = std::env::temp_dir().join(format!("methcomp_roundtrip_{}.csv", std::process::id()));
    let file = std::fs::File::create(&path).unwrap();
    csv::to_writer(&pair, file).unwrap();
    let read = read_replicates(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(read, pair);
}

#[test]
fn test_missing_csv_file() {
    let err = read_replicates("does/not/exist.csv").unwrap_err();
    assert!(matches!(err, ParseError::CSVError(_)));
}
