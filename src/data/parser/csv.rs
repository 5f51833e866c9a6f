use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::data::{Method, ParseError, ReplicateMatrix, ReplicatePair};

/// One reading in a long-format replicate file
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "lowercase")]
struct Reading {
    /// Subject identifier
    subject: String,
    /// Method label, `X` or `Y`
    method: String,
    /// The reading, kept as text until validated
    value: String,
}

#[derive(Default)]
struct SubjectReadings {
    id: String,
    x: Vec<String>,
    y: Vec<String>,
}

/// Read a long-format replicate CSV file
///
/// The file needs a header with the columns `subject`, `method` and `value`
/// (case-insensitive, in any order). Every row holds a single reading; rows for
/// the same subject and method are collected as replicates in file order, and
/// subjects keep the order in which they first appear. Lines starting with `#`
/// are skipped.
///
/// ```text
/// subject,method,value
/// s1,X,4.5
/// s1,X,4.6
/// s1,Y,4.4
/// s1,Y,4.7
/// ```
///
/// # Errors
///
/// Any I/O or CSV error is returned as [ParseError::CSVError]. Labels other than
/// `X`/`Y` are [ParseError::UnknownMethod], a subject measured by only one
/// method is [ParseError::UnpairedSubject], and the assembled matrices go through
/// the same checks as any other input.
pub fn read_replicates(path: impl AsRef<Path>) -> Result<ReplicatePair, ParseError> {
    let file =
        std::fs::File::open(path.as_ref()).map_err(|e| ParseError::CSVError(e.to_string()))?;
    from_reader(file)
}

/// Read long-format replicate CSV data from any reader
pub fn from_reader<R: io::Read>(reader: R) -> Result<ReplicatePair, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| ParseError::CSVError(e.to_string()))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<Vec<_>>();
    reader.set_headers(csv::StringRecord::from(headers));

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut subjects: Vec<SubjectReadings> = Vec::new();
    for result in reader.deserialize::<Reading>() {
        let reading = result.map_err(|e| ParseError::CSVError(e.to_string()))?;
        let position = *index.entry(reading.subject.clone()).or_insert_with(|| {
            subjects.push(SubjectReadings {
                id: reading.subject.clone(),
                ..Default::default()
            });
            subjects.len() - 1
        });

        let entry = &mut subjects[position];
        match reading.method.to_uppercase().as_str() {
            "X" => entry.x.push(reading.value),
            "Y" => entry.y.push(reading.value),
            _ => {
                return Err(ParseError::UnknownMethod {
                    label: reading.method,
                    subject: reading.subject,
                })
            }
        }
    }

    let mut x_rows = Vec::with_capacity(subjects.len());
    let mut y_rows = Vec::with_capacity(subjects.len());
    for (position, subject) in subjects.iter().enumerate() {
        if subject.x.is_empty() || subject.y.is_empty() {
            return Err(ParseError::UnpairedSubject {
                subject: subject.id.clone(),
                missing: if subject.x.is_empty() { Method::X } else { Method::Y },
            });
        }
        x_rows.push(parse_cells(Method::X, position, &subject.x)?);
        y_rows.push(parse_cells(Method::Y, position, &subject.y)?);
    }

    tracing::debug!(subjects = subjects.len(), "read replicate csv");
    let x = ReplicateMatrix::new(Method::X, x_rows)?;
    let y = ReplicateMatrix::new(Method::Y, y_rows)?;
    ReplicatePair::new(x, y)
}

/// Write a replicate pair in the long format read by [from_reader]
///
/// Subjects are labelled by their 1-based position.
pub fn to_writer<W: io::Write>(pair: &ReplicatePair, writer: W) -> Result<(), ParseError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for subject in 0..pair.n_subjects() {
        for matrix in [pair.x(), pair.y()] {
            for value in matrix.row(subject) {
                writer
                    .serialize(Reading {
                        subject: (subject + 1).to_string(),
                        method: matrix.side().to_string(),
                        value: value.to_string(),
                    })
                    .map_err(|e| ParseError::CSVError(e.to_string()))?;
            }
        }
    }
    writer
        .flush()
        .map_err(|e| ParseError::CSVError(e.to_string()))
}

fn parse_cells(
    side: Method,
    subject: usize,
    cells: &[String],
) -> Result<Vec<f64>, ParseError> {
    cells
        .iter()
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseError::MalformedValue {
                side,
                subject,
                token: token.clone(),
            }),
        })
        .collect()
}
