use crate::data::{Method, ParseError, ParseOptions};

/// Split delimited text into rows of replicate values
///
/// Two layouts are accepted:
///
/// - A flat list such as `"4.5, 5.0, 4.8"`: every token is one subject with a
///   single replicate.
/// - One subject per line (or per `;`-terminated segment) such as
///   `"4.5, 4.6; 5.0, 5.1"`: every token on a line is a replicate of that subject.
///   A lone trailing `;` turns a single line into one multi-replicate subject.
///
/// Whitespace around tokens is ignored, and empty tokens left behind by repeated
/// or trailing delimiters are discarded. When `;` is itself the value delimiter,
/// only newlines separate subjects.
///
/// # Errors
///
/// Returns [ParseError::MalformedValue] for the first token that is not a finite
/// number.
pub fn parse_rows(
    side: Method,
    raw: &str,
    options: &ParseOptions,
) -> Result<Vec<Vec<f64>>, ParseError> {
    let delimiter = options.delimiter;
    let body = raw.trim();
    let semicolon_rows = delimiter != ';';
    let row_mode = body.contains('\n') || (semicolon_rows && body.contains(';'));

    if !row_mode {
        return tokens(body, delimiter)
            .enumerate()
            .map(|(subject, token)| parse_token(side, subject, token).map(|v| vec![v]))
            .collect();
    }

    let segments = body.split(|c: char| c == '\n' || (semicolon_rows && c == ';'));
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for segment in segments {
        let subject = rows.len();
        let row = tokens(segment, delimiter)
            .map(|token| parse_token(side, subject, token))
            .collect::<Result<Vec<f64>, ParseError>>()?;
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Parse a flat delimited list of single readings
pub fn parse_values(
    side: Method,
    raw: &str,
    options: &ParseOptions,
) -> Result<Vec<f64>, ParseError> {
    tokens(raw, options.delimiter)
        .enumerate()
        .map(|(subject, token)| parse_token(side, subject, token))
        .collect()
}

/// Format values as a delimited list that [parse_values] reads back exactly
pub fn format_values(values: &[f64], options: &ParseOptions) -> String {
    let separator = format!("{} ", options.delimiter);
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(&separator)
}

fn tokens(segment: &str, delimiter: char) -> impl Iterator<Item = &str> {
    segment
        .split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn parse_token(side: Method, subject: usize, token: &str) -> Result<f64, ParseError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::MalformedValue {
            side,
            subject,
            token: token.to_string(),
        }),
    }
}
