use thiserror::Error;

use crate::agreement::AgreementError;
use crate::data::ParseError;
use crate::regression::RegressionError;
use crate::summary::SummaryError;

#[derive(Error, Debug, Clone)]
pub enum MethcompError {
    #[error("Input error: {0}")]
    Parse(#[from] ParseError),
    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),
    #[error("Agreement error: {0}")]
    Agreement(#[from] AgreementError),
    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),
    /// A configuration value is outside its valid range
    #[error("Invalid option: {name} = {value}")]
    InvalidOption { name: &'static str, value: String },
    #[error("Could not read options: {0}")]
    Options(String),
}
