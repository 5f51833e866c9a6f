pub mod error;
pub mod input;
pub mod matrix;
pub mod parser;

pub use error::ParseError;
pub use input::{InputKind, MatrixInput, ParseOptions};
pub use matrix::{Method, ReplicateMatrix, ReplicatePair};
pub use parser::read_replicates;
