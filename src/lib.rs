pub mod agreement;
pub mod comparison;
pub mod data;
pub mod error;
pub mod regression;
pub mod summary;

pub use crate::agreement::{bland_altman, AgreementOptions, AgreementResult, DifferenceScale};
pub use crate::comparison::{compare, compare_text, ComparisonOptions, ComparisonReport};
pub use crate::data::*;
pub use crate::regression::{FitOptions, OdrOptions, OdrSolver, RegressionResult};
pub use crate::summary::{ReplicatePolicy, SummaryVectors};
pub use error::MethcompError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            parser::read_replicates, InputKind, MatrixInput, Method, ParseOptions,
            ReplicateMatrix, ReplicatePair,
        };
    }
    pub mod analysis {
        pub use crate::agreement::{bland_altman, AgreementOptions, DifferenceScale};
        pub use crate::regression::{odr, wls, FitMethod, FitOptions, OdrOptions, OdrSolver};
        pub use crate::summary::{ReplicatePolicy, SummaryVectors};
    }

    pub use crate::comparison::{compare, compare_text, ComparisonOptions, ComparisonReport};
    pub use crate::data::*;
    pub use crate::error::MethcompError;
}
