pub mod csv;
pub mod text;

// Expose the main loading functions
pub use self::csv::{from_reader as load_replicates_reader, read_replicates};
pub use self::text::{format_values, parse_rows, parse_values};
