pub mod error;
pub mod output;

pub use error::MigrateError;
pub use output::{OutputFormat, OutputWriter};
