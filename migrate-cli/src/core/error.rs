use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Invalid regex pattern in rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Migration plan not found: {0}")]
    PlanNotFound(String),

    #[error("Failed to parse migration plan {origin}: {message}")]
    PlanParse { origin: String, message: String },

    #[error(
        "Could not find '{}'. Please run from the PegasusSimulator root directory or pass --root",
        .0.display()
    )]
    RequiredDirMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
