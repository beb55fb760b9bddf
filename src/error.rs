use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing inputs or rebuilding pockets from P2Rank output.
#[derive(Debug, Error)]
pub enum PocketError {
    /// Input rejected before the tool runs. One message per problem.
    #[error("Invalid input structure:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error("Unsupported structure format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Malformed point record at line {line_no}: {line:?}")]
    MalformedPointLine { line_no: usize, line: String },

    #[error("No summary row for pocket {0} in the predictions CSV")]
    MissingSummaryRow(u32),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PocketError>;
