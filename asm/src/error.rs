use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// Unified error type for the assembler engine
#[derive(Debug, Error)]
pub enum Error {
    // Reference errors
    #[error("Reference already defined: {0}")]
    ReferenceAlreadyDefined(String),

    #[error("Reference has no defined address: {0}")]
    UndefinedReference(String),

    #[error("Unused references: {}", .0.join(", "))]
    UnusedReferences(Vec<String>),

    // Fragment errors
    #[error("Expected {expected} bytes, calculated {actual}")]
    ByteCountMismatch { expected: usize, actual: usize },

    #[error("Deferred fragment must have a positive byte count")]
    EmptyFragment,

    #[error("{what} value {value} is not within {min}..={max}")]
    OutOfRange {
        what: String,
        value: i64,
        min: i64,
        max: i64,
    },

    // Builder errors
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Repeat count must be at least 1, got {0}")]
    InvalidRepeat(usize),

    // Layout errors
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for every failure caused by reference usage, as opposed to
    /// malformed operands or layouts.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Error::ReferenceAlreadyDefined(_)
                | Error::UndefinedReference(_)
                | Error::UnusedReferences(_)
                | Error::ByteCountMismatch { .. }
                | Error::EmptyFragment
                | Error::OutOfRange { .. }
        )
    }
}
