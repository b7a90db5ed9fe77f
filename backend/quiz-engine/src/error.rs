use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while building palettes or generating questions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuizError {
    /// A color was requested that the palette has no range for.
    #[error("unknown color: {0}")]
    UnknownColor(String),

    #[error("invalid channel range {low}..={high}")]
    InvalidRange { low: u8, high: u8 },

    /// The palette produced no swatches, so no question can be built.
    #[error("palette has no colors configured")]
    EmptyPalette,
}

/// Failures raised by preference store backends.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to access preference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode preferences: {0}")]
    Serialization(#[from] serde_json::Error),
}
