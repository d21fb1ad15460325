use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during seqtag operations.
#[derive(Debug, Error)]
pub enum SeqTagError {
    /// Reading or writing a vocabulary, data or checkpoint file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON configuration could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    /// The batch to pad contains no sequences.
    #[error("cannot pad an empty batch")]
    EmptyBatch,

    /// Word and character inputs disagree in shape.
    #[error("batch shape mismatch: {0}")]
    BatchShape(String),

    /// A checkpoint is missing a required entry.
    #[error("checkpoint {path:?} is missing field {field:?}")]
    MissingField {
        /// The checkpoint file.
        path: PathBuf,
        /// The missing entry.
        field: String,
    },

    /// A checkpoint entry is present but cannot be decoded.
    #[error("invalid value {value:?} for field {field:?}")]
    InvalidField {
        /// The entry name.
        field: String,
        /// The raw stored value.
        value: String,
    },

    /// The tokenization unit is neither `char` nor `word`.
    #[error("unknown tokenization unit: {0:?}")]
    UnknownUnit(String),

    /// Candle tensor framework error.
    #[error("tensor error: {0}")]
    Candle(String),

    /// The safetensors container could not be written or read.
    #[error("safetensors error: {0}")]
    SafeTensors(String),
}

impl From<candle_core::Error> for SeqTagError {
    fn from(err: candle_core::Error) -> Self {
        Self::Candle(err.to_string())
    }
}

impl From<safetensors::SafeTensorError> for SeqTagError {
    fn from(err: safetensors::SafeTensorError) -> Self {
        Self::SafeTensors(err.to_string())
    }
}

/// Result type alias for seqtag operations.
pub type Result<T> = std::result::Result<T, SeqTagError>;
