use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("fuzzy threshold {threshold} is outside the allowed range {min}..={max}")]
    ThresholdOutOfRange { threshold: u8, min: u8, max: u8 },

    #[error("duplicate detection was cancelled")]
    Cancelled,

    #[error("background detection worker failed: {0}")]
    Worker(String),

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, DedupError>;
