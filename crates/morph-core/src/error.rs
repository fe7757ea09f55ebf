use thiserror::Error;

pub type Result<T> = std::result::Result<T, MorphError>;

#[derive(Debug, Error)]
pub enum MorphError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio error: {0}")]
    Audio(String),
    #[error("malformed model: {0}")]
    Format(String),
    #[error("insufficient training data: {0}")]
    InsufficientData(String),
    #[error("numerical failure: {0}")]
    Numeric(String),
}
