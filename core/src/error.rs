use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MorseError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Non-monotonic timestamp: {current:.3}s arrived after {previous:.3}s")]
    NonMonotonicTimestamp { previous: f64, current: f64 },

    #[error("Frame carries no timestamp")]
    MissingTimestamp,

    #[error("Decoder session already finalized")]
    SessionClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("FFT error: {0}")]
    FftError(String),
}

pub type Result<T> = std::result::Result<T, MorseError>;
