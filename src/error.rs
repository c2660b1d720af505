use thiserror::Error;

/// Errors produced by the wake detection components.
#[derive(Debug, Error)]
pub enum WakeError {
    /// Frame sample count does not match the configured frame length.
    #[error("invalid frame: expected {expected} samples, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    /// Byte buffer length does not match the configured input frame length.
    #[error("invalid buffer: expected {expected} bytes, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    /// Rejected configuration, raised at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio format that can not be decoded.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("resampler error: {0}")]
    Resampler(String),

    /// Failure reported by a wake word scorer.
    #[error("wake word scorer failed: {0}")]
    Scorer(String),

    #[error("voice activity classifier error: {0}")]
    Vad(String),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}
