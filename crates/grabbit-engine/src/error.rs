use grabbit_contracts::ConfigError;
use thiserror::Error;

/// Per-item faults raised by a provider. The dispatcher turns these into
/// soft failures; they never end a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} request failed ({code}): {message}")]
    Status {
        provider: String,
        code: u16,
        message: String,
    },

    #[error("{provider} returned an invalid payload: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("{provider} image data could not be decoded: {message}")]
    Decode { provider: String, message: String },

    #[error("{provider} image encoding failed: {message}")]
    Encode { provider: String, message: String },
}

/// Errors that stop a batch. Per-item failures are counted, not raised.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    EventLog(#[from] anyhow::Error),
}
