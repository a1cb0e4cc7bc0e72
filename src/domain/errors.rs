use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Audio processing error: {0}")]
    Audio(#[from] dasp_rs::AudioError),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Transform failed: {0}")]
    TransformFailure(String),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn transform(msg: impl Into<String>) -> Self {
        AppError::TransformFailure(msg.into())
    }
}
