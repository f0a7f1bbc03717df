// src/errors.rs
use thiserror::Error;

/// Shown when the backend could not be reached at all.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Error: could not get prediction";

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("No input data provided")]
    EmptyInput,

    #[error("A prediction is already in progress")]
    SubmissionInFlight,

    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Backend returned an error: {0}")]
    Backend(String),

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("Failed to encode rows: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PredictError {
    /// The text put in front of the user. Backend messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            PredictError::ApiError { message, .. } => message.clone(),
            PredictError::Backend(message) => message.clone(),
            PredictError::Request(_) => TRANSPORT_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures that happen before any network I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PredictError::EmptyInput | PredictError::Encode(_))
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
