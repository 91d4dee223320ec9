//! Error types and handling for `TourPlan`

use thiserror::Error;

/// Main error type for the `TourPlan` application
#[derive(Error, Debug)]
pub enum TourPlanError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Attraction graph or record store could not be loaded
    #[error("Data error: {message}")]
    Data { message: String },

    /// Text generation collaborator failures
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TourPlanError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new data error
    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TourPlanError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            TourPlanError::Data { message } => {
                format!("Attraction data could not be loaded: {message}")
            }
            TourPlanError::Generation { .. } => {
                "Unable to reach the text generation service. Is the model server running?"
                    .to_string()
            }
            TourPlanError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TourPlanError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            TourPlanError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TourPlanError::General { message } => message.clone(),
        }
    }
}

impl From<serde_json::Error> for TourPlanError {
    fn from(err: serde_json::Error) -> Self {
        TourPlanError::data(err.to_string())
    }
}
