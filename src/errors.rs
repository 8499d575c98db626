/*!
 * Error types for the scenewright library.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The request did not complete before the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether retrying the same request later can reasonably succeed.
    ///
    /// Timeouts, connection failures, rate limiting and 5xx responses are
    /// transient. Authentication failures and other 4xx responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }

    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError {
                status_code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by the structured-extraction stages
#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    /// Timeout, connection failure or overloaded service
    #[error("Transient service error: {0}")]
    Transient(ProviderError),

    /// Provider failure that will not go away by retrying
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Response was not JSON, or JSON missing required fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Nothing usable could be extracted at all
    #[error("Fatal extraction error: {0}")]
    Fatal(String),
}

impl ExtractionError {
    /// Whether the retry policy may attempt the operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::MalformedResponse(_))
    }

    /// Whether the retry policy should sleep before the next attempt.
    ///
    /// Only network-level failures back off; malformed output is retried
    /// immediately.
    pub fn should_back_off(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<ProviderError> for ExtractionError {
    fn from(error: ProviderError) -> Self {
        if error.is_transient() {
            Self::Transient(error)
        } else {
            Self::Provider(error)
        }
    }
}

/// Transaction-level persistence failures
#[derive(Error, Debug, Clone)]
pub enum PersistenceError {
    /// The import transaction failed and was rolled back
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// The job status record could not be read or written
    #[error("Job store error: {0}")]
    JobStore(String),

    /// A referenced record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Transaction(error.to_string())
    }
}

/// Errors that end a pipeline run in the `failed` state
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// No scene headers could be located in the document
    #[error("No scenes to process: {0}")]
    NoScenes(ExtractionError),

    /// The validator reported blocking errors, import was not attempted
    #[error("Validation failed with {} error(s): {}", errors.len(), errors.join("; "))]
    ValidationFailed {
        /// Blocking validation errors
        errors: Vec<String>,
    },

    /// The import transaction or a job status write failed
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// A panic escaped one of the stages
    #[error("Pipeline aborted unexpectedly: {0}")]
    Panicked(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from an extraction stage
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
