/*!
 * Error types for the doctrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

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

/// Failure of a single `translate_batch` call, classified for the retry loop
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Network, timeout, rate limit or server-side failure; worth retrying
    #[error("Transient backend failure: {0}")]
    Transient(String),

    /// Authentication or configuration failure; the run cannot succeed
    #[error("Fatal backend failure: {0}")]
    Fatal(String),

    /// The response could not be mapped back onto the requested units
    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<ProviderError> for BackendError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::RequestFailed(_)
            | ProviderError::ConnectionError(_)
            | ProviderError::RateLimitExceeded(_) => Self::Transient(error.to_string()),
            ProviderError::ApiError { status_code, .. }
                if status_code == 408 || status_code == 429 || status_code >= 500 =>
            {
                Self::Transient(error.to_string())
            }
            ProviderError::ApiError { .. } | ProviderError::AuthenticationError(_) => {
                Self::Fatal(error.to_string())
            }
            ProviderError::ParseError(_) => Self::Malformed(error.to_string()),
        }
    }
}

/// Errors raised while loading, saving or editing term dictionaries
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// The dictionary file exists but could not be read or written
    #[error("Dictionary file {path:?} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dictionary file is not valid dictionary JSON
    #[error("Dictionary file {path:?} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },

    /// A term or translation was empty
    #[error("Invalid dictionary entry: {0}")]
    InvalidEntry(String),

    /// The temp scope was written to without a configured path
    #[error("No temp dictionary path configured")]
    NoTempPath,
}

/// Errors raised by document readers and writers
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to access document {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse document {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported document format: {0}")]
    Unsupported(String),
}

/// Errors that abort a translation run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// The backend reported an unrecoverable failure
    #[error("Translation backend failed fatally: {0}")]
    BackendFatal(String),

    /// A unit exhausted its retries under the fail-closed policy
    #[error("Unit {unit_id} could not be translated: {reason}")]
    UnitFailed { unit_id: String, reason: String },

    /// The run was cancelled before every unit completed
    #[error("Translation run was cancelled")]
    Cancelled,

    /// The joined results did not line up with the input units
    #[error("Translation results out of order: {0}")]
    OrderingViolation(String),
}

/// Units and results could not be paired for reconstruction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconstructionError {
    #[error("Unit count {units} does not match result count {results}")]
    CountMismatch { units: usize, results: usize },

    #[error("Result id {result_id} does not match unit id {unit_id} at index {index}")]
    IdMismatch {
        index: usize,
        unit_id: String,
        result_id: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the dictionary store
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    /// Error from document reading or writing
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from format reconstruction
    #[error("Reconstruction error: {0}")]
    Reconstruction(#[from] ReconstructionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
