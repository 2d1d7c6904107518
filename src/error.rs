use thiserror::Error;

/// Error types that can occur when talking to the assistant backend.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Transport failures: connection refused, DNS, timeouts
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// The backend answered with a non-2xx status
    #[error("Server responded with status: {status}")]
    Status { status: u16, body: String },
    /// Response body could not be decoded
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// Invalid request parameters or client configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AssistantError {
    /// Whether this error belongs to the connectivity class shown to the user
    /// as a generic "could not reach the server" message.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            AssistantError::HttpError(_)
                | AssistantError::Status { .. }
                | AssistantError::ResponseFormatError { .. }
        )
    }

    /// HTTP status code when the backend rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            AssistantError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Converts reqwest HTTP errors into AssistantErrors
impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::HttpError(err.to_string())
    }
}
