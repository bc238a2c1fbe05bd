use thiserror::Error;

/// Coarse classification of a relay failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    InvalidRequest,
    NetworkFailure,
    BackendError,
}

/// Why a chat turn or model listing did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The request was rejected before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend could not be reached or the connection dropped.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The backend answered with an error payload.
    #[error("backend error: {0}")]
    BackendError(String),

    /// The backend answered, but without the expected content.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

impl RelayError {
    /// Malformed responses are reported as backend errors.
    pub fn kind(&self) -> RelayErrorKind {
        match self {
            Self::InvalidRequest(_) => RelayErrorKind::InvalidRequest,
            Self::NetworkFailure(_) => RelayErrorKind::NetworkFailure,
            Self::BackendError(_) | Self::MalformedResponse(_) => RelayErrorKind::BackendError,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidRequest(d)
            | Self::NetworkFailure(d)
            | Self::BackendError(d)
            | Self::MalformedResponse(d) => d,
        }
    }

    /// Short text shown inline in place of the assistant turn.
    pub fn display_message(&self) -> String {
        match self {
            Self::NetworkFailure(_) => "[Network error]".to_string(),
            other => format!("[Error: {}]", other.detail()),
        }
    }
}
