//! Error taxonomy shared by every client call and user action.
//!
//! Client-input errors (`InvalidSelection`, `NoWellSelected`) are raised
//! before any request is made. The remaining variants describe how a network
//! exchange went wrong.

/// Errors surfaced by the clients and the selection controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A selection field required by the action is empty (names the field).
    InvalidSelection(&'static str),
    /// Outlier flagging was requested before any well was clicked.
    NoWellSelected,
    /// Transport-level failure (connection, HTTP status, timeout).
    NetworkFailure(String),
    /// The response body did not have the expected shape.
    ParseFailure(String),
    /// The backend rejected the request content.
    ValidationFailure(String),
}

impl ClientError {
    /// True for errors detected locally before any I/O happened.
    #[cfg(test)]
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidSelection(_) | ClientError::NoWellSelected
        )
    }

    pub(crate) fn parse(err: impl std::fmt::Display) -> Self {
        ClientError::ParseFailure(err.to_string())
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::InvalidSelection(field) => {
                write!(f, "Invalid selection: no {} selected", field)
            }
            ClientError::NoWellSelected => write!(f, "No well selected"),
            ClientError::NetworkFailure(msg) => write!(f, "Network failure: {}", msg),
            ClientError::ParseFailure(msg) => write!(f, "Unexpected response: {}", msg),
            ClientError::ValidationFailure(msg) => write!(f, "Request rejected: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::parse(err)
    }
}
