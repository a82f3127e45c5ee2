use crate::CommentId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Rejected locally, before any state change or network call
    Validation,

    /// The remote call failed or returned a non-success status
    NetworkOrServer,

    /// The persisted snapshot could not be read or written
    Storage,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Comment text must not be empty")]
    EmptyText,

    #[error("Unknown comment {0}")]
    UnknownComment(CommentId),

    #[error("Comment {0} has not been confirmed by the server yet")]
    ProvisionalComment(CommentId),

    #[error("An upvote toggle is already in flight for comment {0}")]
    UpvoteInFlight(CommentId),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyText
            | Error::UnknownComment(_)
            | Error::ProvisionalComment(_)
            | Error::UpvoteInFlight(_) => ErrorKind::Validation,
            Error::Network(_) | Error::Server { .. } => ErrorKind::NetworkOrServer,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Builds the error for a non-success response, extracting the message from
    /// a `{"message": ...}` body when there is one
    pub fn from_response(status: u16, body: &[u8]) -> Error {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
        Error::Server { status, message }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Storage(e.to_string())
    }
}
