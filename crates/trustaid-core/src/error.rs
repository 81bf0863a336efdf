//! Error types for talking to the chat backend.

use thiserror::Error;

/// Every way a chat request can fail.
///
/// The conversation controller collapses all of these into one generic
/// "request failed" transcript entry; the `Display` text only feeds the
/// ambient error slot.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The response body was not a JSON object.
    #[error("malformed response body: {0}")]
    MalformedBody(String),

    /// The background request task died before reporting back.
    #[error("request task failed: {0}")]
    Task(String),
}

pub type ChatResult<T> = Result<T, ChatError>;
