//! Error types for the chat hub
//!
//! Defines transport-level errors and per-request command errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Transport and application-level errors
///
/// These are fatal to the operation that raised them: a failed bind aborts
/// startup, a failed read or write tears down the affected connection.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal to the connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Line framing error (oversized or invalid line)
    #[error("line framing error: {0}")]
    Framing(#[from] tokio_util::codec::LinesCodecError),

    /// Listener could not be bound on the configured address
    #[error("cannot create a listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Request queue closed (hub shut down)
    #[error("request queue closed")]
    QueueClosed,

    /// Client identity file could not be read or created
    #[error("could not locate existing or generate new client identity")]
    Identity,
}

/// Per-command request failures
///
/// Recovered in place by the hub: the Display string becomes the `Error`
/// field of the response sent back to the requester. The texts are part of
/// the wire protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Request from an identifier without a prior set_name
    #[error("no name is associated with client ID - set a user name first")]
    UnknownIdentity,

    /// create on a room name already in use
    #[error("a room by that name already exists")]
    NameTaken,

    /// join/leave/new_msg/destroy on a non-existent room
    #[error("specified room does not exist")]
    NoSuchRoom,

    /// join when already in the subscriber set
    #[error("user is already subscribed to this room")]
    AlreadySubscribed,

    /// leave/new_msg when not in the subscriber set
    #[error("user is not subscribed to this room.")]
    NotSubscribed,

    /// Unrecognized request type, including empty records from framing failures
    #[error("request type not recognised")]
    UnrecognisedRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_wire_texts() {
        assert_eq!(
            RequestError::UnknownIdentity.to_string(),
            "no name is associated with client ID - set a user name first"
        );
        assert_eq!(
            RequestError::NotSubscribed.to_string(),
            "user is not subscribed to this room."
        );
        assert_eq!(
            RequestError::UnrecognisedRequest.to_string(),
            "request type not recognised"
        );
    }
}
