use duet_core::RoomId;
use std::fmt;
use thiserror::Error;

/// Rejections of `create`/`join` requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("room '{0}' already exists")]
    AlreadyExists(RoomId),

    #[error("room '{0}' not found")]
    NotFound(RoomId),

    #[error("room '{0}' is full")]
    Full(RoomId),

    #[error("room id is required")]
    MissingId,

    #[error("connection already belongs to room '{0}'")]
    AlreadyInRoom(RoomId),
}

impl RoomError {
    /// Text sent back to the client. Missing and occupied rooms share one
    /// message.
    pub fn user_message(&self) -> &'static str {
        match self {
            RoomError::AlreadyExists(_) => "Room already exists",
            RoomError::NotFound(_) | RoomError::Full(_) => "Room not found or is full",
            RoomError::MissingId => "Room id is required",
            RoomError::AlreadyInRoom(_) => "Already in a room",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Offer,
    Answer,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStage::Offer => f.write_str("offer exchange"),
            HandshakeStage::Answer => f.write_str("answer exchange"),
        }
    }
}

/// Why a side's handshake routine stopped before completing.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("negotiation failed: {0:#}")]
    Negotiation(#[from] anyhow::Error),

    #[error("timed out during {0}")]
    Timeout(HandshakeStage),

    #[error("other side failed during {0}")]
    PeerFailed(HandshakeStage),

    #[error("room torn down")]
    Cancelled,
}

impl HandshakeError {
    /// Teardown is the normal end of a handshake, not a failure to report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HandshakeError::Cancelled)
    }
}
