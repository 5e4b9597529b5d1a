//! Domain layer errors.

use thiserror::Error;

/// Value Object の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} has an invalid format")]
    InvalidFormat(&'static str),
}

/// Room store (Repository) のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Access code '{0}' is already in use")]
    AccessCodeTaken(String),

    #[error("Message '{0}' not found")]
    MessageNotFound(String),

    #[error("Character '{0}' not found")]
    CharaNotFound(String),

    #[error("Only the author of a message can edit it")]
    NotMessageAuthor,

    #[error("Image messages cannot be edited")]
    MessageNotEditable,

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] ValueObjectError),
}

/// Multicast group (MessagePusher) のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Connection '{0}' is already joined to a room")]
    AlreadyJoined(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// Connection Session の状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionStateError {
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
