//! UseCase layer errors.

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// ルーム参加（解決 + multicast group への追加）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    /// アクセスコードが不正、または該当するルームがない
    #[error("Room not found")]
    RoomNotFound,

    /// 解決が完了する前に接続が閉じられた
    #[error("Connection closed before the room was joined")]
    SessionClosed,

    #[error("Failed to join room: {0}")]
    JoinFailed(String),
}

/// 操作の適用エラー（発行元にのみ返される）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyOperationError {
    #[error(transparent)]
    Rejected(#[from] RepositoryError),
}

/// ルーム作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("Invalid room: {0}")]
    Invalid(#[from] ValueObjectError),

    #[error("Access code '{0}' is already in use")]
    CodeTaken(String),

    #[error("Failed to create room: {0}")]
    Repository(String),
}
