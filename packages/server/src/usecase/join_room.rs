//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::resolve() / join() メソッド
//! - アクセスコードの解決と multicast group への追加
//!
//! ### なぜこのテストが必要か
//! - 解決に失敗したセッションがブロードキャスト対象に入らないことを保証
//! - スナップショット（load-room）が参加した接続にだけ送られることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なアクセスコードでの参加
//! - 異常系：存在しない・不正なアクセスコード
//! - エッジケース：同じ接続の二重参加

use std::sync::Arc;

use crate::domain::{
    AccessCode, ConnectionId, MessagePusher, PusherChannel, RepositoryError,
    ResolvedRoom, RoomId, RoomResolver,
};

use super::error::JoinRoomError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Room Resolver（アクセスコード解決の抽象化）
    resolver: Arc<dyn RoomResolver>,
    /// MessagePusher（multicast group の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(resolver: Arc<dyn RoomResolver>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            resolver,
            message_pusher,
        }
    }

    /// アクセスコードを解決する
    ///
    /// # Arguments
    ///
    /// * `access_code` - 接続パラメータから取り出したアクセスコード（未検証の文字列）
    ///
    /// # Returns
    ///
    /// * `Ok(ResolvedRoom)` - ルーム ID とスナップショット
    /// * `Err(JoinRoomError::RoomNotFound)` - コードが不正、またはルームが存在しない
    pub async fn resolve(&self, access_code: &str) -> Result<ResolvedRoom, JoinRoomError> {
        let access_code = AccessCode::new(access_code.to_string())
            .map_err(|_| JoinRoomError::RoomNotFound)?;

        self.resolver
            .resolve(&access_code)
            .await
            .map_err(|e| match e {
                RepositoryError::RoomNotFound => JoinRoomError::RoomNotFound,
                other => JoinRoomError::JoinFailed(other.to_string()),
            })
    }

    /// 接続をルームの multicast group に追加し、`load_room` を送信する
    ///
    /// # Arguments
    ///
    /// * `room_id` - 解決済みのルーム ID
    /// * `connection_id` - 参加する接続の ID
    /// * `channel` - 接続への送信チャンネル
    /// * `load_room` - 参加した接続にだけ送るスナップショット（JSON）
    /// * `revision` - スナップショットに含まれる最後のリビジョン
    pub async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        channel: PusherChannel,
        load_room: String,
        revision: u64,
    ) -> Result<(), JoinRoomError> {
        self.message_pusher
            .join_room(room_id, connection_id, channel, load_room, revision)
            .await
            .map_err(|e| JoinRoomError::JoinFailed(e.to_string()))
    }
}
