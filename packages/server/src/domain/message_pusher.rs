//! MessagePusher trait 定義
//!
//! ルームごとの multicast group（接続中のセッションの集合）と、
//! 各接続へのメッセージ送信を抽象化します。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomId};

/// Frame queued for one connection's outbound writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    Text(String),
    /// Close the physical connection after everything queued before it
    Close,
}

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<PushMessage>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続をルームの multicast group に追加し、`greeting` をその接続だけに送信する
    ///
    /// 追加と送信は他のブロードキャストに割り込まれない。
    /// `revision` は `greeting`（スナップショット）に含まれる最後の変更のリビジョン。
    /// 同じ接続が既にいずれかのルームに参加している場合は `AlreadyJoined`。
    async fn join_room(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        channel: PusherChannel,
        greeting: String,
        revision: u64,
    ) -> Result<(), MessagePushError>;

    /// 接続を multicast group から削除（冪等）
    ///
    /// 参加していたルームの ID を返す
    async fn leave_room(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// `exclude` 以外のルームメンバー全員に送信する
    ///
    /// 参加時のスナップショットに `revision` の変更が既に含まれているメンバーには送らない。
    /// 個々の送信失敗はログに記録して継続する。送信できた接続数を返す。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        exclude: &ConnectionId,
        revision: u64,
        content: &str,
    ) -> usize;

    /// 全ての接続に切断を要求する（シャットダウン時）
    async fn close_all(&self);
}
