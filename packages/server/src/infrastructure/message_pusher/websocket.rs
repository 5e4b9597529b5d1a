//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - ルームごとの multicast group（接続 ID → `PusherChannel`）を管理
//! - グループ内の他の接続へのブロードキャスト
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/session.rs`）で行われます。
//! この実装は生成された `PusherChannel` を受け取り、メッセージ送信に使用します。
//!
//! 各メンバーは参加時のスナップショットのリビジョンを持ち、
//! それ以前の変更のブロードキャストは受け取りません（スナップショットとの重複を防ぐ）。
//!
//! join / leave / broadcast は全て同じ Mutex の下で実行されます。
//! そのため、ブロードキャスト中に join / leave が割り込むことはなく、
//! ブロードキャストは変更前または変更後のメンバー集合のどちらかに届きます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MessagePushError, MessagePusher, PushMessage, PusherChannel, RoomId,
};

struct Member {
    channel: PusherChannel,
    /// 参加時のスナップショットに含まれる最後のリビジョン
    revision: u64,
}

#[derive(Default)]
struct Groups {
    /// Key: room_id, Value: 参加中の接続
    rooms: HashMap<RoomId, HashMap<ConnectionId, Member>>,
    /// Key: connection_id, Value: 参加中のルーム（1 接続につき 1 ルーム）
    memberships: HashMap<ConnectionId, RoomId>,
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.join_room(room_id, connection_id, tx, load_room_json, snapshot_revision).await?;
///
/// // 送信者以外のメンバーに送信
/// pusher.broadcast(&room_id, &connection_id, revision, "{\"type\":\"add-message\"}").await;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    groups: Mutex<Groups>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let groups = self.groups.lock().await;
        groups
            .rooms
            .get(room_id)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn join_room(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        channel: PusherChannel,
        greeting: String,
        revision: u64,
    ) -> Result<(), MessagePushError> {
        let mut groups = self.groups.lock().await;

        if groups.memberships.contains_key(&connection_id) {
            return Err(MessagePushError::AlreadyJoined(
                connection_id.as_str().to_string(),
            ));
        }

        // greeting is queued before the member becomes visible to broadcasts
        channel
            .send(PushMessage::Text(greeting))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;

        groups
            .memberships
            .insert(connection_id.clone(), room_id.clone());
        groups
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone(), Member { channel, revision });

        tracing::debug!("Connection '{}' joined room '{}'", connection_id, room_id);
        Ok(())
    }

    async fn leave_room(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let mut groups = self.groups.lock().await;

        let room_id = groups.memberships.remove(connection_id)?;
        if let Some(members) = groups.rooms.get_mut(&room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                groups.rooms.remove(&room_id);
            }
        }

        tracing::debug!("Connection '{}' left room '{}'", connection_id, room_id);
        Some(room_id)
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        exclude: &ConnectionId,
        revision: u64,
        content: &str,
    ) -> usize {
        let groups = self.groups.lock().await;

        let Some(members) = groups.rooms.get(room_id) else {
            return 0;
        };

        let mut delivered = 0;
        let targets = members
            .iter()
            .filter(|(id, member)| *id != exclude && member.revision < revision);
        for (target, member) in targets {
            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = member.channel.send(PushMessage::Text(content.to_string())) {
                tracing::warn!("Failed to push message to connection '{}': {}", target, e);
            } else {
                delivered += 1;
            }
        }

        tracing::debug!(
            "Broadcasted to {} connection(s) in room '{}'",
            delivered,
            room_id
        );
        delivered
    }

    async fn close_all(&self) {
        let groups = self.groups.lock().await;
        for (connection_id, member) in groups.rooms.values().flat_map(|members| members.iter()) {
            if member.channel.send(PushMessage::Close).is_err() {
                tracing::debug!("Connection '{}' already gone at shutdown", connection_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join_room: greeting の送信と multicast group への追加
    // - broadcast: 送信者を除くルームメンバーへの送信
    // - leave_room: グループからの削除（冪等）
    //
    // 【なぜこのテストが必要か】
    // - MessagePusher はブロードキャスト対象を決める同期コアの中核
    // - 送信者本人に自分の変更が二重に届かないことを保証する必要がある
    // - 1 つの接続の送信失敗が他のメンバーへの配信を妨げないことを検証する
    // ========================================

    fn room(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn connection(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn text(value: &str) -> Option<PushMessage> {
        Some(PushMessage::Text(value.to_string()))
    }

    #[tokio::test]
    async fn test_join_room_sends_greeting_first() {
        // テスト項目: join_room で greeting が参加した接続だけに送信される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = pusher
            .join_room(room("r1"), connection("alice"), tx, "load".to_string(), 0)
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, text("load"));
        assert_eq!(pusher.members(&room("r1")).await, vec![connection("alice")]);
    }

    #[tokio::test]
    async fn test_join_room_twice_is_rejected() {
        // テスト項目: 同じ接続が 2 回参加することはできない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        pusher
            .join_room(room("r1"), connection("alice"), tx1, "load".to_string(), 0)
            .await
            .unwrap();

        // when (操作):
        let result = pusher
            .join_room(room("r2"), connection("alice"), tx2, "load".to_string(), 0)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MessagePushError::AlreadyJoined("alice".to_string()))
        );
        assert!(pusher.members(&room("r2")).await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_excludes_origin_and_other_rooms() {
        // テスト項目: ブロードキャストは送信者と他ルームのメンバーに届かない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        pusher
            .join_room(room("r1"), connection("a"), tx_a, "load".to_string(), 0)
            .await
            .unwrap();
        pusher
            .join_room(room("r1"), connection("b"), tx_b, "load".to_string(), 0)
            .await
            .unwrap();
        pusher
            .join_room(room("r2"), connection("c"), tx_c, "load".to_string(), 0)
            .await
            .unwrap();
        rx_a.recv().await;
        rx_b.recv().await;
        rx_c.recv().await;

        // when (操作):
        let delivered = pusher
            .broadcast(&room("r1"), &connection("a"), 1, "update")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx_b.recv().await, text("update"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_when_origin_already_left() {
        // テスト項目: 送信者が既に切断していても残りのメンバーに配信される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        pusher
            .join_room(room("r1"), connection("a"), tx_a, "load".to_string(), 0)
            .await
            .unwrap();
        pusher
            .join_room(room("r1"), connection("b"), tx_b, "load".to_string(), 0)
            .await
            .unwrap();
        rx_b.recv().await;
        pusher.leave_room(&connection("a")).await;

        // when (操作):
        let delivered = pusher
            .broadcast(&room("r1"), &connection("a"), 1, "update")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx_b.recv().await, text("update"));
    }

    #[tokio::test]
    async fn test_broadcast_isolates_failed_peer() {
        // テスト項目: 1 つの接続への送信失敗が他のメンバーへの配信を妨げない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        for (id, tx) in [("a", tx_a), ("b", tx_b), ("c", tx_c)] {
            pusher
                .join_room(room("r1"), connection(id), tx, "load".to_string(), 0)
                .await
                .unwrap();
        }
        rx_c.recv().await;
        drop(rx_b); // b の受信側が閉じている

        // when (操作):
        let delivered = pusher
            .broadcast(&room("r1"), &connection("a"), 1, "update")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx_c.recv().await, text("update"));
    }

    #[tokio::test]
    async fn test_leave_room_is_idempotent() {
        // テスト項目: leave_room は 2 回目以降 None を返し、メンバーから除外される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher
            .join_room(room("r1"), connection("a"), tx, "load".to_string(), 0)
            .await
            .unwrap();

        // when (操作):
        let first = pusher.leave_room(&connection("a")).await;
        let second = pusher.leave_room(&connection("a")).await;

        // then (期待する結果):
        assert_eq!(first, Some(room("r1")));
        assert_eq!(second, None);
        assert!(pusher.members(&room("r1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room() {
        // テスト項目: メンバーのいないルームへのブロードキャストはエラーにならない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let delivered = pusher
            .broadcast(&room("empty"), &connection("a"), 1, "update")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_close_all_sends_close_to_every_member() {
        // テスト項目: close_all で全メンバーに Close が送られる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        pusher
            .join_room(room("r1"), connection("a"), tx_a, "load".to_string(), 0)
            .await
            .unwrap();
        pusher
            .join_room(room("r2"), connection("b"), tx_b, "load".to_string(), 0)
            .await
            .unwrap();

        // when (操作):
        pusher.close_all().await;

        // then (期待する結果):
        assert_eq!(rx_a.recv().await, text("load"));
        assert_eq!(rx_a.recv().await, Some(PushMessage::Close));
        assert_eq!(rx_b.recv().await, text("load"));
        assert_eq!(rx_b.recv().await, Some(PushMessage::Close));
    }

    #[tokio::test]
    async fn test_broadcast_skips_revision_already_in_snapshot() {
        // テスト項目: 参加時のスナップショットに含まれる変更は、その接続にブロードキャストされない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        pusher
            .join_room(room("r1"), connection("a"), tx_a, "load".to_string(), 0)
            .await
            .unwrap();
        // b joined with a snapshot that already contains revision 1
        pusher
            .join_room(room("r1"), connection("b"), tx_b, "load".to_string(), 1)
            .await
            .unwrap();
        rx_a.recv().await;
        rx_b.recv().await;

        // when (操作):
        let stale = pusher
            .broadcast(&room("r1"), &connection("origin"), 1, "first")
            .await;
        let fresh = pusher
            .broadcast(&room("r1"), &connection("origin"), 2, "second")
            .await;

        // then (期待する結果):
        assert_eq!(stale, 1);
        assert_eq!(fresh, 2);
        assert_eq!(rx_a.recv().await, text("first"));
        assert_eq!(rx_a.recv().await, text("second"));
        assert_eq!(rx_b.recv().await, text("second"));
        assert!(rx_b.try_recv().is_err());
    }
}
