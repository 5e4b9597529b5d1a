//! UseCase: 変更通知のブロードキャスト
//!
//! Room Store の通知ストリームを購読し、変更を発行元以外のルームメンバーに配信します。
//! 通知の種類ごとの送信フレームは起動時に渡されるバインディングで決まります。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MutationBroadcaster::handle() / spawn() メソッド
//!
//! ### なぜこのテストが必要か
//! - 発行元が自分の変更のブロードキャストを受け取らないことを保証
//! - バインディングのない通知が配信されないことを確認
//! - 通知ストリームの取りこぼし（Lagged）で配信が止まらないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人のルームでの配信
//! - エッジケース：発行元が既に切断済み、バインディングなし、通知の取りこぼし

use std::sync::Arc;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::domain::{MessagePusher, Mutation, MutationKind, MutationNotification};

/// 変更を送信フレーム（JSON）に変換する関数
pub type MutationEncoder = fn(&Mutation) -> serde_json::Result<String>;

/// 通知の種類と送信フレームの対応
#[derive(Clone, Copy)]
pub struct BroadcastBinding {
    pub kind: MutationKind,
    pub encode: MutationEncoder,
}

/// 変更通知のブロードキャスター
pub struct MutationBroadcaster {
    /// MessagePusher（multicast group の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    bindings: Vec<BroadcastBinding>,
}

impl MutationBroadcaster {
    /// 新しい MutationBroadcaster を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>, bindings: Vec<BroadcastBinding>) -> Self {
        Self {
            message_pusher,
            bindings,
        }
    }

    fn encoder_for(&self, kind: MutationKind) -> Option<MutationEncoder> {
        self.bindings
            .iter()
            .find(|binding| binding.kind == kind)
            .map(|binding| binding.encode)
    }

    /// 1 件の通知を配信する
    ///
    /// # Returns
    ///
    /// 送信できた接続数
    pub async fn handle(&self, notification: &MutationNotification) -> usize {
        let kind = notification.mutation.kind();
        let Some(encode) = self.encoder_for(kind) else {
            tracing::warn!("No broadcast binding for {:?}", kind);
            return 0;
        };

        let frame = match encode(&notification.mutation) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode {:?}: {}", kind, e);
                return 0;
            }
        };

        let delivered = self
            .message_pusher
            .broadcast(
                &notification.room_id,
                &notification.origin,
                notification.revision,
                &frame,
            )
            .await;
        tracing::debug!(
            "Broadcast {:?} in room '{}' to {} member(s)",
            kind,
            notification.room_id,
            delivered
        );
        delivered
    }

    /// 通知ストリームの購読タスクを起動する
    ///
    /// ストリームが閉じられる（Store が破棄される）まで動作する。
    pub fn spawn(self, mut events: broadcast::Receiver<MutationNotification>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(notification) => {
                        self.handle(&notification).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Broadcaster lagged behind, {} notification(s) skipped",
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::info!("Mutation broadcaster stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Chara, CharaColor, CharaId, CharaName, ConnectionId, PushMessage, RoomId,
        },
        infrastructure::message_pusher::WebSocketMessagePusher,
    };
    use tokio::sync::mpsc;

    fn encode_kind(mutation: &Mutation) -> serde_json::Result<String> {
        Ok(format!("{:?}", mutation.kind()))
    }

    fn chara_added(room_id: &RoomId, origin: &ConnectionId) -> MutationNotification {
        MutationNotification {
            room_id: room_id.clone(),
            origin: origin.clone(),
            revision: 1,
            mutation: Mutation::CharaAdded(Chara {
                id: CharaId::new("c1".to_string()).unwrap(),
                name: CharaName::new("Alice".to_string()).unwrap(),
                color: CharaColor::new("#ff0000".to_string()).unwrap(),
            }),
        }
    }

    fn connection(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    async fn join(
        pusher: &WebSocketMessagePusher,
        room_id: &RoomId,
        name: &str,
    ) -> mpsc::UnboundedReceiver<PushMessage> {
        join_at(pusher, room_id, name, 0).await
    }

    async fn join_at(
        pusher: &WebSocketMessagePusher,
        room_id: &RoomId,
        name: &str,
        revision: u64,
    ) -> mpsc::UnboundedReceiver<PushMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher
            .join_room(
                room_id.clone(),
                connection(name),
                tx,
                "load".to_string(),
                revision,
            )
            .await
            .unwrap();
        rx.recv().await;
        rx
    }

    fn all_bindings() -> Vec<BroadcastBinding> {
        [
            MutationKind::MessageAdded,
            MutationKind::MessageEdited,
            MutationKind::CharaAdded,
        ]
        .into_iter()
        .map(|kind| BroadcastBinding {
            kind,
            encode: encode_kind,
        })
        .collect()
    }

    #[tokio::test]
    async fn test_handle_excludes_originator() {
        // テスト項目: 発行元以外のメンバーにだけ配信される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room_id = RoomId::new("rp_42".to_string()).unwrap();
        let mut rx_a = join(&pusher, &room_id, "alice").await;
        let mut rx_b = join(&pusher, &room_id, "bob").await;
        let broadcaster = MutationBroadcaster::new(pusher.clone(), all_bindings());

        // when (操作):
        let delivered = broadcaster
            .handle(&chara_added(&room_id, &connection("alice")))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(
            rx_b.recv().await,
            Some(PushMessage::Text("CharaAdded".to_string()))
        );
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_with_departed_originator() {
        // テスト項目: 発行元が既に退出していても他のメンバーに配信される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room_id = RoomId::new("rp_42".to_string()).unwrap();
        let _rx_a = join(&pusher, &room_id, "alice").await;
        let mut rx_b = join(&pusher, &room_id, "bob").await;
        pusher.leave_room(&connection("alice")).await;
        let broadcaster = MutationBroadcaster::new(pusher.clone(), all_bindings());

        // when (操作):
        let delivered = broadcaster
            .handle(&chara_added(&room_id, &connection("alice")))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_handle_skips_member_whose_snapshot_has_the_change() {
        // テスト項目: 参加時のスナップショットに変更が含まれているメンバーには配信されない
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room_id = RoomId::new("rp_42".to_string()).unwrap();
        let mut rx_b = join(&pusher, &room_id, "bob").await;
        // carol resolved after the change was applied, before it was broadcast
        let mut rx_c = join_at(&pusher, &room_id, "carol", 1).await;
        let broadcaster = MutationBroadcaster::new(pusher.clone(), all_bindings());

        // when (操作):
        let delivered = broadcaster
            .handle(&chara_added(&room_id, &connection("alice")))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(rx_b.recv().await.is_some());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_without_binding() {
        // テスト項目: バインディングのない種類の通知は配信されない
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room_id = RoomId::new("rp_42".to_string()).unwrap();
        let mut rx_b = join(&pusher, &room_id, "bob").await;
        let broadcaster = MutationBroadcaster::new(
            pusher.clone(),
            vec![BroadcastBinding {
                kind: MutationKind::MessageAdded,
                encode: encode_kind,
            }],
        );

        // when (操作):
        let delivered = broadcaster
            .handle(&chara_added(&room_id, &connection("alice")))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_spawn_survives_lag() {
        // テスト項目: 通知を取りこぼしてもブロードキャスターは動作を続ける
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room_id = RoomId::new("rp_42".to_string()).unwrap();
        let mut rx_b = join(&pusher, &room_id, "bob").await;
        let (events, receiver) = broadcast::channel(1);
        // capacity 1: the first of the two is overwritten before the task runs
        events.send(chara_added(&room_id, &connection("alice"))).unwrap();
        events.send(chara_added(&room_id, &connection("alice"))).unwrap();
        let broadcaster = MutationBroadcaster::new(pusher.clone(), all_bindings());

        // when (操作):
        let handle = broadcaster.spawn(receiver);
        events.send(chara_added(&room_id, &connection("alice"))).unwrap();
        drop(events);
        handle.await.unwrap();

        // then (期待する結果):
        let mut received = 0;
        while let Ok(PushMessage::Text(_)) = rx_b.try_recv() {
            received += 1;
        }
        assert!(received >= 1);
    }
}
