//! UseCase: ルーム退出処理
//!
//! 切断されたセッションを multicast group から外し、以降のブロードキャスト対象から除外します。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    /// MessagePusher（multicast group の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// ルーム退出を実行（冪等）
    ///
    /// # Returns
    ///
    /// 退出したルームの ID（参加していなかった場合は None）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.message_pusher.leave_room(connection_id).await
    }
}
