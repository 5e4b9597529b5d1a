//! Repository trait 定義
//!
//! ドメイン層が必要とするルームデータへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{
    CharaDraft, ConnectionId, ImageUrl, Message, MessageDraft, MessageEdit, MutationNotification,
    OriginId, RepositoryError, ResolvedRoom, RoomId, RoomTitle,
    entity::Chara,
    value_object::AccessCode,
};

/// Room Resolver
///
/// アクセスコードからルーム ID と現在のスナップショットを解決する。
/// ルームの状態を変更してはならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomResolver: Send + Sync {
    /// アクセスコードを解決する（見つからない場合は `RepositoryError::RoomNotFound`）
    async fn resolve(&self, access_code: &AccessCode) -> Result<ResolvedRoom, RepositoryError>;
}

/// Room Store（ルーム状態の変更レイヤ）
///
/// 変更が適用された後、`subscribe` で得られるストリームに
/// `MutationNotification` を 1 件だけ送出する。失敗した変更は通知しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// ルームを作成する（`access_code` が None の場合は生成する）
    async fn create_room(
        &self,
        title: RoomTitle,
        access_code: Option<AccessCode>,
    ) -> Result<AccessCode, RepositoryError>;

    /// テキストメッセージを追加
    async fn add_message(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        draft: MessageDraft,
        origin_id: &OriginId,
    ) -> Result<Message, RepositoryError>;

    /// メッセージを編集
    async fn edit_message(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        edit: MessageEdit,
        origin_id: &OriginId,
    ) -> Result<Message, RepositoryError>;

    /// 画像メッセージを追加
    async fn add_image(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        url: ImageUrl,
        origin_id: &OriginId,
    ) -> Result<Message, RepositoryError>;

    /// キャラクターを追加
    async fn add_chara(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        draft: CharaDraft,
        origin_id: &OriginId,
    ) -> Result<Chara, RepositoryError>;

    /// 変更通知のストリームを購読
    fn subscribe(&self) -> broadcast::Receiver<MutationNotification>;
}
