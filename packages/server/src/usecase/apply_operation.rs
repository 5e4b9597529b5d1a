//! UseCase: 操作の適用処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ApplyOperationUseCase::execute() メソッド
//! - 操作の種類ごとに Room Store の対応するメソッドが呼ばれること
//!
//! ### なぜこのテストが必要か
//! - 操作の種類と Store の変更メソッドの対応が崩れていないことを保証
//! - 接続 ID・オリジン ID がそのまま Store に渡ることを確認
//! - Store の失敗が発行元にだけ返るエラーになることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：4 種類の操作それぞれの適用
//! - 異常系：Store が変更を拒否した場合

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Operation, OperationOutput, OriginId, RoomId, RoomStore,
};

use super::error::ApplyOperationError;

/// 操作を発行したセッションの情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    pub origin_id: OriginId,
}

/// 操作適用のユースケース
pub struct ApplyOperationUseCase {
    /// Room Store（データアクセス層の抽象化）
    store: Arc<dyn RoomStore>,
}

impl ApplyOperationUseCase {
    /// 新しい ApplyOperationUseCase を作成
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// 操作を Room Store に適用する
    ///
    /// 成功した変更の通知（ブロードキャスト）は Store 側の通知ストリームが担う。
    ///
    /// # Returns
    ///
    /// * `Ok(OperationOutput)` - 適用結果（ack に載せるデータ）
    /// * `Err(ApplyOperationError)` - Store が変更を拒否した
    pub async fn execute(
        &self,
        ctx: &OperationContext,
        operation: Operation,
    ) -> Result<OperationOutput, ApplyOperationError> {
        let OperationContext {
            room_id,
            connection_id,
            origin_id,
        } = ctx;

        let output = match operation {
            Operation::AddMessage(draft) => OperationOutput::Message(
                self.store
                    .add_message(room_id, connection_id, draft, origin_id)
                    .await?,
            ),
            Operation::EditMessage(edit) => OperationOutput::Message(
                self.store
                    .edit_message(room_id, connection_id, edit, origin_id)
                    .await?,
            ),
            Operation::AddImage(url) => OperationOutput::Message(
                self.store
                    .add_image(room_id, connection_id, url, origin_id)
                    .await?,
            ),
            Operation::AddCharacter(draft) => OperationOutput::Chara(
                self.store
                    .add_chara(room_id, connection_id, draft, origin_id)
                    .await?,
            ),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Chara, CharaColor, CharaDraft, CharaId, CharaName, ImageUrl, Message, MessageBody,
        MessageContent, MessageDraft, MessageEdit, MessageId, MessageKind, MockRoomStore,
        RepositoryError, Timestamp,
    };

    fn create_test_context() -> OperationContext {
        OperationContext {
            room_id: RoomId::new("rp_42".to_string()).unwrap(),
            connection_id: ConnectionId::new("alice".to_string()).unwrap(),
            origin_id: OriginId::new("origin-a".to_string()).unwrap(),
        }
    }

    fn content(value: &str) -> MessageContent {
        MessageContent::new(value.to_string()).unwrap()
    }

    fn stored_message(id: &str, text: &str) -> Message {
        Message {
            id: MessageId::new(id.to_string()).unwrap(),
            body: MessageBody::Narrator {
                content: content(text),
            },
            origin_id: OriginId::new("origin-a".to_string()).unwrap(),
            created_at: Timestamp::new(0),
            edited_at: None,
        }
    }

    #[tokio::test]
    async fn test_add_message_passes_session_context() {
        // テスト項目: add-message が発行元の接続 ID・オリジン ID 付きで Store に渡される
        // given (前提条件):
        let mut store = MockRoomStore::new();
        store
            .expect_add_message()
            .withf(|room_id, connection_id, draft, origin_id| {
                room_id.as_str() == "rp_42"
                    && connection_id.as_str() == "alice"
                    && origin_id.as_str() == "origin-a"
                    && draft.content.as_str() == "hi"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(stored_message("m1", "hi")));
        let usecase = ApplyOperationUseCase::new(Arc::new(store));
        let operation = Operation::AddMessage(MessageDraft {
            kind: MessageKind::Narrator,
            content: content("hi"),
        });

        // when (操作):
        let result = usecase.execute(&create_test_context(), operation).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(OperationOutput::Message(stored_message("m1", "hi")))
        );
    }

    #[tokio::test]
    async fn test_edit_message_routes_to_store() {
        // テスト項目: edit-message が Store の edit_message に渡される
        // given (前提条件):
        let mut store = MockRoomStore::new();
        store
            .expect_edit_message()
            .withf(|_, _, edit, _| edit.id.as_str() == "m1")
            .times(1)
            .returning(|_, _, _, _| Ok(stored_message("m1", "bye")));
        let usecase = ApplyOperationUseCase::new(Arc::new(store));
        let operation = Operation::EditMessage(MessageEdit {
            id: MessageId::new("m1".to_string()).unwrap(),
            content: content("bye"),
        });

        // when (操作):
        let result = usecase.execute(&create_test_context(), operation).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(OperationOutput::Message(stored_message("m1", "bye")))
        );
    }

    #[tokio::test]
    async fn test_add_image_and_character_route_to_store() {
        // テスト項目: add-image / add-character がそれぞれ対応する Store メソッドに渡される
        // given (前提条件):
        let chara = Chara {
            id: CharaId::new("c1".to_string()).unwrap(),
            name: CharaName::new("Alice".to_string()).unwrap(),
            color: CharaColor::new("#ff0000".to_string()).unwrap(),
        };
        let returned_chara = chara.clone();
        let mut store = MockRoomStore::new();
        store
            .expect_add_image()
            .times(1)
            .returning(|_, _, _, _| Ok(stored_message("m2", "image")));
        store
            .expect_add_chara()
            .times(1)
            .returning(move |_, _, _, _| Ok(returned_chara.clone()));
        let usecase = ApplyOperationUseCase::new(Arc::new(store));
        let ctx = create_test_context();

        // when (操作):
        let image = usecase
            .execute(
                &ctx,
                Operation::AddImage(
                    ImageUrl::new("https://example.com/a.png".to_string()).unwrap(),
                ),
            )
            .await;
        let added = usecase
            .execute(
                &ctx,
                Operation::AddCharacter(CharaDraft {
                    name: chara.name.clone(),
                    color: chara.color.clone(),
                }),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(image, Ok(OperationOutput::Message(_))));
        assert_eq!(added, Ok(OperationOutput::Chara(chara)));
    }

    #[tokio::test]
    async fn test_rejected_operation() {
        // テスト項目: Store が変更を拒否した場合はエラーが返る
        // given (前提条件):
        let mut store = MockRoomStore::new();
        store
            .expect_edit_message()
            .returning(|_, _, _, _| Err(RepositoryError::NotMessageAuthor));
        let usecase = ApplyOperationUseCase::new(Arc::new(store));
        let operation = Operation::EditMessage(MessageEdit {
            id: MessageId::new("m1".to_string()).unwrap(),
            content: content("bye"),
        });

        // when (操作):
        let result = usecase.execute(&create_test_context(), operation).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ApplyOperationError::Rejected(RepositoryError::NotMessageAuthor))
        );
    }
}
