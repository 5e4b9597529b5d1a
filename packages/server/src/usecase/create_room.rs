//! UseCase: ルーム作成処理

use std::sync::Arc;

use crate::domain::{AccessCode, RepositoryError, RoomStore, RoomTitle};

use super::error::CreateRoomError;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// Room Store（データアクセス層の抽象化）
    store: Arc<dyn RoomStore>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `title` - ルームのタイトル
    /// * `access_code` - 固定のアクセスコード（None の場合は生成）
    ///
    /// # Returns
    ///
    /// * `Ok(AccessCode)` - 作成したルームのアクセスコード
    /// * `Err(CreateRoomError)` - 作成失敗
    pub async fn execute(
        &self,
        title: String,
        access_code: Option<String>,
    ) -> Result<AccessCode, CreateRoomError> {
        let title = RoomTitle::new(title)?;
        let access_code = access_code.map(AccessCode::new).transpose()?;

        self.store
            .create_room(title, access_code)
            .await
            .map_err(|e| match e {
                RepositoryError::AccessCodeTaken(code) => CreateRoomError::CodeTaken(code),
                other => CreateRoomError::Repository(other.to_string()),
            })
    }
}
