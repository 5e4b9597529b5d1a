//! Shared application state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    infrastructure::origin::OriginIdFactory,
    usecase::{ApplyOperationUseCase, CreateRoomUseCase, JoinRoomUseCase, LeaveRoomUseCase},
};

/// Shared application state
pub struct AppState {
    /// JoinRoomUseCase（アクセスコード解決とルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// ApplyOperationUseCase（操作適用のユースケース）
    pub apply_operation_usecase: Arc<ApplyOperationUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// 接続元アドレスから匿名化されたオリジン ID を導出する
    pub origin_id_factory: OriginIdFactory,
    /// サーバーのシャットダウン開始で true になる
    pub shutdown: watch::Receiver<bool>,
}
