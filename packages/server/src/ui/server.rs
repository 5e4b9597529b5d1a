//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use crate::{
    domain::{MessagePusher, MutationKind},
    infrastructure::{dto::conversion::encode_mutation, origin::OriginIdFactory},
    usecase::{
        ApplyOperationUseCase, BroadcastBinding, CreateRoomUseCase, JoinRoomUseCase,
        LeaveRoomUseCase,
    },
};

use super::{
    handler::{create_room, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Outbound frames of the mutation broadcaster:
/// message added → `add-message`, message edited → `edit-message`,
/// character added → `add-character`.
pub fn default_broadcast_bindings() -> Vec<BroadcastBinding> {
    vec![
        BroadcastBinding {
            kind: MutationKind::MessageAdded,
            encode: encode_mutation,
        },
        BroadcastBinding {
            kind: MutationKind::MessageEdited,
            encode: encode_mutation,
        },
        BroadcastBinding {
            kind: MutationKind::CharaAdded,
            encode: encode_mutation,
        },
    ]
}

/// Room synchronization server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     join_room_usecase,
///     leave_room_usecase,
///     apply_operation_usecase,
///     create_room_usecase,
///     origin_id_factory,
///     message_pusher,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// JoinRoomUseCase（ルーム参加のユースケース）
    join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出のユースケース）
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// ApplyOperationUseCase（操作適用のユースケース）
    apply_operation_usecase: Arc<ApplyOperationUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    create_room_usecase: Arc<CreateRoomUseCase>,
    origin_id_factory: OriginIdFactory,
    /// シャットダウン時に全接続を閉じるため
    message_pusher: Arc<dyn MessagePusher>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        apply_operation_usecase: Arc<ApplyOperationUseCase>,
        create_room_usecase: Arc<CreateRoomUseCase>,
        origin_id_factory: OriginIdFactory,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            join_room_usecase,
            leave_room_usecase,
            apply_operation_usecase,
            create_room_usecase,
            origin_id_factory,
            message_pusher,
        }
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Room sync server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?code=<access code>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Once `shutdown` resolves, new connections are refused and every open
    /// connection is asked to close, whether it has joined a room yet or not.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stopping, shutdown_rx) = watch::channel(false);
        let app_state = Arc::new(AppState {
            join_room_usecase: self.join_room_usecase,
            leave_room_usecase: self.leave_room_usecase,
            apply_operation_usecase: self.apply_operation_usecase,
            create_room_usecase: self.create_room_usecase,
            origin_id_factory: self.origin_id_factory,
            shutdown: shutdown_rx,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", post(create_room))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let message_pusher = self.message_pusher;
        let shutdown = async move {
            shutdown.await;
            // sessions that have not joined yet watch this flag
            stopping.send_replace(true);
            message_pusher.close_all().await;
        };

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
