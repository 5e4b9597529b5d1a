//! Connection session driver.
//!
//! Owns one WebSocket connection from upgrade to close:
//! resolve the access code, join the room (or reject), feed inbound frames
//! into the operation pipeline and leave the room on disconnect.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    FutureExt,
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
};

use crate::{
    domain::{
        ConnectionId, ConnectionSession, IdFactory, OriginId, PushMessage, PusherChannel, RoomId,
    },
    infrastructure::dto::{
        conversion::decode_operation,
        websocket::{OperationFrame, RoomErrorDto, ServerFrame},
    },
    ui::{
        pipeline::{Completion, Gate, OperationPipeline},
        state::AppState,
    },
    usecase::JoinRoomError,
};

/// Drive one connection until it closes.
pub async fn run_session(
    socket: WebSocket,
    state: Arc<AppState>,
    access_code: String,
    origin_id: OriginId,
) {
    let connection_id = IdFactory::connection_id();
    let mut session = ConnectionSession::new(connection_id.clone(), origin_id.clone());
    tracing::info!(
        "Connection '{}' opened (origin '{}', code '{}')",
        connection_id,
        origin_id,
        access_code
    );

    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut send_task = pusher_loop(rx, sender);

    if let Err(e) = session.begin_resolving() {
        tracing::error!("Connection '{}': {}", connection_id, e);
        send_task.abort();
        return;
    }
    let session = Arc::new(Mutex::new(session));

    // resolution runs even if the client never sends an operation
    let gate = open_gate(state.clone(), session.clone(), access_code, tx.clone());
    tokio::spawn(gate.clone());

    let (pipeline, _dispatcher) = OperationPipeline::spawn(
        gate,
        connection_id.clone(),
        origin_id,
        state.apply_operation_usecase.clone(),
    );
    let closer = tx.clone();
    let mut recv_task = receiver_loop(receiver, pipeline, tx, connection_id.clone());

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
        _ = server_stopping(state.shutdown.clone()) => {
            tracing::info!("Connection '{}' closed by server shutdown", connection_id);
            let _ = closer.send(PushMessage::Close);
            let _ = (&mut send_task).await;
            recv_task.abort();
        }
    };

    let joined = session.lock().await.close();
    state.leave_room_usecase.execute(&connection_id).await;
    match joined {
        Some(room_id) => tracing::info!("Connection '{}' left room '{}'", connection_id, room_id),
        None => tracing::info!("Connection '{}' closed", connection_id),
    }
}

/// Resolves once the server starts shutting down, including when it already has.
async fn server_stopping(mut shutdown: watch::Receiver<bool>) {
    let stopping = shutdown.wait_for(|stopping| *stopping).await.is_ok();
    if !stopping {
        // sender dropped without a shutdown
        std::future::pending::<()>().await;
    }
}

/// Spawns a task that writes queued frames to the WebSocket sink.
///
/// Stops after a `PushMessage::Close` or when the sink fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<PushMessage>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                PushMessage::Text(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                PushMessage::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    })
}

/// Spawns a task that reads frames from the client and submits them to the pipeline.
fn receiver_loop(
    mut receiver: SplitStream<WebSocket>,
    pipeline: OperationPipeline,
    channel: PusherChannel,
    connection_id: ConnectionId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<OperationFrame>(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(
                                "Unreadable frame from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };
                    let completion = Completion::new(frame.ack, &channel);
                    pipeline.submit(decode_operation(&frame), completion);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    })
}

/// Resolve the access code and join the room; reject the session on failure.
fn open_gate(
    state: Arc<AppState>,
    session: Arc<Mutex<ConnectionSession>>,
    access_code: String,
    channel: PusherChannel,
) -> Gate {
    async move {
        let result = admit(&state, &session, &access_code, &channel).await;
        if let Err(e) = &result {
            reject(&session, &channel, e).await;
        }
        result
    }
    .boxed()
    .shared()
}

async fn admit(
    state: &AppState,
    session: &Mutex<ConnectionSession>,
    access_code: &str,
    channel: &PusherChannel,
) -> Result<RoomId, JoinRoomError> {
    let resolved = state.join_room_usecase.resolve(access_code).await?;
    let revision = resolved.snapshot.revision;
    let load_room = serde_json::to_string(&ServerFrame::LoadRoom {
        room: resolved.snapshot.into(),
    })
    .map_err(|e| JoinRoomError::JoinFailed(e.to_string()))?;

    // held across the join so a concurrent disconnect either sees Joined or
    // prevents the join
    let mut session = session.lock().await;
    if session.is_closed() {
        return Err(JoinRoomError::SessionClosed);
    }

    state
        .join_room_usecase
        .join(
            resolved.room_id.clone(),
            session.connection_id.clone(),
            channel.clone(),
            load_room,
            revision,
        )
        .await?;
    if let Err(e) = session.join(resolved.room_id.clone()) {
        state.leave_room_usecase.execute(&session.connection_id).await;
        return Err(JoinRoomError::JoinFailed(e.to_string()));
    }

    tracing::info!(
        "Connection '{}' joined room '{}'",
        session.connection_id,
        resolved.room_id
    );
    Ok(resolved.room_id)
}

async fn reject(
    session: &Mutex<ConnectionSession>,
    channel: &PusherChannel,
    error: &JoinRoomError,
) {
    let mut session = session.lock().await;
    // already closed: nobody to tell
    if session.reject().is_err() {
        return;
    }
    tracing::warn!("Connection '{}' rejected: {}", session.connection_id, error);

    let frame = ServerFrame::RoomError {
        error: RoomErrorDto {
            code: room_error_code(error),
            message: error.to_string(),
        },
    };
    match serde_json::to_string(&frame) {
        Ok(json) => {
            let _ = channel.send(PushMessage::Text(json));
        }
        Err(e) => tracing::error!("Failed to encode room-error: {}", e),
    }
    let _ = channel.send(PushMessage::Close);
}

fn room_error_code(error: &JoinRoomError) -> &'static str {
    match error {
        JoinRoomError::RoomNotFound => "ROOM_NOT_FOUND",
        JoinRoomError::SessionClosed => "SESSION_CLOSED",
        JoinRoomError::JoinFailed(_) => "JOIN_FAILED",
    }
}
