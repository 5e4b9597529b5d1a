//! Per-session operation pipeline.
//!
//! Every inbound operation passes the same fixed chain:
//!
//! 1. gate: wait until the session has joined its room
//! 2. observability: record the operation type and payload
//! 3. acknowledgment bridge: turn the handler result into one completion
//!
//! Operations are queued and drained by a single dispatcher task, so handler
//! calls start and finish in arrival order.

use std::{fmt::Display, sync::Arc};

use futures_util::future::{BoxFuture, Shared};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{
        ConnectionId, Operation, OperationOutput, OriginId, PushMessage, PusherChannel, RoomId,
    },
    infrastructure::dto::{
        conversion::{DecodeError, output_to_value},
        websocket::ServerFrame,
    },
    usecase::{ApplyOperationUseCase, JoinRoomError, OperationContext},
};

/// Resolves once the session has joined its room (or failed to)
pub type Gate = Shared<BoxFuture<'static, Result<RoomId, JoinRoomError>>>;

/// Completion handle of one operation
///
/// Built from the `ack` id of the inbound frame. A frame without one gets a
/// discard handle.
#[derive(Debug)]
pub enum Completion {
    Reply { ack: u64, channel: PusherChannel },
    Discard,
}

impl Completion {
    pub fn new(ack: Option<u64>, channel: &PusherChannel) -> Self {
        match ack {
            Some(ack) => Self::Reply {
                ack,
                channel: channel.clone(),
            },
            None => Self::Discard,
        }
    }

    pub fn succeed(self, output: OperationOutput) {
        match output_to_value(output) {
            Ok(data) => self.reply(true, Some(data), None),
            Err(e) => self.fail(format!("Failed to encode result: {}", e)),
        }
    }

    pub fn fail(self, error: impl Display) {
        self.reply(false, None, Some(error.to_string()));
    }

    fn reply(self, ok: bool, data: Option<serde_json::Value>, error: Option<String>) {
        let Self::Reply { ack, channel } = self else {
            return;
        };
        let frame = ServerFrame::Ack {
            ack,
            ok,
            data,
            error,
        };
        match serde_json::to_string(&frame) {
            // closed channel: the connection is gone, drop the ack
            Ok(json) => {
                let _ = channel.send(PushMessage::Text(json));
            }
            Err(e) => tracing::error!("Failed to encode ack {}: {}", ack, e),
        }
    }
}

struct Submission {
    operation: Result<Operation, DecodeError>,
    completion: Completion,
}

/// Entry point of the per-session pipeline
pub struct OperationPipeline {
    queue: mpsc::UnboundedSender<Submission>,
}

impl OperationPipeline {
    /// Start the dispatcher task.
    ///
    /// The task stops once the pipeline is dropped and every queued operation
    /// has been handled.
    pub fn spawn(
        gate: Gate,
        connection_id: ConnectionId,
        origin_id: OriginId,
        apply_operation_usecase: Arc<ApplyOperationUseCase>,
    ) -> (Self, JoinHandle<()>) {
        let (queue, submissions) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher {
            gate,
            connection_id,
            origin_id,
            apply_operation_usecase,
        };
        let handle = tokio::spawn(dispatcher.run(submissions));
        (Self { queue }, handle)
    }

    /// Queue one decoded frame. Decoding failures still pass the gate so that
    /// their failure ack keeps its place in the order.
    pub fn submit(&self, operation: Result<Operation, DecodeError>, completion: Completion) {
        let submission = Submission {
            operation,
            completion,
        };
        if let Err(mpsc::error::SendError(submission)) = self.queue.send(submission) {
            submission.completion.fail("Session is closed");
        }
    }
}

struct Dispatcher {
    gate: Gate,
    connection_id: ConnectionId,
    origin_id: OriginId,
    apply_operation_usecase: Arc<ApplyOperationUseCase>,
}

impl Dispatcher {
    async fn run(self, mut submissions: mpsc::UnboundedReceiver<Submission>) {
        while let Some(submission) = submissions.recv().await {
            self.dispatch(submission).await;
        }
        tracing::debug!("Dispatcher of '{}' stopped", self.connection_id);
    }

    async fn dispatch(&self, submission: Submission) {
        let Submission {
            operation,
            completion,
        } = submission;

        // 1. gate
        let room_id = match self.gate.clone().await {
            Ok(room_id) => room_id,
            Err(e) => {
                completion.fail(e);
                return;
            }
        };

        let operation = match operation {
            Ok(operation) => operation,
            Err(e) => {
                tracing::warn!("Invalid operation from '{}': {}", self.connection_id, e);
                completion.fail(e);
                return;
            }
        };

        // 2. observability
        tracing::info!(
            "Operation '{}' from '{}' in room '{}': {:?}",
            operation.kind(),
            self.connection_id,
            room_id,
            operation
        );

        // 3. acknowledgment bridge
        let kind = operation.kind();
        let ctx = OperationContext {
            room_id,
            connection_id: self.connection_id.clone(),
            origin_id: self.origin_id.clone(),
        };
        match self.apply_operation_usecase.execute(&ctx, operation).await {
            Ok(output) => completion.succeed(output),
            Err(e) => {
                tracing::error!(
                    "Operation '{}' from '{}' failed: {}",
                    kind,
                    self.connection_id,
                    e
                );
                completion.fail(e);
            }
        }
    }
}
