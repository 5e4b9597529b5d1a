//! Domain layer: value objects, entities, operations, session state machine
//! and the traits implemented by the infrastructure layer.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod notification;
pub mod operation;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::{Chara, Message, MessageBody, ResolvedRoom, Room, RoomSnapshot};
pub use error::{MessagePushError, RepositoryError, SessionStateError, ValueObjectError};
pub use message_pusher::{MessagePusher, PushMessage, PusherChannel};
pub use notification::{Mutation, MutationKind, MutationNotification};
pub use operation::{
    CharaDraft, MessageDraft, MessageEdit, MessageKind, Operation, OperationKind,
    OperationOutput,
};
pub use repository::{RoomResolver, RoomStore};
#[cfg(test)]
pub use repository::{MockRoomResolver, MockRoomStore};
pub use session::{ConnectionSession, SessionState};
pub use value_object::{
    AccessCode, CharaColor, CharaId, CharaName, ConnectionId, IdFactory, ImageUrl,
    MessageContent, MessageId, OriginId, RoomId, RoomTitle, Timestamp,
};
