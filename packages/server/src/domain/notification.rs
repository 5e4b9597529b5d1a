//! Mutation notifications emitted by the room store after a change is applied.

use super::{
    entity::{Chara, Message},
    value_object::{ConnectionId, RoomId},
};

/// Kind of a mutation notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    MessageAdded,
    MessageEdited,
    CharaAdded,
}

/// Resulting data of an applied mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A text or image message was appended
    MessageAdded(Message),
    /// A message's content was replaced; carries the updated message
    MessageEdited(Message),
    CharaAdded(Chara),
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::MessageAdded(_) => MutationKind::MessageAdded,
            Self::MessageEdited(_) => MutationKind::MessageEdited,
            Self::CharaAdded(_) => MutationKind::CharaAdded,
        }
    }
}

/// Notification that a mutation requested by `origin` was applied to `room_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationNotification {
    pub room_id: RoomId,
    pub origin: ConnectionId,
    /// Room revision reached by applying the mutation
    pub revision: u64,
    pub mutation: Mutation,
}
