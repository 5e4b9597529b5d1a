//! Domain entities: Room and its authoritative state.

use serde::Serialize;

use super::{
    error::RepositoryError,
    operation::{CharaDraft, MessageDraft, MessageEdit, MessageKind},
    value_object::{
        AccessCode, CharaColor, CharaId, CharaName, IdFactory, ImageUrl, MessageContent,
        MessageId, OriginId, RoomId, RoomTitle, Timestamp,
    },
};

/// Body of a stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Narrator {
        content: MessageContent,
    },
    Ooc {
        content: MessageContent,
    },
    Chara {
        content: MessageContent,
        #[serde(rename = "charaId")]
        chara_id: CharaId,
    },
    Image {
        url: ImageUrl,
    },
}

impl MessageBody {
    fn content_mut(&mut self) -> Option<&mut MessageContent> {
        match self {
            Self::Narrator { content } | Self::Ooc { content } | Self::Chara { content, .. } => {
                Some(content)
            }
            Self::Image { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub body: MessageBody,
    pub origin_id: OriginId,
    pub created_at: Timestamp,
    pub edited_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chara {
    pub id: CharaId,
    pub name: CharaName,
    pub color: CharaColor,
}

/// Read-only view of a room pushed to joining connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub title: RoomTitle,
    pub messages: Vec<Message>,
    pub charas: Vec<Chara>,
    /// Revision of the last change contained in the snapshot
    pub revision: u64,
}

/// Result of resolving an access code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoom {
    pub room_id: RoomId,
    pub snapshot: RoomSnapshot,
}

/// A roleplay room with its messages and characters, in insertion order
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub access_code: AccessCode,
    pub title: RoomTitle,
    pub messages: Vec<Message>,
    pub charas: Vec<Chara>,
    revision: u64,
}

impl Room {
    pub fn new(id: RoomId, access_code: AccessCode, title: RoomTitle) -> Self {
        Self {
            id,
            access_code,
            title,
            messages: Vec::new(),
            charas: Vec::new(),
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            title: self.title.clone(),
            messages: self.messages.clone(),
            charas: self.charas.clone(),
            revision: self.revision,
        }
    }

    /// Number of changes applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Count one applied change and return its revision.
    pub fn record_change(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Append a text message. Character messages must reference a character of this room.
    pub fn add_message(
        &mut self,
        draft: MessageDraft,
        origin_id: OriginId,
        now: Timestamp,
    ) -> Result<Message, RepositoryError> {
        let body = match draft.kind {
            MessageKind::Narrator => MessageBody::Narrator {
                content: draft.content,
            },
            MessageKind::Ooc => MessageBody::Ooc {
                content: draft.content,
            },
            MessageKind::Chara(chara_id) => {
                if !self.charas.iter().any(|c| c.id == chara_id) {
                    return Err(RepositoryError::CharaNotFound(chara_id.into_string()));
                }
                MessageBody::Chara {
                    content: draft.content,
                    chara_id,
                }
            }
        };
        Ok(self.push_message(body, origin_id, now))
    }

    pub fn add_image(&mut self, url: ImageUrl, origin_id: OriginId, now: Timestamp) -> Message {
        self.push_message(MessageBody::Image { url }, origin_id, now)
    }

    /// Replace the content of a text message. Only the message's origin may edit it.
    pub fn edit_message(
        &mut self,
        edit: MessageEdit,
        origin_id: &OriginId,
        now: Timestamp,
    ) -> Result<Message, RepositoryError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == edit.id)
            .ok_or_else(|| RepositoryError::MessageNotFound(edit.id.as_str().to_string()))?;

        if &message.origin_id != origin_id {
            return Err(RepositoryError::NotMessageAuthor);
        }
        let content = message
            .body
            .content_mut()
            .ok_or(RepositoryError::MessageNotEditable)?;
        *content = edit.content;
        message.edited_at = Some(now);

        Ok(message.clone())
    }

    pub fn add_chara(&mut self, draft: CharaDraft) -> Chara {
        let chara = Chara {
            id: IdFactory::chara_id(),
            name: draft.name,
            color: draft.color,
        };
        self.charas.push(chara.clone());
        chara
    }

    fn push_message(&mut self, body: MessageBody, origin_id: OriginId, now: Timestamp) -> Message {
        let message = Message {
            id: IdFactory::message_id(),
            body,
            origin_id,
            created_at: now,
            edited_at: None,
        };
        self.messages.push(message.clone());
        message
    }
}
