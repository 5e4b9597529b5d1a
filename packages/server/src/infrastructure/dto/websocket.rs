//! WebSocket message DTOs.
//!
//! Every frame is a JSON object with a `type` tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::MessageBody;

// ========================================
// Client → Server
// ========================================

/// Envelope of one inbound operation
///
/// The payload is decoded in a second step so that a frame with a bad
/// payload can still be acknowledged through its `ack` id.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationFrame {
    pub r#type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub ack: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKindDto {
    #[default]
    Narrator,
    Ooc,
    Chara,
}

/// Payload of `add-message`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessagePayload {
    #[serde(default, rename = "type")]
    pub kind: MessageKindDto,
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default)]
    pub chara_id: Option<String>,
}

/// Payload of `edit-message`
#[derive(Debug, Clone, Deserialize)]
pub struct EditMessagePayload {
    pub id: String,
    #[serde(alias = "text")]
    pub content: String,
}

/// Payload of `add-character`
#[derive(Debug, Clone, Deserialize)]
pub struct AddCharacterPayload {
    pub name: String,
    pub color: String,
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub body: MessageBody,
    pub origin_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharaDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSnapshotDto {
    pub title: String,
    pub msgs: Vec<MessageDto>,
    pub charas: Vec<CharaDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomErrorDto {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditedMessageDto {
    pub id: String,
    pub msg: MessageDto,
}

/// Every frame the server sends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Snapshot sent once to a joining connection
    LoadRoom { room: RoomSnapshotDto },
    /// Resolution failure, followed by disconnect
    RoomError { error: RoomErrorDto },
    /// Direct reply to the originator of an operation
    Ack {
        ack: u64,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    AddMessage { data: MessageDto },
    EditMessage { data: EditedMessageDto },
    AddCharacter { data: CharaDto },
}
