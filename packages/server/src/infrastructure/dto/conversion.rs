//! Conversion logic between DTOs and domain entities.

use rpsync_shared::time::timestamp_to_rfc3339;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    Chara, CharaColor, CharaDraft, CharaId, CharaName, ImageUrl, Message, MessageContent,
    MessageDraft, MessageEdit, MessageId, MessageKind, Mutation, Operation, OperationKind,
    OperationOutput, RoomSnapshot, ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

/// Why an inbound frame could not be turned into an `Operation`
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown operation type '{0}'")]
    UnknownType(String),

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid payload: {0}")]
    Invalid(#[from] ValueObjectError),
}

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::AddMessagePayload> for MessageDraft {
    type Error = ValueObjectError;

    fn try_from(payload: dto::AddMessagePayload) -> Result<Self, Self::Error> {
        let kind = match payload.kind {
            dto::MessageKindDto::Narrator => MessageKind::Narrator,
            dto::MessageKindDto::Ooc => MessageKind::Ooc,
            dto::MessageKindDto::Chara => {
                let chara_id = payload.chara_id.ok_or(ValueObjectError::Empty("CharaId"))?;
                MessageKind::Chara(CharaId::new(chara_id)?)
            }
        };
        Ok(Self {
            kind,
            content: MessageContent::new(payload.content)?,
        })
    }
}

impl TryFrom<dto::EditMessagePayload> for MessageEdit {
    type Error = ValueObjectError;

    fn try_from(payload: dto::EditMessagePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(payload.id)?,
            content: MessageContent::new(payload.content)?,
        })
    }
}

impl TryFrom<dto::AddCharacterPayload> for CharaDraft {
    type Error = ValueObjectError;

    fn try_from(payload: dto::AddCharacterPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            name: CharaName::new(payload.name)?,
            color: CharaColor::new(payload.color)?,
        })
    }
}

/// Decode the payload of an inbound frame according to its type tag.
pub fn decode_operation(frame: &dto::OperationFrame) -> Result<Operation, DecodeError> {
    let kind = OperationKind::parse(&frame.r#type)
        .ok_or_else(|| DecodeError::UnknownType(frame.r#type.clone()))?;
    let payload = frame.payload.clone();

    let operation = match kind {
        OperationKind::AddMessage => {
            let payload: dto::AddMessagePayload = serde_json::from_value(payload)?;
            Operation::AddMessage(payload.try_into()?)
        }
        OperationKind::EditMessage => {
            let payload: dto::EditMessagePayload = serde_json::from_value(payload)?;
            Operation::EditMessage(payload.try_into()?)
        }
        OperationKind::AddImage => {
            let url: String = serde_json::from_value(payload)?;
            Operation::AddImage(ImageUrl::new(url)?)
        }
        OperationKind::AddCharacter => {
            let payload: dto::AddCharacterPayload = serde_json::from_value(payload)?;
            Operation::AddCharacter(payload.try_into()?)
        }
    };
    Ok(operation)
}

// ========================================
// Domain → DTO
// ========================================

impl From<Message> for dto::MessageDto {
    fn from(model: Message) -> Self {
        Self {
            id: model.id.into_string(),
            body: model.body,
            origin_id: model.origin_id.into_string(),
            timestamp: timestamp_to_rfc3339(model.created_at.value()),
            edited: model.edited_at.map(|t| timestamp_to_rfc3339(t.value())),
        }
    }
}

impl From<Chara> for dto::CharaDto {
    fn from(model: Chara) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name.as_str().to_string(),
            color: model.color.as_str().to_string(),
        }
    }
}

impl From<RoomSnapshot> for dto::RoomSnapshotDto {
    fn from(model: RoomSnapshot) -> Self {
        Self {
            title: model.title.as_str().to_string(),
            msgs: model.messages.into_iter().map(Into::into).collect(),
            charas: model.charas.into_iter().map(Into::into).collect(),
        }
    }
}

/// Data carried by a successful ack
pub fn output_to_value(output: OperationOutput) -> serde_json::Result<Value> {
    match output {
        OperationOutput::Message(message) => serde_json::to_value(dto::MessageDto::from(message)),
        OperationOutput::Chara(chara) => serde_json::to_value(dto::CharaDto::from(chara)),
    }
}

/// Broadcast frame for a mutation notification
pub fn encode_mutation(mutation: &Mutation) -> serde_json::Result<String> {
    let frame = match mutation.clone() {
        Mutation::MessageAdded(message) => dto::ServerFrame::AddMessage {
            data: message.into(),
        },
        Mutation::MessageEdited(message) => dto::ServerFrame::EditMessage {
            data: dto::EditedMessageDto {
                id: message.id.as_str().to_string(),
                msg: message.into(),
            },
        },
        Mutation::CharaAdded(chara) => dto::ServerFrame::AddCharacter { data: chara.into() },
    };
    serde_json::to_string(&frame)
}
