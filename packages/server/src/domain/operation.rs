//! Inbound operations and their produced data.

use std::fmt;

use super::{
    entity::{Chara, Message},
    value_object::{CharaColor, CharaId, CharaName, ImageUrl, MessageContent, MessageId},
};

/// Kind of a text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Narrator,
    Ooc,
    Chara(CharaId),
}

/// Validated payload of `add-message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub kind: MessageKind,
    pub content: MessageContent,
}

/// Validated payload of `edit-message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEdit {
    pub id: MessageId,
    pub content: MessageContent,
}

/// Validated payload of `add-character`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharaDraft {
    pub name: CharaName,
    pub color: CharaColor,
}

/// One inbound request to mutate room state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AddMessage(MessageDraft),
    EditMessage(MessageEdit),
    AddImage(ImageUrl),
    AddCharacter(CharaDraft),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AddMessage(_) => OperationKind::AddMessage,
            Self::EditMessage(_) => OperationKind::EditMessage,
            Self::AddImage(_) => OperationKind::AddImage,
            Self::AddCharacter(_) => OperationKind::AddCharacter,
        }
    }
}

/// Type tag of an operation as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    AddMessage,
    EditMessage,
    AddImage,
    AddCharacter,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        Self::AddMessage,
        Self::EditMessage,
        Self::AddImage,
        Self::AddCharacter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddMessage => "add-message",
            Self::EditMessage => "edit-message",
            Self::AddImage => "add-image",
            Self::AddCharacter => "add-character",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data produced by a successfully applied operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    Message(Message),
    Chara(Chara),
}
