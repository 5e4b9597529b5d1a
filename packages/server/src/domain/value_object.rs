//! Value Objects
//!
//! 識別子と検証済みの入力値を表す Value Object を定義します。
//! 生成時に検証を行うため、一度生成された値は常に不変条件を満たします。

use std::fmt;

use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use super::error::ValueObjectError;

const ACCESS_CODE_MAX_LEN: usize = 64;
const MESSAGE_CONTENT_MAX_LEN: usize = 10_000;
const CHARA_NAME_MAX_LEN: usize = 30;
const ROOM_TITLE_MAX_LEN: usize = 60;
const IMAGE_URL_MAX_LEN: usize = 512;

/// Alphabet used for generated access codes (no look-alike characters)
const ACCESS_CODE_ALPHABET: &[u8] = b"abcdefhjknpstxyz23456789";
const ACCESS_CODE_GENERATED_LEN: usize = 20;

/// Declares an opaque string identifier with the common accessors.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                if value.is_empty() {
                    return Err(ValueObjectError::Empty(stringify!($name)));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Opaque room identity, owned by the room registry
    RoomId
);
string_id!(
    /// Identity of one physical connection; also the broadcast exclusion key
    ConnectionId
);
string_id!(
    /// Anonymized identifier derived from a connection's network origin
    OriginId
);
string_id!(MessageId);
string_id!(CharaId);

impl OriginId {
    /// Lower-case hex of `digest`, cut to `len` characters.
    pub(crate) fn from_digest(digest: &[u8], len: usize) -> Self {
        let mut hex: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
        hex.truncate(len);
        Self(hex)
    }
}

/// Generates fresh identifiers
pub struct IdFactory;

impl IdFactory {
    pub fn room_id() -> RoomId {
        RoomId(format!("rp_{}", Uuid::new_v4().simple()))
    }

    pub fn connection_id() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }

    pub fn message_id() -> MessageId {
        MessageId(Uuid::new_v4().simple().to_string())
    }

    pub fn chara_id() -> CharaId {
        CharaId(Uuid::new_v4().simple().to_string())
    }
}

/// Stable external key of a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    /// Create an access code. Allowed characters are `[-0-9a-zA-Z]`.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty("AccessCode"));
        }
        if value.len() > ACCESS_CODE_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "AccessCode",
                max: ACCESS_CODE_MAX_LEN,
            });
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ValueObjectError::InvalidFormat("AccessCode"));
        }
        Ok(Self(value))
    }

    /// Generate a random access code from the unambiguous alphabet.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..ACCESS_CODE_GENERATED_LEN)
            .map(|_| {
                let index = rng.random_range(0..ACCESS_CODE_ALPHABET.len());
                ACCESS_CODE_ALPHABET[index] as char
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for AccessCode {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text content of a narrator, OOC or character message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("MessageContent"));
        }
        if value.chars().count() > MESSAGE_CONTENT_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "MessageContent",
                max: MESSAGE_CONTENT_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// http(s) URL of an image posted to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let value = value.trim().to_string();
        if value.len() > IMAGE_URL_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "ImageUrl",
                max: IMAGE_URL_MAX_LEN,
            });
        }
        let rest = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"));
        match rest {
            Some(rest) if !rest.is_empty() && !rest.contains(char::is_whitespace) => {
                Ok(Self(value))
            }
            _ => Err(ValueObjectError::InvalidFormat("ImageUrl")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImageUrl {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CharaName(String);

impl CharaName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ValueObjectError::Empty("CharaName"));
        }
        if value.chars().count() > CHARA_NAME_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "CharaName",
                max: CHARA_NAME_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CharaName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// `#rrggbb` color, normalized to lower case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CharaColor(String);

impl CharaColor {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(ValueObjectError::InvalidFormat("CharaColor"));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CharaColor {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoomTitle(String);

impl RoomTitle {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ValueObjectError::Empty("RoomTitle"));
        }
        if value.chars().count() > ROOM_TITLE_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "RoomTitle",
                max: ROOM_TITLE_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomTitle {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
