use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Every `type` value the signaling protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Register,
    Registered,
    Create,
    Join,
    Status,
    Error,
    PeerDisconnect,
    Chat,
    FileStart,
    FileChunk,
    FileEnd,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Register => "register",
            MessageKind::Registered => "registered",
            MessageKind::Create => "create",
            MessageKind::Join => "join",
            MessageKind::Status => "status",
            MessageKind::Error => "error",
            MessageKind::PeerDisconnect => "peer-disconnect",
            MessageKind::Chat => "chat",
            MessageKind::FileStart => "file-start",
            MessageKind::FileChunk => "file-chunk",
            MessageKind::FileEnd => "file-end",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "register" => MessageKind::Register,
            "registered" => MessageKind::Registered,
            "create" => MessageKind::Create,
            "join" => MessageKind::Join,
            "status" => MessageKind::Status,
            "error" => MessageKind::Error,
            "peer-disconnect" => MessageKind::PeerDisconnect,
            "chat" => MessageKind::Chat,
            "file-start" => MessageKind::FileStart,
            "file-chunk" => MessageKind::FileChunk,
            "file-end" => MessageKind::FileEnd,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application traffic kinds that are carried over the relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayKind {
    Chat,
    FileStart,
    FileChunk,
    FileEnd,
}

impl From<RelayKind> for MessageKind {
    fn from(kind: RelayKind) -> Self {
        match kind {
            RelayKind::Chat => MessageKind::Chat,
            RelayKind::FileStart => MessageKind::FileStart,
            RelayKind::FileChunk => MessageKind::FileChunk,
            RelayKind::FileEnd => MessageKind::FileEnd,
        }
    }
}

/// Body of a signaling message, keyed by its `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Register { name: String },
    Registered,
    Create,
    Join,
    Status(String),
    Error(String),
    PeerDisconnect(String),
    Relay { kind: RelayKind, content: Value },
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Register { .. } => MessageKind::Register,
            Payload::Registered => MessageKind::Registered,
            Payload::Create => MessageKind::Create,
            Payload::Join => MessageKind::Join,
            Payload::Status(_) => MessageKind::Status,
            Payload::Error(_) => MessageKind::Error,
            Payload::PeerDisconnect(_) => MessageKind::PeerDisconnect,
            Payload::Relay { kind, .. } => MessageKind::from(*kind),
        }
    }

    fn decode(kind: MessageKind, payload: Value) -> Self {
        match kind {
            MessageKind::Register => Payload::Register {
                name: text_of(payload),
            },
            MessageKind::Registered => Payload::Registered,
            MessageKind::Create => Payload::Create,
            MessageKind::Join => Payload::Join,
            MessageKind::Status => Payload::Status(text_of(payload)),
            MessageKind::Error => Payload::Error(text_of(payload)),
            MessageKind::PeerDisconnect => Payload::PeerDisconnect(text_of(payload)),
            MessageKind::Chat => relay(RelayKind::Chat, payload),
            MessageKind::FileStart => relay(RelayKind::FileStart, payload),
            MessageKind::FileChunk => relay(RelayKind::FileChunk, payload),
            MessageKind::FileEnd => relay(RelayKind::FileEnd, payload),
        }
    }

    fn encode(self) -> Value {
        match self {
            Payload::Register { name } => Value::String(name),
            Payload::Registered | Payload::Create | Payload::Join => Value::Null,
            Payload::Status(text) | Payload::Error(text) | Payload::PeerDisconnect(text) => {
                Value::String(text)
            }
            Payload::Relay { content, .. } => content,
        }
    }
}

fn relay(kind: RelayKind, content: Value) -> Payload {
    Payload::Relay { kind, content }
}

fn text_of(payload: Value) -> String {
    match payload {
        Value::String(s) => s,
        _ => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported message type '{0}'")]
    UnknownType(String),
}

/// Shape of a message on the signaling socket and on the relay channel.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    payload: Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    room_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    sender: String,
}

/// The signaling wire unit: `{type, payload, roomId, sender}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage", into = "WireMessage")]
pub struct SignalMessage {
    pub payload: Payload,
    pub room_id: RoomId,
    pub sender: String,
}

impl SignalMessage {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            room_id: RoomId::default(),
            sender: String::new(),
        }
    }

    pub fn in_room(mut self, room_id: impl Into<RoomId>) -> Self {
        self.room_id = room_id.into();
        self
    }

    pub fn register(name: impl Into<String>) -> Self {
        Self::new(Payload::Register { name: name.into() })
    }

    pub fn registered() -> Self {
        Self::new(Payload::Registered)
    }

    pub fn create(room_id: impl Into<RoomId>) -> Self {
        Self::new(Payload::Create).in_room(room_id)
    }

    pub fn join(room_id: impl Into<RoomId>) -> Self {
        Self::new(Payload::Join).in_room(room_id)
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::new(Payload::Status(text.into()))
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Payload::Error(text.into()))
    }

    pub fn peer_disconnect(text: impl Into<String>) -> Self {
        Self::new(Payload::PeerDisconnect(text.into()))
    }

    pub fn relay(kind: RelayKind, content: Value) -> Self {
        Self::new(Payload::Relay { kind, content })
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// Decodes one message, keeping unknown types distinguishable from
    /// malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let wire: WireMessage = serde_json::from_str(text)?;
        Self::try_from(wire)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, DecodeError> {
        let wire: WireMessage = serde_json::from_slice(data)?;
        Self::try_from(wire)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireMessage::from(self.clone()))
    }
}

impl TryFrom<WireMessage> for SignalMessage {
    type Error = DecodeError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let kind = MessageKind::parse(&wire.kind).ok_or(DecodeError::UnknownType(wire.kind))?;

        Ok(Self {
            payload: Payload::decode(kind, wire.payload),
            room_id: RoomId(wire.room_id),
            sender: wire.sender,
        })
    }
}

impl From<SignalMessage> for WireMessage {
    fn from(msg: SignalMessage) -> Self {
        Self {
            kind: msg.kind().as_str().to_owned(),
            payload: msg.payload.encode(),
            room_id: msg.room_id.0,
            sender: msg.sender,
        }
    }
}
