use crate::error::RoomError;
use crate::handshake;
use crate::room::Room;
use crate::signaling::{SignalingLink, SignalingService};
use duet_core::{MessageKind, Payload, RelayKind, RoomId, Side, SignalMessage};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const ROOM_CREATED_STATUS: &str = "Room created. Waiting for the other peer...";
pub const ROOM_JOINED_STATUS: &str = "Joined room. Establishing connection...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Registered,
    InRoom { room_id: RoomId, side: Side },
    Terminated,
}

/// Per-connection handler: tracks the display name and room role of one
/// signaling connection and dispatches its control messages.
pub struct SignalingSession {
    service: SignalingService,
    link: SignalingLink,
    name: String,
    registered: bool,
    membership: Option<(RoomId, Side)>,
    terminated: bool,
}

impl SignalingSession {
    pub fn new(service: SignalingService, link: SignalingLink) -> Self {
        Self {
            service,
            link,
            name: String::new(),
            registered: false,
            membership: None,
            terminated: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.terminated {
            return SessionState::Terminated;
        }
        match &self.membership {
            Some((room_id, side)) => SessionState::InRoom {
                room_id: room_id.clone(),
                side: *side,
            },
            None if self.registered => SessionState::Registered,
            None => SessionState::Unregistered,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &SignalingLink {
        &self.link
    }

    /// Decodes and dispatches one text frame. Undecodable frames are answered
    /// with an `error` message and otherwise ignored.
    pub async fn handle_text(&mut self, text: &str) {
        match SignalMessage::from_json(text) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => {
                warn!("Invalid message from {}: {}", self.link.peer_id(), e);
                self.link.send(SignalMessage::error(e.to_string()));
            }
        }
    }

    pub async fn handle(&mut self, msg: SignalMessage) {
        if self.terminated {
            return;
        }

        let SignalMessage {
            payload, room_id, ..
        } = msg;

        match payload {
            Payload::Register { name } => self.register(name),
            Payload::Create => self.create(room_id),
            Payload::Join => self.join(room_id),
            Payload::Relay { kind, content } => self.relay(kind, content, room_id).await,
            other => {
                warn!(
                    "Connection {} sent server-only message '{}'",
                    self.link.peer_id(),
                    other.kind()
                );
                self.link.send(SignalMessage::error(format!(
                    "Unsupported message type '{}'",
                    other.kind()
                )));
            }
        }
    }

    fn register(&mut self, name: String) {
        if name.is_empty() {
            debug!("Ignoring empty registration from {}", self.link.peer_id());
            return;
        }

        info!("User {} registered on {}", name, self.link.peer_id());
        self.name = name;
        self.registered = true;
        self.link.send(SignalMessage::registered());
    }

    fn create(&mut self, room_id: RoomId) {
        if let Err(e) = self.check_can_enter(&room_id) {
            self.reject(e);
            return;
        }

        let registry = self.service.registry();
        let (room, channels) = match registry.create(room_id.clone(), self.link.clone()) {
            Ok(created) => created,
            Err(e) => {
                self.reject(e);
                return;
            }
        };

        self.membership = Some((room_id, Side::A));
        self.link.send(SignalMessage::status(ROOM_CREATED_STATUS));

        handshake::spawn_side(
            room,
            Side::A,
            channels,
            self.service.negotiators(),
            self.service.handshake_config().clone(),
        );
    }

    fn join(&mut self, room_id: RoomId) {
        if let Err(e) = self.check_can_enter(&room_id) {
            self.reject(e);
            return;
        }

        let Some(room) = self.service.registry().lookup(&room_id) else {
            self.reject(RoomError::NotFound(room_id));
            return;
        };
        let channels = match room.join(self.link.clone()) {
            Ok(channels) => channels,
            Err(e) => {
                self.reject(e);
                return;
            }
        };

        self.membership = Some((room_id, Side::B));
        self.link.send(SignalMessage::status(ROOM_JOINED_STATUS));
        if let Some(owner) = room.link(Side::A) {
            owner.send(SignalMessage::status(format!(
                "{} joined. Establishing connection...",
                self.name
            )));
        }

        handshake::spawn_side(
            room,
            Side::B,
            channels,
            self.service.negotiators(),
            self.service.handshake_config().clone(),
        );
    }

    fn check_can_enter(&self, room_id: &RoomId) -> Result<(), RoomError> {
        if let Some((current, _)) = &self.membership {
            return Err(RoomError::AlreadyInRoom(current.clone()));
        }
        if room_id.is_empty() {
            return Err(RoomError::MissingId);
        }
        Ok(())
    }

    fn reject(&self, e: RoomError) {
        warn!("Rejected request from {}: {}", self.link.peer_id(), e);
        self.link.send(SignalMessage::error(e.user_message()));
    }

    /// The room this connection belongs to, if it is still the registered one.
    fn current_room(&self) -> Option<(Arc<Room>, Side)> {
        let (room_id, side) = self.membership.as_ref()?;
        let room = self.service.registry().lookup(room_id)?;
        (room.side_of(self.link.peer_id()) == Some(*side)).then_some((room, *side))
    }

    /// Stamps the sender and writes the message to this connection's own
    /// relay channel when that channel is open; drops it otherwise.
    async fn relay(&mut self, kind: RelayKind, content: Value, room_id: RoomId) {
        let Some((room, side)) = self.current_room() else {
            debug!(
                "Dropping '{}' from {}: not in a live room",
                MessageKind::from(kind),
                self.link.peer_id()
            );
            return;
        };

        let mut msg = SignalMessage::relay(kind, content).in_room(room_id);
        msg.sender = self.name.clone();
        let text = match msg.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize relay message: {}", e);
                return;
            }
        };

        let Some(channel) = room.relay_channel(side) else {
            debug!("Relay channel of room '{}' not ready; dropped", room.id());
            return;
        };
        if !channel.is_open() {
            debug!("Relay channel of room '{}' not open; dropped", room.id());
            return;
        }
        if let Err(e) = channel.send_text(text).await {
            error!("Failed to relay message in room '{}': {:?}", room.id(), e);
        }
    }

    /// Ends the session: tells the other participant and deletes the room.
    /// Safe to call more than once.
    pub fn cleanup(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        let Some((room, _)) = self.current_room() else {
            return;
        };
        self.membership = None;

        if !self.service.registry().delete_room(&room) {
            return;
        }
        if let Some(other) = room.other_link(self.link.peer_id()) {
            other.send(SignalMessage::peer_disconnect(format!(
                "{} has disconnected.",
                self.name
            )));
        }
        info!("Connection {} left room '{}'", self.link.peer_id(), room.id());
    }
}
