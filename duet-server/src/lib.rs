pub mod config;
pub mod error;
pub mod handshake;
pub mod room;
pub mod server;
pub mod signaling;
pub mod transport;

pub use config::{HandshakeConfig, ServerConfig};
pub use error::{HandshakeError, HandshakeStage, RoomError};
pub use room::{Room, RoomRegistry, SideChannels};
pub use server::{router, serve};
pub use signaling::{
    SessionState, SignalingLink, SignalingService, SignalingSession, ws_handler,
};
pub use transport::{
    ConnectionWrapper, Negotiator, NegotiatorFactory, RelayChannel, RtcNegotiatorFactory,
    TransportConfig, TransportEvent,
};
