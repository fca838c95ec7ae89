mod negotiation;
mod peer;
mod room;
mod side;
mod signaling;

pub use negotiation::{IceCandidate, SdpKind, SessionDescription};
pub use peer::PeerId;
pub use room::RoomId;
pub use side::Side;
pub use signaling::{
    DecodeError, IceServerConfig, MessageKind, Payload, RelayKind, SignalMessage,
};
