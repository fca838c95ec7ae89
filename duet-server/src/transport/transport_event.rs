use crate::transport::RelayChannel;
use bytes::Bytes;
use duet_core::IceCandidate;
use std::sync::Arc;

/// Callbacks of one negotiator, turned into events for its handshake routine.
pub enum TransportEvent {
    /// A local candidate was discovered and must reach the other side.
    CandidateGenerated(IceCandidate),

    /// The remote end created the relay channel (answering side only).
    ChannelReceived(Arc<dyn RelayChannel>),

    /// The relay channel reached the open ready-state.
    ChannelOpen,

    /// Raw payload that arrived over the relay channel.
    ChannelMessage(Bytes),

    ChannelClosed,

    /// The underlying connection failed or was closed.
    Disconnected,
}
