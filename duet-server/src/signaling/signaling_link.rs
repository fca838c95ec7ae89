use duet_core::{PeerId, SignalMessage};
use tokio::sync::mpsc;
use tracing::error;

/// Outbound half of one signaling connection. Cloning shares the same socket.
#[derive(Debug, Clone)]
pub struct SignalingLink {
    peer_id: PeerId,
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingLink {
    pub fn new(peer_id: PeerId, tx: mpsc::UnboundedSender<SignalMessage>) -> Self {
        Self { peer_id, tx }
    }

    /// A link with a fresh identity, plus the queue the socket writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(PeerId::new(), tx), rx)
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn is_same(&self, other: &SignalingLink) -> bool {
        self.peer_id == other.peer_id
    }

    /// Best-effort: a closed socket is logged and the message dropped.
    pub fn send(&self, msg: SignalMessage) {
        let kind = msg.kind();
        if let Err(e) = self.tx.send(msg) {
            error!(
                "Failed to send '{}' to connection {}: {}",
                kind, self.peer_id, e
            );
        }
    }
}
