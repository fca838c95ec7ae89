use crate::config::HandshakeConfig;
use crate::room::RoomRegistry;
use crate::signaling::{SignalingLink, SignalingSession};
use crate::transport::NegotiatorFactory;
use std::sync::Arc;

struct SignalingInner {
    registry: RoomRegistry,
    negotiators: Arc<dyn NegotiatorFactory>,
    handshake: HandshakeConfig,
}

/// Shared state behind every signaling connection of one server.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(
        registry: RoomRegistry,
        negotiators: Arc<dyn NegotiatorFactory>,
        handshake: HandshakeConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                registry,
                negotiators,
                handshake,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn negotiators(&self) -> Arc<dyn NegotiatorFactory> {
        self.inner.negotiators.clone()
    }

    pub fn handshake_config(&self) -> &HandshakeConfig {
        &self.inner.handshake
    }

    pub fn open_session(&self, link: SignalingLink) -> SignalingSession {
        SignalingSession::new(self.clone(), link)
    }
}
