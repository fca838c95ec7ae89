use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use duet_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Ordered message channel established by a negotiator.
#[async_trait]
pub trait RelayChannel: Send + Sync {
    fn label(&self) -> String;

    /// True only while the channel is in the open ready-state.
    fn is_open(&self) -> bool;

    async fn send_text(&self, text: String) -> Result<()>;
}

/// One side of a transport-level connection: description and candidate
/// exchange plus the relay channel.
#[async_trait]
pub trait Negotiator: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Creates the relay channel locally. Open, message and close callbacks
    /// are reported on the negotiator's event channel.
    async fn create_relay_channel(&self, label: &str) -> Result<Arc<dyn RelayChannel>>;

    async fn close(&self) -> Result<()>;
}

/// Builds negotiators. Every callback of the returned negotiator is delivered
/// as a [`TransportEvent`] on `events`.
#[async_trait]
pub trait NegotiatorFactory: Send + Sync {
    async fn create(&self, events: mpsc::Sender<TransportEvent>) -> Result<Arc<dyn Negotiator>>;
}
