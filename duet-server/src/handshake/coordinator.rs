use crate::config::HandshakeConfig;
use crate::error::{HandshakeError, HandshakeStage};
use crate::room::{Room, SideChannels};
use crate::signaling::SignalingLink;
use crate::transport::{Negotiator, NegotiatorFactory, TransportEvent};
use duet_core::{IceCandidate, SessionDescription, Side, SignalMessage};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{side_a, side_b};

pub const RELAY_CHANNEL_LABEL: &str = "chat";
pub const RELAY_OPEN_STATUS: &str = "Connection established! You can now chat.";
pub const SETUP_FAILED_ERROR: &str = "Connection setup failed";
const TRANSPORT_EVENT_BUFFER: usize = 256;

/// Everything one side's routine needs besides its channel ends.
pub(crate) struct HandshakeContext {
    pub room: Arc<Room>,
    pub side: Side,
    pub link: SignalingLink,
    pub factory: Arc<dyn NegotiatorFactory>,
    pub config: HandshakeConfig,
    pub cancel: CancellationToken,
}

/// Starts the handshake routine for `side` of `room` in the background.
pub fn spawn_side(
    room: Arc<Room>,
    side: Side,
    channels: SideChannels,
    factory: Arc<dyn NegotiatorFactory>,
    config: HandshakeConfig,
) {
    let Some(link) = room.link(side) else {
        warn!("Side {} of room '{}' has no participant", side, room.id());
        return;
    };

    let ctx = HandshakeContext {
        cancel: room.cancel_token(),
        room,
        side,
        link,
        factory,
        config,
    };

    tokio::spawn(async move {
        info!("Setting up side {} for room '{}'", ctx.side, ctx.room.id());

        let result = match ctx.side {
            Side::A => side_a::run(&ctx, channels).await,
            Side::B => side_b::run(&ctx, channels).await,
        };

        match result {
            Ok(()) => debug!("Side {} of room '{}' finished", ctx.side, ctx.room.id()),
            Err(e) if e.is_cancelled() => {
                debug!("Side {} of room '{}' stopped: {}", ctx.side, ctx.room.id(), e)
            }
            Err(e) => {
                error!(
                    "Handshake for side {} of room '{}' failed: {}",
                    ctx.side,
                    ctx.room.id(),
                    e
                );
                ctx.link.send(SignalMessage::error(SETUP_FAILED_ERROR));
            }
        }
    });
}

impl HandshakeContext {
    /// Creates this side's negotiator, records it on the room and starts the
    /// task that handles its callbacks.
    pub(crate) async fn start_negotiator(
        &self,
        candidates_out: mpsc::Sender<IceCandidate>,
    ) -> Result<Arc<dyn Negotiator>, HandshakeError> {
        let (events_tx, events_rx) = mpsc::channel(TRANSPORT_EVENT_BUFFER);
        // Awaited to completion so that every created negotiator gets closed.
        let negotiator = self.factory.create(events_tx).await?;
        self.room.set_negotiator(self.side, negotiator.clone());

        // Teardown may have run before the negotiator was recorded, in which
        // case the room never saw it.
        if self.room.is_closed() {
            if let Err(e) = negotiator.close().await {
                warn!(
                    "Failed to close negotiator of side {} in room '{}': {:?}",
                    self.side,
                    self.room.id(),
                    e
                );
            }
            return Err(HandshakeError::Cancelled);
        }

        tokio::spawn(pump_events(
            self.room.clone(),
            self.side,
            self.link.clone(),
            events_rx,
            candidates_out,
        ));

        Ok(negotiator)
    }

    /// Runs `fut` unless the room is torn down first.
    pub(crate) async fn cancellable<F: Future>(
        &self,
        fut: F,
    ) -> Result<F::Output, HandshakeError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(HandshakeError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Waits for the other side's description, bounded by the stage timeout.
    pub(crate) async fn receive(
        &self,
        stage: HandshakeStage,
        incoming: oneshot::Receiver<SessionDescription>,
    ) -> Result<SessionDescription, HandshakeError> {
        let timed = tokio::time::timeout(self.config.stage_timeout, incoming);
        match self.cancellable(timed).await? {
            Ok(Ok(desc)) => Ok(desc),
            // The publishing routine ended without publishing: either the
            // room was torn down or that side failed.
            Ok(Err(_)) if self.cancel.is_cancelled() => Err(HandshakeError::Cancelled),
            Ok(Err(_)) => Err(HandshakeError::PeerFailed(stage)),
            Err(_) => Err(HandshakeError::Timeout(stage)),
        }
    }

    /// Hands this side's description to the other routine.
    pub(crate) fn publish(
        &self,
        stage: HandshakeStage,
        publish: oneshot::Sender<SessionDescription>,
        desc: SessionDescription,
    ) -> Result<(), HandshakeError> {
        publish.send(desc).map_err(|_| {
            if self.cancel.is_cancelled() {
                HandshakeError::Cancelled
            } else {
                HandshakeError::PeerFailed(stage)
            }
        })
    }

    /// Applies the other side's candidates until the room is torn down.
    pub(crate) async fn drain_candidates(
        &self,
        negotiator: &Arc<dyn Negotiator>,
        mut candidates_in: mpsc::Receiver<IceCandidate>,
    ) {
        loop {
            let candidate = tokio::select! {
                _ = self.cancel.cancelled() => break,
                c = candidates_in.recv() => match c {
                    Some(c) => c,
                    None => break,
                },
            };

            debug!("Side {} of room '{}' applying candidate", self.side, self.room.id());
            if let Err(e) = negotiator.add_ice_candidate(candidate).await {
                warn!(
                    "Failed to add candidate on side {} of room '{}': {:?}",
                    self.side,
                    self.room.id(),
                    e
                );
            }
        }
    }
}

/// Handles one negotiator's callbacks: forwards candidates to the other side,
/// records a received relay channel, and bridges the relay channel to this
/// side's signaling link.
async fn pump_events(
    room: Arc<Room>,
    side: Side,
    link: SignalingLink,
    mut events: mpsc::Receiver<TransportEvent>,
    candidates_out: mpsc::Sender<IceCandidate>,
) {
    let cancel = room.cancel_token();

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            e = events.recv() => match e {
                Some(e) => e,
                None => break,
            },
        };

        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                // Waits for buffer space rather than dropping the candidate.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = candidates_out.send(candidate) => {
                        if res.is_err() {
                            debug!(
                                "Side {} of room '{}' no longer takes candidates",
                                side.other(),
                                room.id()
                            );
                        }
                    }
                }
            }

            TransportEvent::ChannelReceived(channel) => {
                info!(
                    "Side {} of room '{}' received relay channel '{}'",
                    side,
                    room.id(),
                    channel.label()
                );
                room.set_relay_channel(side, channel);
            }

            TransportEvent::ChannelOpen => {
                info!("Relay channel for side {} of room '{}' opened", side, room.id());
                link.send(SignalMessage::status(RELAY_OPEN_STATUS));
            }

            TransportEvent::ChannelMessage(data) => match SignalMessage::from_slice(&data) {
                Ok(msg) => {
                    debug!("Relaying '{}' to side {} of room '{}'", msg.kind(), side, room.id());
                    link.send(msg);
                }
                Err(e) => warn!(
                    "Dropping relay payload for side {} of room '{}': {}",
                    side,
                    room.id(),
                    e
                ),
            },

            TransportEvent::ChannelClosed => {
                info!("Relay channel for side {} of room '{}' closed", side, room.id());
            }

            TransportEvent::Disconnected => {
                warn!("Transport for side {} of room '{}' disconnected", side, room.id());
            }
        }
    }

    debug!("Event pump for side {} of room '{}' stopped", side, room.id());
}
