use crate::error::RoomError;
use crate::signaling::SignalingLink;
use crate::transport::{Negotiator, RelayChannel};
use duet_core::{IceCandidate, PeerId, RoomId, SessionDescription, Side};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Channel ends one handshake routine owns for the lifetime of its room.
///
/// Side A publishes the offer and receives the answer; side B receives the
/// offer and publishes the answer. Each side pushes its own candidates and
/// drains the other's.
pub struct SideChannels {
    /// Buffered hand-off: publishing returns at once, before the other side
    /// has read the description.
    pub publish: oneshot::Sender<SessionDescription>,
    pub incoming: oneshot::Receiver<SessionDescription>,
    pub candidates_out: mpsc::Sender<IceCandidate>,
    pub candidates_in: mpsc::Receiver<IceCandidate>,
}

fn handshake_channels(candidate_buffer: usize) -> (SideChannels, SideChannels) {
    let (offer_tx, offer_rx) = oneshot::channel();
    let (answer_tx, answer_rx) = oneshot::channel();
    let (a_to_b_tx, a_to_b_rx) = mpsc::channel(candidate_buffer);
    let (b_to_a_tx, b_to_a_rx) = mpsc::channel(candidate_buffer);

    let side_a = SideChannels {
        publish: offer_tx,
        incoming: answer_rx,
        candidates_out: a_to_b_tx,
        candidates_in: b_to_a_rx,
    };
    let side_b = SideChannels {
        publish: answer_tx,
        incoming: offer_rx,
        candidates_out: b_to_a_tx,
        candidates_in: a_to_b_rx,
    };
    (side_a, side_b)
}

/// One participant position inside a room.
struct Slot {
    link: SignalingLink,
    negotiator: OnceLock<Arc<dyn Negotiator>>,
    relay: Mutex<Option<Arc<dyn RelayChannel>>>,
}

impl Slot {
    fn new(link: SignalingLink) -> Self {
        Self {
            link,
            negotiator: OnceLock::new(),
            relay: Mutex::new(None),
        }
    }
}

/// Per-session bridge state between exactly two participants.
pub struct Room {
    id: RoomId,
    side_a: Slot,
    side_b: OnceLock<Slot>,
    pending_b: Mutex<Option<SideChannels>>,
    peer_arrived: Notify,
    cancel: CancellationToken,
}

impl Room {
    /// Creates a room with slot A taken by `link`. Returns the channel ends of
    /// the side-A routine; side B's ends wait inside the room until `join`.
    pub fn new(
        id: RoomId,
        link: SignalingLink,
        candidate_buffer: usize,
    ) -> (Arc<Self>, SideChannels) {
        let (side_a, side_b) = handshake_channels(candidate_buffer.max(1));

        let room = Arc::new(Self {
            id,
            side_a: Slot::new(link),
            side_b: OnceLock::new(),
            pending_b: Mutex::new(Some(side_b)),
            peer_arrived: Notify::new(),
            cancel: CancellationToken::new(),
        });
        (room, side_a)
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Takes slot B. Fails without touching the room if it is already taken.
    pub fn join(&self, link: SignalingLink) -> Result<SideChannels, RoomError> {
        if self.side_b.set(Slot::new(link)).is_err() {
            return Err(RoomError::Full(self.id.clone()));
        }
        let channels = self
            .pending_b
            .lock()
            .take()
            .ok_or_else(|| RoomError::Full(self.id.clone()))?;

        info!("Room '{}' is now full", self.id);
        self.peer_arrived.notify_one();
        Ok(channels)
    }

    pub fn is_full(&self) -> bool {
        self.side_b.get().is_some()
    }

    /// Resolves once side B has joined. Only the side-A routine waits here.
    pub async fn peer_arrived(&self) {
        if self.is_full() {
            return;
        }
        self.peer_arrived.notified().await;
    }

    fn slot(&self, side: Side) -> Option<&Slot> {
        match side {
            Side::A => Some(&self.side_a),
            Side::B => self.side_b.get(),
        }
    }

    pub fn link(&self, side: Side) -> Option<SignalingLink> {
        self.slot(side).map(|slot| slot.link.clone())
    }

    pub fn side_of(&self, peer_id: PeerId) -> Option<Side> {
        [Side::A, Side::B].into_iter().find(|side| {
            self.slot(*side)
                .is_some_and(|slot| slot.link.peer_id() == peer_id)
        })
    }

    /// Signaling link of whichever participant is not `peer_id`.
    pub fn other_link(&self, peer_id: PeerId) -> Option<SignalingLink> {
        self.link(self.side_of(peer_id)?.other())
    }

    pub fn set_negotiator(&self, side: Side, negotiator: Arc<dyn Negotiator>) {
        let Some(slot) = self.slot(side) else { return };
        if slot.negotiator.set(negotiator).is_err() {
            warn!("Negotiator for side {} of room '{}' already set", side, self.id);
        }
    }

    pub fn set_relay_channel(&self, side: Side, channel: Arc<dyn RelayChannel>) {
        let Some(slot) = self.slot(side) else { return };
        *slot.relay.lock() = Some(channel);
    }

    /// The relay channel handle, read under the slot lock and released before
    /// the caller sends on it.
    pub fn relay_channel(&self, side: Side) -> Option<Arc<dyn RelayChannel>> {
        self.slot(side).and_then(|slot| slot.relay.lock().clone())
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops every routine of this room and closes both negotiators.
    pub(crate) fn close(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        let negotiators: Vec<_> = [Side::A, Side::B]
            .into_iter()
            .filter_map(|side| self.slot(side))
            .filter_map(|slot| slot.negotiator.get().cloned())
            .collect();
        if negotiators.is_empty() {
            return;
        }

        let room_id = self.id.clone();
        tokio::spawn(async move {
            for negotiator in negotiators {
                if let Err(e) = negotiator.close().await {
                    warn!("Failed to close negotiator of room '{}': {:?}", room_id, e);
                }
            }
        });
    }
}
