use crate::error::RoomError;
use crate::room::{Room, SideChannels};
use crate::signaling::SignalingLink;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duet_core::RoomId;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CANDIDATE_BUFFER: usize = 5;

/// Mapping from room id to live room. Owned by the signaling service and
/// passed explicitly, so independent registries never share rooms.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Arc<Room>>>,
    candidate_buffer: usize,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_candidate_buffer(DEFAULT_CANDIDATE_BUFFER)
    }

    pub fn with_candidate_buffer(candidate_buffer: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            candidate_buffer,
        }
    }

    /// Inserts a new room owned by `link` as side A. An existing room under
    /// the same id is left untouched.
    pub fn create(
        &self,
        room_id: RoomId,
        link: SignalingLink,
    ) -> Result<(Arc<Room>, SideChannels), RoomError> {
        match self.rooms.entry(room_id) {
            Entry::Occupied(entry) => Err(RoomError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                let (room, channels) =
                    Room::new(entry.key().clone(), link, self.candidate_buffer);
                entry.insert(room.clone());
                info!("Room '{}' created", room.id());
                Ok((room, channels))
            }
        }
    }

    pub fn lookup(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Removes and closes the room under `room_id`, if any.
    pub fn delete(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        let (_, room) = self.rooms.remove(room_id)?;
        room.close();
        info!("Room '{}' deleted", room_id);
        Some(room)
    }

    /// Removes `room` only if it is still the registered instance for its id.
    /// Returns whether this call removed it.
    pub fn delete_room(&self, room: &Arc<Room>) -> bool {
        let removed = self
            .rooms
            .remove_if(room.id(), |_, current| Arc::ptr_eq(current, room))
            .is_some();
        if removed {
            room.close();
            info!("Room '{}' deleted", room.id());
        }
        removed
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
