use meshroom_core::{ConnId, RoomKey};
use std::collections::HashMap;

/// Result of [`RoomRegistry::join`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Other members of the room, in the order they joined.
    pub peers: Vec<ConnId>,
    /// False when the connection was already in this room.
    pub newly_joined: bool,
    /// Set when joining moved the connection out of a different room.
    pub left: Option<Departure>,
}

/// A connection removed from a room, and who is still there.
#[derive(Debug, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomKey,
    pub remaining: Vec<ConnId>,
}

/// Room membership bookkeeping. A connection is in at most one room.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomKey, Vec<ConnId>>,
    membership: HashMap<ConnId, RoomKey>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, conn_id: &ConnId, room: &RoomKey) -> JoinOutcome {
        if self.membership.get(conn_id) == Some(room) {
            return JoinOutcome {
                peers: self.others(room, conn_id),
                newly_joined: false,
                left: None,
            };
        }

        let left = self.leave(conn_id);
        let peers = self.others(room, conn_id);

        self.rooms
            .entry(room.clone())
            .or_default()
            .push(conn_id.clone());
        self.membership.insert(conn_id.clone(), room.clone());

        JoinOutcome {
            peers,
            newly_joined: true,
            left,
        }
    }

    /// Unknown connections are a no-op: disconnects race with explicit leaves.
    pub fn leave(&mut self, conn_id: &ConnId) -> Option<Departure> {
        let room = self.membership.remove(conn_id)?;

        let remaining = match self.rooms.get_mut(&room) {
            Some(members) => {
                members.retain(|member| member != conn_id);
                members.clone()
            }
            None => Vec::new(),
        };

        if remaining.is_empty() {
            self.rooms.remove(&room);
        }

        Some(Departure { room, remaining })
    }

    pub fn room_of(&self, conn_id: &ConnId) -> Option<&RoomKey> {
        self.membership.get(conn_id)
    }

    pub fn members(&self, room: &RoomKey) -> &[ConnId] {
        self.rooms.get(room).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn others(&self, room: &RoomKey, except: &ConnId) -> Vec<ConnId> {
        self.members(room)
            .iter()
            .filter(|member| *member != except)
            .cloned()
            .collect()
    }

    pub fn is_member(&self, room: &RoomKey, conn_id: &ConnId) -> bool {
        self.membership.get(conn_id) == Some(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
