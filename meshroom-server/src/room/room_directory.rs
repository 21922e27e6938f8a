use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use meshroom_core::{ClientId, RoomId};
use std::collections::HashSet;

/// Result of [`RoomDirectory::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Everyone else in the room, in the order they joined.
    pub prior_members: Vec<ClientId>,
    /// `false` when the client was already a member and nothing changed.
    pub newly_joined: bool,
}

/// Room membership.
///
/// Rooms have no explicit lifecycle: a room record exists exactly while it has
/// at least one member. The record is created by the first join and removed
/// under the same shard lock that removes its last member, so "no record" and
/// "empty room" always mean the same thing.
#[derive(Default)]
pub struct RoomDirectory {
    rooms: DashMap<RoomId, Vec<ClientId>>,
    memberships: DashMap<ClientId, HashSet<RoomId>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room_id: &RoomId, client_id: ClientId) -> JoinOutcome {
        let outcome = {
            let mut members = self.rooms.entry(room_id.clone()).or_default();
            let prior_members: Vec<ClientId> = members
                .iter()
                .copied()
                .filter(|member| *member != client_id)
                .collect();
            let newly_joined = !members.contains(&client_id);
            if newly_joined {
                members.push(client_id);
            }
            JoinOutcome {
                prior_members,
                newly_joined,
            }
        };

        if outcome.newly_joined {
            self.memberships
                .entry(client_id)
                .or_default()
                .insert(room_id.clone());
        }

        outcome
    }

    /// Remove a membership. Returns `false` if the client was not a member.
    pub fn leave(&self, room_id: &RoomId, client_id: ClientId) -> bool {
        let removed = match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(mut room) => {
                let members = room.get_mut();
                let before = members.len();
                members.retain(|member| *member != client_id);
                let removed = members.len() != before;
                if members.is_empty() {
                    room.remove();
                }
                removed
            }
            Entry::Vacant(_) => false,
        };

        if removed {
            if let Entry::Occupied(mut rooms) = self.memberships.entry(client_id) {
                rooms.get_mut().remove(room_id);
                if rooms.get().is_empty() {
                    rooms.remove();
                }
            }
        }

        removed
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ClientId> {
        self.rooms
            .get(room_id)
            .map(|members| members.clone())
            .unwrap_or_default()
    }

    pub fn members_except(&self, room_id: &RoomId, client_id: ClientId) -> Vec<ClientId> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|member| *member != client_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, client_id: ClientId) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .memberships
            .get(&client_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
