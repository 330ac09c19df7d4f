//! Per-vehicle subscription rooms
//!
//! A room is the set of connections subscribed to one vehicle's update
//! stream. The router only knows membership and how to fan a frame out to
//! it; message content and transport are opaque. A reverse index
//! (connection → vehicles joined) makes disconnect teardown O(memberships)
//! instead of a scan over all rooms.

use bytes::Bytes;
use std::collections::{HashMap, HashSet};

use super::connection::{ClientId, OutboundSender};

/// Vehicle id → room membership, with a reverse index for teardown
#[derive(Debug, Default)]
pub struct VehicleRooms {
    /// Room members and their send capabilities, keyed by vehicle id
    rooms: HashMap<String, HashMap<ClientId, OutboundSender>>,

    /// Reverse index: connection → vehicles it has joined
    memberships: HashMap<ClientId, HashSet<String>>,
}

impl VehicleRooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a vehicle's room, creating the room lazily
    ///
    /// Idempotent: re-joining refreshes the stored sender and nothing else.
    pub fn join(&mut self, vehicle_id: &str, client_id: ClientId, sender: OutboundSender) {
        self.rooms
            .entry(vehicle_id.to_owned())
            .or_default()
            .insert(client_id, sender);

        self.memberships
            .entry(client_id)
            .or_default()
            .insert(vehicle_id.to_owned());
    }

    /// Remove a connection from every room it belongs to
    ///
    /// Called exactly once, on disconnect. Rooms that become empty are
    /// dropped.
    pub fn leave_all(&mut self, client_id: ClientId) {
        let Some(vehicles) = self.memberships.remove(&client_id) else {
            return;
        };

        for vehicle_id in vehicles {
            if let Some(members) = self.rooms.get_mut(&vehicle_id) {
                members.remove(&client_id);
                if members.is_empty() {
                    self.rooms.remove(&vehicle_id);
                }
            }
        }
    }

    /// Remove every member from a vehicle's room and discard it
    ///
    /// Called on `stop_tracking`. Evicting an absent room is a no-op.
    pub fn evict_all(&mut self, vehicle_id: &str) {
        let Some(members) = self.rooms.remove(vehicle_id) else {
            return;
        };

        for client_id in members.keys() {
            if let Some(joined) = self.memberships.get_mut(client_id) {
                joined.remove(vehicle_id);
                if joined.is_empty() {
                    self.memberships.remove(client_id);
                }
            }
        }
    }

    /// Fan a frame out to every current member of a vehicle's room
    ///
    /// Returns the number of members the frame was queued for. An empty or
    /// absent room is a no-op returning 0, not an error.
    pub fn broadcast(&self, vehicle_id: &str, frame: Bytes) -> usize {
        let Some(members) = self.rooms.get(vehicle_id) else {
            return 0;
        };

        for sender in members.values() {
            // Bytes clone is a refcount bump; all members share the frame
            let _ = sender.send(frame.clone());
        }

        members.len()
    }

    /// Number of members in a vehicle's room
    pub fn member_count(&self, vehicle_id: &str) -> usize {
        self.rooms.get(vehicle_id).map_or(0, HashMap::len)
    }

    /// Whether a connection is a member of a vehicle's room
    pub fn is_member(&self, vehicle_id: &str, client_id: ClientId) -> bool {
        self.rooms
            .get(vehicle_id)
            .is_some_and(|members| members.contains_key(&client_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn member() -> (OutboundSender, UnboundedReceiver<Bytes>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut rooms = VehicleRooms::new();
        let (tx, _rx) = member();

        rooms.join("V1", 1, tx.clone());
        rooms.join("V1", 1, tx);

        assert_eq!(rooms.member_count("V1"), 1);
        assert!(rooms.is_member("V1", 1));
    }

    #[test]
    fn test_broadcast_reaches_members_only() {
        let mut rooms = VehicleRooms::new();
        let (tx_a, mut rx_a) = member();
        let (tx_b, mut rx_b) = member();

        rooms.join("V1", 1, tx_a);
        rooms.join("V2", 2, tx_b);

        let delivered = rooms.broadcast("V1", Bytes::from_static(b"ping\n"));
        assert_eq!(delivered, 1);

        assert_eq!(rx_a.try_recv().unwrap(), Bytes::from_static(b"ping\n"));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_empty_room_is_noop() {
        let rooms = VehicleRooms::new();
        assert_eq!(rooms.broadcast("V1", Bytes::from_static(b"ping\n")), 0);
    }

    #[test]
    fn test_leave_all_clears_every_membership() {
        let mut rooms = VehicleRooms::new();
        let (tx, _rx) = member();

        rooms.join("V1", 1, tx.clone());
        rooms.join("V2", 1, tx);

        rooms.leave_all(1);

        assert_eq!(rooms.member_count("V1"), 0);
        assert_eq!(rooms.member_count("V2"), 0);

        // Calling again after teardown is harmless
        rooms.leave_all(1);
    }

    #[test]
    fn test_evict_all_discards_room() {
        let mut rooms = VehicleRooms::new();
        let (tx_a, _rx_a) = member();
        let (tx_b, _rx_b) = member();

        rooms.join("V1", 1, tx_a);
        rooms.join("V1", 2, tx_b);

        rooms.evict_all("V1");
        assert_eq!(rooms.member_count("V1"), 0);
        assert!(!rooms.is_member("V1", 1));

        // Evicting an absent room is accepted
        rooms.evict_all("V1");
    }

    #[test]
    fn test_evict_then_leave_all_on_disconnect() {
        // A member evicted by stop_tracking must not leave a dangling
        // reverse-index entry behind
        let mut rooms = VehicleRooms::new();
        let (tx, _rx) = member();

        rooms.join("V1", 1, tx.clone());
        rooms.evict_all("V1");

        rooms.join("V2", 1, tx);
        rooms.leave_all(1);
        assert_eq!(rooms.member_count("V2"), 0);
    }
}
