use std::collections::{HashMap, HashSet};

use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{BroadcastMessage, ServerMessage, UsersMessage};

/// Result of joining a room: the member list that was announced, and the
/// subscription on which this connection will receive the room's traffic.
pub struct RoomJoin {
    pub members: Vec<String>,
    pub receiver: broadcast::Receiver<BroadcastMessage>,
}

struct Room {
    members: HashSet<String>,
    channel: broadcast::Sender<BroadcastMessage>,
}

/// Process-wide map from document id to the connections viewing it.
///
/// Constructed once in `AppState` and shared by every connection task; all
/// member-set mutations go through here, under the write lock. Presence
/// announcements are published while the lock is still held, so the list a
/// client sees always matches the registry state at the time of the change.
pub struct RoomRegistry {
    capacity: usize,
    rooms: RwLock<HashMap<String, Room>>,
}

impl RoomRegistry {
    /// `capacity` bounds each room's broadcast channel; a subscriber that
    /// falls further behind is lagged, not a brake on the rest of the room.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add `identity` to the room, creating it if needed, and announce the
    /// refreshed member list to everyone in it. Joining an occupied room
    /// with an identity already present is a no-op on the member set.
    pub async fn join(&self, document_id: &str, identity: &str) -> RoomJoin {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(document_id.to_string()).or_insert_with(|| {
            debug!("creating room for document {}", document_id);
            let (channel, _rx) = broadcast::channel::<BroadcastMessage>(self.capacity);
            Room {
                members: HashSet::new(),
                channel,
            }
        });
        room.members.insert(identity.to_string());
        let receiver = room.channel.subscribe();
        let members: Vec<String> = room.members.iter().cloned().collect();
        Self::announce_users(&room.channel, &members);
        RoomJoin { members, receiver }
    }

    /// Remove `identity` from the room and announce the refreshed member
    /// list. Leaving an unknown room, or a room the identity is not in, is
    /// a no-op. Emptied rooms are pruned; a later join recreates them.
    pub async fn leave(&self, document_id: &str, identity: &str) -> Vec<String> {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(document_id) else {
            debug!("leave for unknown room {}", document_id);
            return Vec::new();
        };
        room.members.remove(identity);
        let members: Vec<String> = room.members.iter().cloned().collect();
        Self::announce_users(&room.channel, &members);
        if members.is_empty() {
            rooms.remove(document_id);
            info!("room {} removed (empty)", document_id);
        }
        members
    }

    /// Snapshot of the current member set.
    pub async fn members(&self, document_id: &str) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms
            .get(document_id)
            .map(|room| room.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Fan a payload out to every room member except the sending
    /// connection. A relay into a room that no longer exists is dropped.
    pub async fn relay(&self, document_id: &str, sender_connection_id: &str, payload: String) {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(document_id) else {
            debug!("relay into unknown room {}", document_id);
            return;
        };
        let _ = room.channel.send(BroadcastMessage {
            exclude: Some(sender_connection_id.to_string()),
            payload,
        });
    }

    /// Fan a payload out to every room member, the originator included.
    pub async fn broadcast(&self, document_id: &str, payload: String) {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(document_id) else {
            debug!("broadcast into unknown room {}", document_id);
            return;
        };
        let _ = room.channel.send(BroadcastMessage {
            exclude: None,
            payload,
        });
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Total identities present across all rooms.
    pub async fn presence_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.values().map(|room| room.members.len()).sum()
    }

    fn announce_users(channel: &broadcast::Sender<BroadcastMessage>, members: &[String]) {
        let message = ServerMessage::Users(UsersMessage {
            users: members.to_vec(),
        });
        let payload = serde_json::to_string(&message).unwrap();
        // Send fails only when nobody is subscribed, which is fine for an
        // announcement to a room that just emptied.
        let _ = channel.send(BroadcastMessage {
            exclude: None,
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_from(payload: &str) -> Vec<String> {
        match serde_json::from_str(payload).unwrap() {
            ServerMessage::Users(UsersMessage { mut users }) => {
                users.sort();
                users
            }
            other => panic!("expected users message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let registry = RoomRegistry::new(16);
        let first = registry.join("doc1", "alice").await;
        assert_eq!(first.members, vec!["alice".to_string()]);
        let second = registry.join("doc1", "alice").await;
        assert_eq!(second.members, vec!["alice".to_string()]);
        assert_eq!(registry.members("doc1").await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn leave_of_absent_identity_is_noop() {
        let registry = RoomRegistry::new(16);
        registry.join("doc1", "alice").await;
        let members = registry.leave("doc1", "ghost").await;
        assert_eq!(members, vec!["alice".to_string()]);
        // A room that never existed is equally tolerated.
        assert!(registry.leave("nope", "alice").await.is_empty());
    }

    #[tokio::test]
    async fn empty_room_is_pruned_and_recreated() {
        let registry = RoomRegistry::new(16);
        registry.join("doc1", "alice").await;
        assert_eq!(registry.room_count().await, 1);
        registry.leave("doc1", "alice").await;
        assert_eq!(registry.room_count().await, 0);
        // Pruning must never reject a later join for the same id.
        let rejoined = registry.join("doc1", "bob").await;
        assert_eq!(rejoined.members, vec!["bob".to_string()]);
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn join_announces_refreshed_member_list() {
        let registry = RoomRegistry::new(16);
        let mut alice = registry.join("doc1", "alice").await;
        let announced = alice.receiver.recv().await.unwrap();
        assert_eq!(users_from(&announced.payload), vec!["alice".to_string()]);

        registry.join("doc1", "bob").await;
        let announced = alice.receiver.recv().await.unwrap();
        assert_eq!(
            users_from(&announced.payload),
            vec!["alice".to_string(), "bob".to_string()]
        );

        registry.leave("doc1", "bob").await;
        let announced = alice.receiver.recv().await.unwrap();
        assert_eq!(users_from(&announced.payload), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn relay_tags_the_sender_for_exclusion() {
        let registry = RoomRegistry::new(16);
        let mut alice = registry.join("doc1", "alice").await;
        let mut bob = registry.join("doc1", "bob").await;
        // Drain the presence announcements.
        alice.receiver.recv().await.unwrap();
        alice.receiver.recv().await.unwrap();
        bob.receiver.recv().await.unwrap();

        registry.relay("doc1", "conn-alice", "delta-1".to_string()).await;

        let got = bob.receiver.recv().await.unwrap();
        assert_eq!(got.payload, "delta-1");
        assert_eq!(got.exclude.as_deref(), Some("conn-alice"));
        // The channel delivers to every subscriber; the connection loop is
        // what drops the sender's copy. Alice's copy carries the same tag.
        let echoed = alice.receiver.recv().await.unwrap();
        assert_eq!(echoed.exclude.as_deref(), Some("conn-alice"));
    }

    #[tokio::test]
    async fn relay_preserves_sender_order() {
        let registry = RoomRegistry::new(64);
        registry.join("doc1", "alice").await;
        let mut bob = registry.join("doc1", "bob").await;
        bob.receiver.recv().await.unwrap();

        for i in 0..10 {
            registry
                .relay("doc1", "conn-alice", format!("delta-{}", i))
                .await;
        }
        for i in 0..10 {
            let got = bob.receiver.recv().await.unwrap();
            assert_eq!(got.payload, format!("delta-{}", i));
        }
    }

    #[tokio::test]
    async fn concurrent_joins_lose_no_members() {
        let registry = std::sync::Arc::new(RoomRegistry::new(256));
        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.join("doc1", &format!("user-{}", i)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.members("doc1").await.len(), 32);
        assert_eq!(registry.presence_count().await, 32);
    }
}
