//! In-process live transport over per-room broadcast channels.
//!
//! At-most-once and best-effort: publishing to a room with no subscribers
//! is a no-op, and nothing is persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use huddle_core::error::Result;
use huddle_core::notify::LiveTransport;

/// One event as seen by a room subscriber.
#[derive(Debug, Clone)]
pub struct LiveEvent {
    pub room_id: String,
    pub event: String,
    pub payload: Value,
}

pub struct BroadcastLiveTransport {
    rooms: RwLock<HashMap<String, broadcast::Sender<LiveEvent>>>,
    capacity: usize,
}

impl Default for BroadcastLiveTransport {
    fn default() -> Self {
        Self::new(64)
    }
}

impl BroadcastLiveTransport {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribes to a room's event stream, creating the room if needed.
    pub async fn subscribe(&self, room_id: &str) -> broadcast::Receiver<LiveEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

#[async_trait]
impl LiveTransport for BroadcastLiveTransport {
    async fn join_room(&self, room_id: &str, client_id: &str) -> Result<()> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        debug!(room = room_id, client = client_id, "client joined room");
        Ok(())
    }

    async fn leave_room(&self, room_id: &str, client_id: &str) -> Result<()> {
        let mut rooms = self.rooms.write().await;
        if let Some(sender) = rooms.get(room_id) {
            if sender.receiver_count() == 0 {
                rooms.remove(room_id);
            }
        }
        debug!(room = room_id, client = client_id, "client left room");
        Ok(())
    }

    async fn publish(&self, room_id: &str, event: &str, payload: Value) -> Result<()> {
        let rooms = self.rooms.read().await;
        if let Some(sender) = rooms.get(room_id) {
            // A send error just means nobody is listening right now.
            let _ = sender.send(LiveEvent {
                room_id: room_id.to_string(),
                event: event.to_string(),
                payload,
            });
        }
        Ok(())
    }
}
