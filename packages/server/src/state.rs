use party_rules::{GameError, Room};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::models::config::GameConfig;
use crate::services::ServiceError;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<Mutex<HashMap<String, Room>>>,
    pub channel: Arc<Mutex<HashMap<String, broadcast::Sender<Room>>>>,
    pub game_config: Arc<GameConfig>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::from_env())
    }

    pub fn with_config(game_config: GameConfig) -> Self {
        AppState {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            channel: Arc::new(Mutex::new(HashMap::new())),
            game_config: Arc::new(game_config),
        }
    }

    pub async fn get_or_create_room_channel(&self, room_id: &str) -> broadcast::Sender<Room> {
        let mut channels = self.channel.lock().await;
        if let Some(channel) = channels.get(room_id) {
            channel.clone()
        } else {
            let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
            channels.insert(room_id.to_string(), tx.clone());
            tx
        }
    }

    /// Pushes the full record to every subscriber of the room.
    pub async fn publish(&self, room: &Room) {
        let tx = self.get_or_create_room_channel(&room.room_id).await;
        // no receivers is fine
        let _ = tx.send(room.clone());
    }

    /// Dropping the sender ends every subscriber's stream.
    pub async fn close_room_channel(&self, room_id: &str) {
        self.channel.lock().await.remove(room_id);
    }

    pub async fn snapshot(&self, room_id: &str) -> Result<Room, ServiceError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))
    }

    /// Runs `mutate` on a working copy of the room and commits it only on
    /// success, so a rejected write leaves the record untouched. Every commit
    /// bumps the version and is published.
    pub async fn update_room<T, F>(
        &self,
        room_id: &str,
        mutate: F,
    ) -> Result<(Room, T), ServiceError>
    where
        F: FnOnce(&mut Room) -> Result<T, GameError>,
    {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))?;
        let mut working = room.clone();
        let output = mutate(&mut working)?;
        working.version = room.version + 1;
        *room = working;
        let committed = room.clone();
        debug!(room_id, version = committed.version, "room updated");
        self.publish(&committed).await;
        Ok((committed, output))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
