use party_rules::{GameError, GameMode, PlayerId, Room, RoomStatus};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use super::{driver, ServiceError};
use crate::state::AppState;

const ROOM_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomSummary {
    pub room_id: String,
    pub host_id: PlayerId,
    pub member_count: usize,
    pub status: RoomStatus,
    pub game_mode: GameMode,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        RoomSummary {
            room_id: room.room_id.clone(),
            host_id: room.host_id.clone(),
            member_count: room.members.len(),
            status: room.status,
            game_mode: room.game_mode,
        }
    }
}

fn room_code() -> String {
    Uuid::new_v4().simple().to_string()[..ROOM_CODE_LEN].to_uppercase()
}

/// Opens a room with `host_id` as its only member and returns its code.
pub async fn create_room(state: AppState, host_id: &str) -> String {
    let room_id = {
        let mut rooms = state.rooms.lock().await;
        let mut room_id = room_code();
        while rooms.contains_key(&room_id) {
            room_id = room_code();
        }
        rooms.insert(room_id.clone(), Room::new(room_id.clone(), host_id.to_string()));
        room_id
    };
    info!(room_id = %room_id, host_id, "room created");

    if state.game_config.auto_advance_phases {
        driver::spawn_driver(state.clone(), room_id.clone());
    }
    room_id
}

/// Joining twice is harmless.
pub async fn join_room(
    state: AppState,
    room_id: &str,
    player_id: &str,
) -> Result<Room, ServiceError> {
    let (room, joined) = state
        .update_room(room_id, |room| Ok(room.add_member(player_id)))
        .await?;
    if joined {
        info!(room_id, player_id, "player joined");
    }
    Ok(room)
}

/// Removes the player; the last one out deletes the room. Returns the room
/// as it stands afterwards, or `None` once deleted.
pub async fn leave_room(
    state: AppState,
    room_id: &str,
    player_id: &str,
) -> Result<Option<Room>, ServiceError> {
    let mut rooms = state.rooms.lock().await;
    let room = rooms
        .get_mut(room_id)
        .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))?;
    if !room.remove_member(player_id) {
        return Err(GameError::NotAMember(player_id.to_string()).into());
    }
    info!(room_id, player_id, host_id = %room.host_id, "player left");

    if room.members.is_empty() {
        rooms.remove(room_id);
        state.close_room_channel(room_id).await;
        info!(room_id, "room deleted");
        return Ok(None);
    }
    room.version += 1;
    let room = room.clone();
    state.publish(&room).await;
    Ok(Some(room))
}

pub async fn kick_member(
    state: AppState,
    room_id: &str,
    requester: &str,
    target: &str,
) -> Result<Room, ServiceError> {
    let (room, ()) = state
        .update_room(room_id, |room| room.kick_member(requester, target))
        .await?;
    info!(room_id, target, "player kicked");
    Ok(room)
}

pub async fn set_name(
    state: AppState,
    room_id: &str,
    player_id: &str,
    name: &str,
) -> Result<Room, ServiceError> {
    let (room, ()) = state
        .update_room(room_id, |room| room.set_name(player_id, name))
        .await?;
    Ok(room)
}

pub async fn set_game_mode(
    state: AppState,
    room_id: &str,
    requester: &str,
    mode: GameMode,
) -> Result<Room, ServiceError> {
    let (room, ()) = state
        .update_room(room_id, |room| room.set_game_mode(requester, mode))
        .await?;
    info!(room_id, ?mode, "game mode changed");
    Ok(room)
}

pub async fn purchase_ad_block(
    state: AppState,
    room_id: &str,
    player_id: &str,
) -> Result<Room, ServiceError> {
    let (room, ()) = state
        .update_room(room_id, |room| room.purchase_ad_block(player_id))
        .await?;
    Ok(room)
}

pub async fn get_rooms(state: &AppState) -> HashMap<String, RoomSummary> {
    state
        .rooms
        .lock()
        .await
        .iter()
        .map(|(id, room)| (id.clone(), RoomSummary::from(room)))
        .collect()
}

pub async fn get_room_info(state: &AppState, room_id: &str) -> Result<Room, ServiceError> {
    state.snapshot(room_id).await
}

/// The current record plus a feed of every later one. Nothing committed in
/// between can be missed.
pub async fn subscribe(
    state: &AppState,
    room_id: &str,
) -> Result<(Room, broadcast::Receiver<Room>), ServiceError> {
    let rooms = state.rooms.lock().await;
    let room = rooms
        .get(room_id)
        .cloned()
        .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))?;
    let rx = state.get_or_create_room_channel(room_id).await.subscribe();
    Ok((room, rx))
}
