use party_rules::{
    apply_patch as apply_room_patch, compare_and_swap, next_state, rules::actions, ActionContext,
    GameError, Phase, Room, RoomPatch, RoomView,
};
use serde::Serialize;
use tracing::{debug, info};

use super::ServiceError;
use crate::state::AppState;

/// What a request to leave the current phase achieved.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Advance {
    Advanced { phase: Option<Phase>, version: u64 },
    /// The exit predicate does not hold yet.
    NotReady,
    /// Someone else moved the room first; nothing was written.
    Stale,
}

pub async fn start_game(
    state: AppState,
    room_id: &str,
    requester: &str,
    now: i64,
) -> Result<Room, ServiceError> {
    let timings = state.game_config.timings.clone();
    let (room, ()) = state
        .update_room(room_id, |room| {
            let mut rng = rand::thread_rng();
            let mut ctx = ActionContext {
                now,
                timings: &timings,
                rng: &mut rng,
            };
            actions::start_game(room, requester, &mut ctx)
        })
        .await?;
    Ok(room)
}

pub async fn restart_game(
    state: AppState,
    room_id: &str,
    requester: &str,
    now: i64,
) -> Result<Room, ServiceError> {
    let timings = state.game_config.timings.clone();
    let (room, ()) = state
        .update_room(room_id, |room| {
            let mut rng = rand::thread_rng();
            let mut ctx = ActionContext {
                now,
                timings: &timings,
                rng: &mut rng,
            };
            actions::restart_game(room, requester, &mut ctx)
        })
        .await?;
    info!(room_id, "game restarted");
    Ok(room)
}

pub async fn return_to_lobby(
    state: AppState,
    room_id: &str,
    requester: &str,
) -> Result<Room, ServiceError> {
    let (room, ()) = state
        .update_room(room_id, |room| actions::return_to_lobby(room, requester))
        .await?;
    info!(room_id, "returned to lobby");
    Ok(room)
}

/// Applies one member write.
pub async fn apply_patch(
    state: AppState,
    room_id: &str,
    player_id: &str,
    patch: RoomPatch,
    now: i64,
) -> Result<Room, ServiceError> {
    let timings = state.game_config.timings.clone();
    let kind = patch.name();
    let (room, ()) = state
        .update_room(room_id, |room| {
            let mut rng = rand::thread_rng();
            let mut ctx = ActionContext {
                now,
                timings: &timings,
                rng: &mut rng,
            };
            apply_room_patch(room, player_id, patch, &mut ctx)
        })
        .await?;
    debug!(room_id, player_id, patch = kind, version = room.version, "patch applied");
    Ok(room)
}

/// Host request to leave the current phase.
pub async fn advance_phase(
    state: AppState,
    room_id: &str,
    requester: &str,
    now: i64,
) -> Result<Advance, ServiceError> {
    let snapshot = state.snapshot(room_id).await?;
    snapshot.require_host(requester)?;
    advance_from(&state, snapshot, now).await
}

/// Leaves the current phase on behalf of whoever is host right now.
pub async fn advance_as_host(
    state: &AppState,
    room_id: &str,
    now: i64,
) -> Result<Advance, ServiceError> {
    let snapshot = state.snapshot(room_id).await?;
    advance_from(state, snapshot, now).await
}

/// Resolves against `snapshot` without holding the lock, then commits only
/// if the record has not moved since.
async fn advance_from(state: &AppState, snapshot: Room, now: i64) -> Result<Advance, ServiceError> {
    let next = {
        let mut rng = rand::thread_rng();
        next_state(&snapshot, now, &state.game_config.timings, &mut rng)
    };
    let Some(next) = next else {
        return Ok(Advance::NotReady);
    };

    let mut rooms = state.rooms.lock().await;
    let room = rooms
        .get_mut(&snapshot.room_id)
        .ok_or_else(|| ServiceError::RoomNotFound(snapshot.room_id.clone()))?;
    match compare_and_swap(room, snapshot.phase(), snapshot.version, next) {
        Ok(()) => {
            let committed = room.clone();
            info!(
                room_id = %committed.room_id,
                from = ?snapshot.phase(),
                to = ?committed.phase(),
                status = ?committed.status,
                "phase advanced"
            );
            state.publish(&committed).await;
            Ok(Advance::Advanced {
                phase: committed.phase(),
                version: committed.version,
            })
        }
        Err(GameError::StaleTransition) => {
            debug!(room_id = %snapshot.room_id, "stale transition discarded");
            Ok(Advance::Stale)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_view(
    state: &AppState,
    room_id: &str,
    viewer: &str,
) -> Result<RoomView, ServiceError> {
    let room = state.snapshot(room_id).await?;
    room.require_member(viewer)?;
    Ok(RoomView::for_player(&room, viewer))
}
