use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use party_rules::{Room, RoomPatch, RoomView};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, info, warn};

use crate::services::{game_service, now_millis, room_service};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Viewer {
    pub player_id: String,
}

/// Frames pushed to a client.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    Room { room: RoomView },
    /// The viewer is no longer a member; the socket closes after this.
    Removed,
    Error { error: String },
}

impl ServerMessage {
    fn for_viewer(room: &Room, viewer: &str) -> Self {
        if room.is_member(viewer) {
            ServerMessage::Room {
                room: RoomView::for_player(room, viewer),
            }
        } else {
            ServerMessage::Removed
        }
    }
}

/// The frame owed to `viewer` for one broadcast outcome. A subscriber that
/// fell behind is caught up with the current record instead of the frames it
/// missed.
async fn frame_for_update(
    update: Result<Room, RecvError>,
    state: &AppState,
    room_id: &str,
    viewer: &str,
) -> ServerMessage {
    match update {
        Ok(room) => ServerMessage::for_viewer(&room, viewer),
        Err(RecvError::Lagged(skipped)) => {
            warn!(room_id, skipped, "subscriber lagged, resending current view");
            match state.snapshot(room_id).await {
                Ok(room) => ServerMessage::for_viewer(&room, viewer),
                Err(_) => ServerMessage::Removed,
            }
        }
        // room deleted
        Err(RecvError::Closed) => ServerMessage::Removed,
    }
}

pub async fn handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(viewer): Query<Viewer>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, viewer.player_id))
}

pub async fn handle_socket(ws: WebSocket, state: AppState, room_id: String, player_id: String) {
    let (mut sender, mut receiver) = ws.split();

    let (initial, mut rx) = match room_service::subscribe(&state, &room_id).await {
        Ok(subscription) => subscription,
        Err(e) => {
            let frame = ServerMessage::Error { error: e.to_string() };
            if let Ok(text) = serde_json::to_string(&frame) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };
    info!(room_id = %room_id, player_id = %player_id, "websocket subscribed");

    // rejected patches go back to the writer only
    let (error_tx, mut error_rx) = mpsc::channel::<String>(16);
    let verbose = state.game_config.verbose_logging;

    let viewer = player_id.clone();
    let log_room = room_id.clone();
    let feed_state = state.clone();
    let mut send_task = tokio::spawn(async move {
        let mut next = Some(ServerMessage::for_viewer(&initial, &viewer));
        loop {
            if let Some(frame) = next.take() {
                let removed = matches!(frame, ServerMessage::Removed);
                let Ok(text) = serde_json::to_string(&frame) else {
                    continue;
                };
                if verbose {
                    debug!(room_id = %log_room, player_id = %viewer, "pushing frame");
                }
                if sender.send(Message::Text(text)).await.is_err() || removed {
                    break;
                }
            }
            next = tokio::select! {
                update = rx.recv() => {
                    Some(frame_for_update(update, &feed_state, &log_room, &viewer).await)
                }
                error = error_rx.recv() => match error {
                    Some(error) => Some(ServerMessage::Error { error }),
                    None => break,
                },
            };
        }
        let _ = sender.close().await;
    });

    let writer = player_id.clone();
    let patch_room = room_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let result = match serde_json::from_str::<RoomPatch>(&text) {
                        Ok(patch) => {
                            let now = now_millis();
                            let state = state.clone();
                            game_service::apply_patch(state, &patch_room, &writer, patch, now)
                                .await
                                .map(|_| ())
                                .map_err(|e| e.to_string())
                        }
                        Err(e) => Err(format!("malformed patch: {}", e)),
                    };
                    if let Err(error) = result {
                        debug!(
                            room_id = %patch_room,
                            player_id = %writer,
                            %error,
                            "patch rejected"
                        );
                        if error_tx.send(error).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // whichever side finishes first takes the other down with it
    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }
    info!(room_id = %room_id, player_id = %player_id, "websocket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::GameConfig;

    fn room_version(frame: &ServerMessage) -> u64 {
        match frame {
            ServerMessage::Room { room } => room.version,
            other => panic!("expected a room frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn lagged_subscriber_gets_the_current_view() {
        let state = AppState::with_config(GameConfig::manual());
        let room_id = room_service::create_room(state.clone(), "p1").await;
        let (_, mut rx) = room_service::subscribe(&state, &room_id).await.unwrap();

        for i in 0..200 {
            room_service::set_name(state.clone(), &room_id, "p1", &format!("name {}", i))
                .await
                .unwrap();
        }
        let update = rx.recv().await;
        assert!(matches!(update, Err(RecvError::Lagged(_))));

        let frame = frame_for_update(update, &state, &room_id, "p1").await;
        let current = state.snapshot(&room_id).await.unwrap();
        assert_eq!(room_version(&frame), current.version);
    }

    #[tokio::test]
    async fn lagged_subscriber_of_a_deleted_room_is_removed() {
        let state = AppState::with_config(GameConfig::manual());
        let frame = frame_for_update(Err(RecvError::Lagged(3)), &state, "gone", "p1").await;
        assert!(matches!(frame, ServerMessage::Removed));
    }
}
