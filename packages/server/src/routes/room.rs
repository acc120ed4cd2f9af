use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use party_rules::GameMode;
use serde::{Deserialize, Serialize};

use crate::{
    services::{room_service, ServiceError},
    state::AppState,
    utils::websocket,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub host_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KickRequest {
    pub requester_id: String,
    pub target_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NameRequest {
    pub player_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeRequest {
    pub player_id: String,
    pub mode: GameMode,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl -X POST http://localhost:8080/api/room/create \
        //   -H 'content-type: application/json' -d '{"host_id":"p1"}'
        .route("/create", post(create_room))
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        .route("/:roomid/join/:playerid", post(join_room))
        .route("/:roomid/leave/:playerid", post(leave_room))
        .route("/:roomid/kick", post(kick_member))
        .route("/:roomid/name", post(set_name))
        .route("/:roomid/mode", post(set_game_mode))
        .route("/:roomid/ad-block/:playerid", post(purchase_ad_block))
        // websocat 'ws://localhost:8080/api/room/{roomid}/ws?player_id=p1'
        .route("/:roomid/ws", get(websocket::handler))
        .with_state(state)
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> impl IntoResponse {
    let room_id = room_service::create_room(state, &request.host_id).await;
    (StatusCode::OK, Json(CreateRoomResponse { room_id }))
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = room_service::get_rooms(&state).await;
    (StatusCode::OK, Json(rooms))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let room = room_service::join_room(state, &room_id, &player_id).await?;
    Ok((StatusCode::OK, Json(room.members)))
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let remaining = room_service::leave_room(state, &room_id, &player_id).await?;
    let members = remaining.map(|room| room.members).unwrap_or_default();
    Ok((StatusCode::OK, Json(members)))
}

async fn kick_member(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<KickRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let room =
        room_service::kick_member(state, &room_id, &request.requester_id, &request.target_id)
            .await?;
    Ok((StatusCode::OK, Json(room.members)))
}

async fn set_name(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let room = room_service::set_name(state, &room_id, &request.player_id, &request.name).await?;
    Ok((StatusCode::OK, Json(room.names)))
}

async fn set_game_mode(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<ModeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let room =
        room_service::set_game_mode(state, &room_id, &request.player_id, request.mode).await?;
    Ok((StatusCode::OK, Json(room.game_mode)))
}

async fn purchase_ad_block(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let room = room_service::purchase_ad_block(state, &room_id, &player_id).await?;
    Ok((StatusCode::OK, Json(room.ads_visible_for(&player_id))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::GameConfig;
    use axum::{body::to_bytes, body::Body, http::Request};
    use tower::ServiceExt;

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_room() {
        let state = AppState::with_config(GameConfig::manual());
        let app = routes(state.clone());

        let request = json_request("POST", "/create", serde_json::json!({ "host_id": "p1" }));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: CreateRoomResponse = serde_json::from_slice(&body).unwrap();
        let room = room_service::get_room_info(&state, &created.room_id).await.unwrap();
        assert_eq!(room.host_id, "p1");
    }

    #[tokio::test]
    async fn test_join_unknown_room() {
        let app = routes(AppState::with_config(GameConfig::manual()));
        let request = Request::builder()
            .method("POST")
            .uri("/NOPE00/join/p2")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_guest_cannot_change_mode() {
        let state = AppState::with_config(GameConfig::manual());
        let room_id = room_service::create_room(state.clone(), "p1").await;
        room_service::join_room(state.clone(), &room_id, "p2").await.unwrap();

        let request = json_request(
            "POST",
            &format!("/{}/mode", room_id),
            serde_json::json!({ "player_id": "p2", "mode": "opinion" }),
        );
        let response = routes(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "only the host may do this");
    }
}
