use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use party_rules::{RoomPatch, RoomView};
use serde::{Deserialize, Serialize};

use crate::services::{game_service, now_millis, ServiceError};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerRequest {
    pub player_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatchRequest {
    pub player_id: String,
    pub patch: RoomPatch,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:roomid",
            Router::new()
                .route("/start", post(start_game))
                .route("/restart", post(restart_game))
                .route("/lobby", post(return_to_lobby))
                // GET /api/game/{roomid}/state?player_id=p1
                .route("/state", get(get_game_state))
                .route("/patch", post(patch_handler))
                .route("/phase/next", post(advance_phase_handler)),
        )
        .with_state(state)
}

async fn view_for(
    state: &AppState,
    room_id: &str,
    viewer: &str,
) -> Result<Json<RoomView>, ServiceError> {
    Ok(Json(game_service::get_view(state, room_id, viewer).await?))
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::start_game(state.clone(), &room_id, &request.player_id, now_millis()).await?;
    Ok((StatusCode::OK, view_for(&state, &room_id, &request.player_id).await?))
}

async fn restart_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::restart_game(state.clone(), &room_id, &request.player_id, now_millis()).await?;
    Ok((StatusCode::OK, view_for(&state, &room_id, &request.player_id).await?))
}

async fn return_to_lobby(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::return_to_lobby(state.clone(), &room_id, &request.player_id).await?;
    Ok((StatusCode::OK, view_for(&state, &room_id, &request.player_id).await?))
}

pub async fn get_game_state(
    Path(room_id): Path<String>,
    Query(query): Query<PlayerRequest>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok((StatusCode::OK, view_for(&state, &room_id, &query.player_id).await?))
}

async fn patch_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<PatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let now = now_millis();
    game_service::apply_patch(state.clone(), &room_id, &request.player_id, request.patch, now)
        .await?;
    Ok((StatusCode::OK, view_for(&state, &room_id, &request.player_id).await?))
}

async fn advance_phase_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let advance =
        game_service::advance_phase(state, &room_id, &request.player_id, now_millis()).await?;
    Ok((StatusCode::OK, Json(advance)))
}
