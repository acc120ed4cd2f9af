use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use party_rules::GameError;

use crate::{services::ServiceError, state::AppState};

mod game;
mod room;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api/room", room::routes(state.clone()))
        .nest("/api/game", game::routes(state))
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Game(e) => match e {
                GameError::NotHost
                | GameError::NotAMember(_)
                | GameError::PlayerDead(_)
                | GameError::CannotKickSelf
                | GameError::TabooLocked => StatusCode::FORBIDDEN,
                GameError::WrongPhase { .. }
                | GameError::WrongMode
                | GameError::NotWaiting
                | GameError::NotPlaying
                | GameError::StaleTransition => StatusCode::CONFLICT,
                GameError::UnsupportedPlayerCount(_)
                | GameError::InvalidTarget(_)
                | GameError::VoteCountMismatch { .. }
                | GameError::EmptyName => StatusCode::BAD_REQUEST,
            },
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
