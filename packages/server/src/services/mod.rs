use party_rules::GameError;
use thiserror::Error;

pub mod driver;
pub mod game_service;
pub mod room_service;

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Wall clock in epoch milliseconds, the unit every deadline uses.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
