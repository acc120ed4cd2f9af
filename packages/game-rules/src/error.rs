use thiserror::Error;

use crate::models::{player::PlayerId, room::Phase};

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("{0} players is not a supported werewolf table size")]
    UnsupportedPlayerCount(usize),
    #[error("only the host may do this")]
    NotHost,
    #[error("player {0} is not a member of this room")]
    NotAMember(PlayerId),
    #[error("player {0} is dead")]
    PlayerDead(PlayerId),
    #[error("action not allowed in phase {actual:?}")]
    WrongPhase { actual: Option<Phase> },
    #[error("action belongs to the other game mode")]
    WrongMode,
    #[error("the room is not waiting for a game")]
    NotWaiting,
    #[error("no game is being played")]
    NotPlaying,
    #[error("invalid target {0}")]
    InvalidTarget(PlayerId),
    #[error("expected {expected} suspects, got {actual}")]
    VoteCountMismatch { expected: usize, actual: usize },
    #[error("taboo topics require an ad-free room")]
    TabooLocked,
    #[error("the host cannot kick themselves")]
    CannotKickSelf,
    #[error("player name must not be empty")]
    EmptyName,
    #[error("the room changed underneath this transition")]
    StaleTransition,
}
