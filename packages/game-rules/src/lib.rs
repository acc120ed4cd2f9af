//! Rules for a room-based party game: werewolf and an opinion
//! (majority/minority) mode sharing one room record.
//!
//! Everything here is synchronous and free of I/O. Randomness comes from an
//! injected [`rand::Rng`] and the clock from a `now` argument in epoch
//! milliseconds.

pub mod error;
pub mod models;
pub mod rules;
pub mod view;

pub use error::GameError;
pub use models::{
    config::PhaseTimings,
    opinion::{OpinionGame, OpinionOutcome, OpinionPhase},
    patch::RoomPatch,
    player::PlayerId,
    role::{Role, Team},
    room::{GameMode, GameState, Phase, Room, RoomStatus},
    topic::Genre,
    werewolf::{NightAction, Reveal, WerewolfGame, WerewolfPhase},
};
pub use rules::{
    actions::{apply_patch, ActionContext},
    phase::{compare_and_swap, exit_reason, next_state, ExitReason},
};
pub use view::RoomView;
