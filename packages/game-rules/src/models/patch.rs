use serde::{Deserialize, Serialize};

use super::{player::PlayerId, role::Role, room::GameMode, topic::Genre};

/// Every write a member can make to a room. Each variant touches only the
/// writer's own slot, or host-only fields when the writer is the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomPatch {
    SetName {
        name: String,
    },
    SetGameMode {
        mode: GameMode,
    },
    PurchaseAdBlock,
    Kick {
        target_id: PlayerId,
    },
    StartGame,
    RestartGame,
    ReturnToLobby,
    SubmitNightAction {
        target_id: Option<PlayerId>,
        #[serde(default)]
        fake_role: Option<Role>,
        #[serde(default)]
        priority: bool,
    },
    SubmitVote {
        target_id: PlayerId,
    },
    FinishDiscussion,
    ExtendDiscussion,
    SelectTopic {
        /// Picked at random from `genre` when absent.
        #[serde(default)]
        topic: Option<String>,
        genre: Genre,
        #[serde(default = "default_true")]
        show_answer_details: bool,
    },
    SubmitAnswer {
        value: bool,
    },
    BeginDiscussion,
    SubmitOpinionVotes {
        target_ids: Vec<PlayerId>,
    },
    NextRound,
}

fn default_true() -> bool {
    true
}

impl RoomPatch {
    pub fn name(&self) -> &'static str {
        match self {
            RoomPatch::SetName { .. } => "set_name",
            RoomPatch::SetGameMode { .. } => "set_game_mode",
            RoomPatch::PurchaseAdBlock => "purchase_ad_block",
            RoomPatch::Kick { .. } => "kick",
            RoomPatch::StartGame => "start_game",
            RoomPatch::RestartGame => "restart_game",
            RoomPatch::ReturnToLobby => "return_to_lobby",
            RoomPatch::SubmitNightAction { .. } => "submit_night_action",
            RoomPatch::SubmitVote { .. } => "submit_vote",
            RoomPatch::FinishDiscussion => "finish_discussion",
            RoomPatch::ExtendDiscussion => "extend_discussion",
            RoomPatch::SelectTopic { .. } => "select_topic",
            RoomPatch::SubmitAnswer { .. } => "submit_answer",
            RoomPatch::BeginDiscussion => "begin_discussion",
            RoomPatch::SubmitOpinionVotes { .. } => "submit_opinion_votes",
            RoomPatch::NextRound => "next_round",
        }
    }
}
