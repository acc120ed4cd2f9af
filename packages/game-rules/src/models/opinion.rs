use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::player::PlayerId;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OpinionPhase {
    Setup,
    Answering,
    Discussion,
    Voting,
    ExileAnnouncement,
    Results,
}

/// Which side took the round.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OpinionOutcome {
    /// The exiled set was exactly the minority.
    MajorityWins,
    /// At least one minority member escaped.
    MinorityWins,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OpinionGame {
    pub phase: OpinionPhase,
    pub topic: Option<String>,
    pub is_taboo_active: bool,
    pub show_answer_details: bool,
    pub answers: BTreeMap<PlayerId, bool>,
    pub votes: BTreeMap<PlayerId, Vec<PlayerId>>,
    pub exiled_players: Vec<PlayerId>,
    pub outcome: Option<OpinionOutcome>,
}

impl OpinionGame {
    pub fn new() -> Self {
        OpinionGame {
            phase: OpinionPhase::Setup,
            topic: None,
            is_taboo_active: false,
            show_answer_details: true,
            answers: BTreeMap::new(),
            votes: BTreeMap::new(),
            exiled_players: Vec::new(),
            outcome: None,
        }
    }

    /// Back to topic selection, clearing the previous round.
    pub fn reset_round(&mut self) {
        *self = OpinionGame {
            show_answer_details: self.show_answer_details,
            ..OpinionGame::new()
        };
    }
}

impl Default for OpinionGame {
    fn default() -> Self {
        Self::new()
    }
}
