use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    player::PlayerId,
    role::{Role, Team},
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WerewolfPhase {
    RoleCheck,
    NightAnnounce,
    Night,
    NightResult,
    DiscussionAnnounce,
    DayDiscussion,
    VotingAnnounce,
    DayVoting,
    DayResult,
}

/// One player's submission for the night.
///
/// `target_id == None` is the explicit "none" choice. First-night werewolves
/// only ever carry a `fake_role`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NightAction {
    pub target_id: Option<PlayerId>,
    pub fake_role: Option<Role>,
    #[serde(default)]
    pub priority: bool,
}

/// A seer or medium result: whether `target_id` is a werewolf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reveal {
    pub target_id: PlayerId,
    pub is_wolf: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WerewolfGame {
    pub phase: WerewolfPhase,
    pub day_count: u32,
    pub role_assignment: BTreeMap<PlayerId, Role>,
    pub dead_players: Vec<PlayerId>,
    pub night_actions: BTreeMap<PlayerId, NightAction>,
    pub vote_actions: BTreeMap<PlayerId, PlayerId>,
    pub last_victim: Option<PlayerId>,
    pub last_cursed: Option<PlayerId>,
    pub last_exiled: Option<PlayerId>,
    pub last_seer_result: Option<Reveal>,
    pub last_medium_result: Option<Reveal>,
    pub last_guarded_id: Option<PlayerId>,
    pub winner: Option<Team>,
    pub apparent_winner: Option<Team>,
}

impl WerewolfGame {
    pub fn new(
        role_assignment: BTreeMap<PlayerId, Role>,
        initial_seer_result: Option<Reveal>,
    ) -> Self {
        WerewolfGame {
            phase: WerewolfPhase::RoleCheck,
            day_count: 1,
            role_assignment,
            dead_players: Vec::new(),
            night_actions: BTreeMap::new(),
            vote_actions: BTreeMap::new(),
            last_victim: None,
            last_cursed: None,
            last_exiled: None,
            last_seer_result: initial_seer_result,
            last_medium_result: None,
            last_guarded_id: None,
            winner: None,
            apparent_winner: None,
        }
    }

    pub fn role_of(&self, player_id: &str) -> Option<Role> {
        self.role_assignment.get(player_id).copied()
    }

    pub fn is_dead(&self, player_id: &str) -> bool {
        self.dead_players.iter().any(|p| p == player_id)
    }

    /// Current members who were dealt a role and have not died.
    ///
    /// Members that joined after the deal are spectators and never count.
    pub fn alive_members<'a>(&self, members: &'a [PlayerId]) -> Vec<&'a PlayerId> {
        members
            .iter()
            .filter(|m| self.role_assignment.contains_key(m.as_str()) && !self.is_dead(m))
            .collect()
    }

    pub fn is_alive(&self, members: &[PlayerId], player_id: &str) -> bool {
        members.iter().any(|m| m == player_id)
            && self.role_assignment.contains_key(player_id)
            && !self.is_dead(player_id)
    }

    /// Appends to the death list unless already present.
    pub fn kill(&mut self, player_id: &str) -> bool {
        if self.is_dead(player_id) {
            return false;
        }
        self.dead_players.push(player_id.to_string());
        true
    }

    pub fn holders_of(&self, role: Role) -> impl Iterator<Item = &PlayerId> {
        self.role_assignment
            .iter()
            .filter(move |(_, r)| **r == role)
            .map(|(id, _)| id)
    }
}
