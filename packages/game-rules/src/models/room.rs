use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    opinion::{OpinionGame, OpinionPhase},
    player::{display_name, PlayerId},
    werewolf::{WerewolfGame, WerewolfPhase},
};
use crate::error::GameError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Werewolf,
    Opinion,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// Mode-specific round state. The envelope fields live on [`Room`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GameState {
    Werewolf(WerewolfGame),
    Opinion(OpinionGame),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "mode", content = "phase", rename_all = "snake_case")]
pub enum Phase {
    Werewolf(WerewolfPhase),
    Opinion(OpinionPhase),
}

/// The shared record for one room.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub room_id: String,
    pub host_id: PlayerId,
    pub members: Vec<PlayerId>,
    pub names: BTreeMap<PlayerId, String>,
    pub game_mode: GameMode,
    pub status: RoomStatus,
    pub phase_end_time: Option<i64>,
    pub extensions_used: BTreeSet<PlayerId>,
    pub finish_votes: BTreeSet<PlayerId>,
    pub is_ad_blocked: bool,
    pub ad_blocked_users: BTreeSet<PlayerId>,
    /// Bumped on every successful write; transitions compare against it.
    pub version: u64,
    pub game: Option<GameState>,
}

impl Room {
    pub fn new(room_id: String, host_id: PlayerId) -> Self {
        Room {
            room_id,
            members: vec![host_id.clone()],
            host_id,
            names: BTreeMap::new(),
            game_mode: GameMode::default(),
            status: RoomStatus::Waiting,
            phase_end_time: None,
            extensions_used: BTreeSet::new(),
            finish_votes: BTreeSet::new(),
            is_ad_blocked: false,
            ad_blocked_users: BTreeSet::new(),
            version: 0,
            game: None,
        }
    }

    /// The current phase; `None` unless a game is being played.
    pub fn phase(&self) -> Option<Phase> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        match self.game.as_ref()? {
            GameState::Werewolf(game) => Some(Phase::Werewolf(game.phase)),
            GameState::Opinion(game) => Some(Phase::Opinion(game.phase)),
        }
    }

    pub fn is_member(&self, player_id: &str) -> bool {
        self.members.iter().any(|m| m == player_id)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id == player_id
    }

    pub fn require_member(&self, player_id: &str) -> Result<(), GameError> {
        if self.is_member(player_id) {
            Ok(())
        } else {
            Err(GameError::NotAMember(player_id.to_string()))
        }
    }

    pub fn require_host(&self, player_id: &str) -> Result<(), GameError> {
        if self.is_host(player_id) {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    pub fn werewolf(&self) -> Option<&WerewolfGame> {
        match self.game.as_ref()? {
            GameState::Werewolf(game) => Some(game),
            GameState::Opinion(_) => None,
        }
    }

    pub fn werewolf_mut(&mut self) -> Option<&mut WerewolfGame> {
        match self.game.as_mut()? {
            GameState::Werewolf(game) => Some(game),
            GameState::Opinion(_) => None,
        }
    }

    pub fn opinion(&self) -> Option<&OpinionGame> {
        match self.game.as_ref()? {
            GameState::Opinion(game) => Some(game),
            GameState::Werewolf(_) => None,
        }
    }

    pub fn opinion_mut(&mut self) -> Option<&mut OpinionGame> {
        match self.game.as_mut()? {
            GameState::Opinion(game) => Some(game),
            GameState::Werewolf(_) => None,
        }
    }

    pub fn display_name(&self, player_id: &str) -> String {
        display_name(&self.names, player_id)
    }

    /// Set-union on `members`. Returns `false` if already present.
    pub fn add_member(&mut self, player_id: &str) -> bool {
        if self.is_member(player_id) {
            return false;
        }
        self.members.push(player_id.to_string());
        true
    }

    /// Set-difference on `members`, dropping the player's name. The host role
    /// passes to the first remaining member.
    ///
    /// Role assignment, deaths and submitted actions are left untouched.
    pub fn remove_member(&mut self, player_id: &str) -> bool {
        let Some(index) = self.members.iter().position(|m| m == player_id) else {
            return false;
        };
        self.members.remove(index);
        self.names.remove(player_id);
        if self.host_id == player_id {
            if let Some(next) = self.members.first() {
                self.host_id = next.clone();
            }
        }
        true
    }

    pub fn kick_member(&mut self, requester: &str, target: &str) -> Result<(), GameError> {
        self.require_host(requester)?;
        if requester == target {
            return Err(GameError::CannotKickSelf);
        }
        if !self.remove_member(target) {
            return Err(GameError::NotAMember(target.to_string()));
        }
        Ok(())
    }

    pub fn set_name(&mut self, player_id: &str, name: &str) -> Result<(), GameError> {
        self.require_member(player_id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        self.names.insert(player_id.to_string(), name.to_string());
        Ok(())
    }

    pub fn set_game_mode(&mut self, requester: &str, mode: GameMode) -> Result<(), GameError> {
        self.require_host(requester)?;
        if self.status != RoomStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        self.game_mode = mode;
        Ok(())
    }

    /// The host buys an ad-free room for everyone; anybody else only for
    /// themselves.
    pub fn purchase_ad_block(&mut self, player_id: &str) -> Result<(), GameError> {
        self.require_member(player_id)?;
        if self.is_host(player_id) {
            self.is_ad_blocked = true;
        } else {
            self.ad_blocked_users.insert(player_id.to_string());
        }
        Ok(())
    }

    pub fn ads_visible_for(&self, player_id: &str) -> bool {
        let taboo_active = self.opinion().map(|g| g.is_taboo_active).unwrap_or(false);
        !self.is_ad_blocked && !self.ad_blocked_users.contains(player_id) && !taboo_active
    }

    /// Clears every game-round field and returns to the lobby.
    pub fn reset_to_lobby(&mut self) {
        self.status = RoomStatus::Waiting;
        self.game = None;
        self.phase_end_time = None;
        self.extensions_used.clear();
        self.finish_votes.clear();
    }

    /// Clears the discussion ballots at the start of a discussion.
    pub fn reset_discussion(&mut self) {
        self.extensions_used.clear();
        self.finish_votes.clear();
    }
}
