//! Per-viewer projections of a room. Hidden information is stripped while a
//! game is running and everything is disclosed once it is finished.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    opinion::{OpinionGame, OpinionOutcome, OpinionPhase},
    player::PlayerId,
    role::{Role, Team},
    room::{GameMode, GameState, Phase, Room, RoomStatus},
    werewolf::{NightAction, Reveal, WerewolfGame, WerewolfPhase},
};
use crate::rules::majority::tally_answers;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomView {
    pub room_id: String,
    pub host_id: PlayerId,
    pub members: Vec<PlayerId>,
    pub names: BTreeMap<PlayerId, String>,
    pub game_mode: GameMode,
    pub status: RoomStatus,
    pub phase: Option<Phase>,
    pub phase_end_time: Option<i64>,
    pub extensions_used: BTreeSet<PlayerId>,
    pub finish_votes: BTreeSet<PlayerId>,
    pub is_ad_blocked: bool,
    pub ads_visible: bool,
    pub version: u64,
    pub game: Option<GameView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GameView {
    Werewolf(WerewolfView),
    Opinion(OpinionView),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WerewolfView {
    pub phase: WerewolfPhase,
    pub day_count: u32,
    pub my_role: Option<Role>,
    /// Roles this viewer is entitled to know, their own included.
    pub known_roles: BTreeMap<PlayerId, Role>,
    pub dead_players: Vec<PlayerId>,
    pub night_actions: BTreeMap<PlayerId, NightAction>,
    pub vote_actions: BTreeMap<PlayerId, PlayerId>,
    pub last_victim: Option<PlayerId>,
    pub last_exiled: Option<PlayerId>,
    pub last_seer_result: Option<Reveal>,
    pub last_medium_result: Option<Reveal>,
    pub last_guarded_id: Option<PlayerId>,
    pub last_cursed: Option<PlayerId>,
    pub apparent_winner: Option<Team>,
    pub winner: Option<Team>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpinionView {
    pub phase: OpinionPhase,
    pub topic: Option<String>,
    pub is_taboo_active: bool,
    pub show_answer_details: bool,
    pub yes_count: usize,
    pub no_count: usize,
    pub minority_count: usize,
    pub answers: BTreeMap<PlayerId, bool>,
    pub votes: BTreeMap<PlayerId, Vec<PlayerId>>,
    pub exiled_players: Vec<PlayerId>,
    pub outcome: Option<OpinionOutcome>,
}

impl RoomView {
    pub fn for_player(room: &Room, viewer: &str) -> RoomView {
        let revealed = room.status == RoomStatus::Finished;
        let game = room.game.as_ref().map(|game| match game {
            GameState::Werewolf(g) => {
                GameView::Werewolf(WerewolfView::new(g, &room.members, viewer, revealed))
            }
            GameState::Opinion(g) => {
                GameView::Opinion(OpinionView::new(g, &room.members, viewer))
            }
        });
        RoomView {
            room_id: room.room_id.clone(),
            host_id: room.host_id.clone(),
            members: room.members.clone(),
            names: room.names.clone(),
            game_mode: room.game_mode,
            status: room.status,
            phase: room.phase(),
            phase_end_time: room.phase_end_time,
            extensions_used: room.extensions_used.clone(),
            finish_votes: room.finish_votes.clone(),
            is_ad_blocked: room.is_ad_blocked,
            ads_visible: room.ads_visible_for(viewer),
            version: room.version,
            game,
        }
    }
}

fn private_reveal(
    game: &WerewolfGame,
    viewer: &str,
    holder: Role,
    reveal: &Option<Reveal>,
    revealed: bool,
) -> Option<Reveal> {
    if revealed || game.role_of(viewer) == Some(holder) {
        reveal.clone()
    } else {
        None
    }
}

/// What the seer learns as soon as tonight's reading is submitted. The first
/// night keeps the pre-game result instead.
fn tonight_reading(game: &WerewolfGame, members: &[PlayerId], viewer: &str) -> Option<Reveal> {
    if game.phase != WerewolfPhase::Night
        || game.day_count <= 1
        || game.role_of(viewer) != Some(Role::Seer)
        || !game.is_alive(members, viewer)
    {
        return None;
    }
    let target = game.night_actions.get(viewer)?.target_id.as_ref()?;
    Some(Reveal {
        target_id: target.clone(),
        is_wolf: game.role_of(target) == Some(Role::Werewolf),
    })
}

impl WerewolfView {
    fn new(game: &WerewolfGame, members: &[PlayerId], viewer: &str, revealed: bool) -> Self {
        let my_role = game.role_of(viewer);
        let is_wolf = |id: &str| game.role_of(id).map(Role::is_werewolf).unwrap_or(false);
        let viewer_is_wolf = is_wolf(viewer);
        let sees = |id: &str| revealed || id == viewer || (viewer_is_wolf && is_wolf(id));

        let known_roles = game
            .role_assignment
            .iter()
            .filter(|(id, _)| sees(id))
            .map(|(id, role)| (id.clone(), *role))
            .collect();
        let night_actions = game
            .night_actions
            .iter()
            .filter(|(id, _)| sees(id))
            .map(|(id, action)| (id.clone(), action.clone()))
            .collect();
        let last_guarded_id = if revealed || my_role == Some(Role::Hunter) {
            game.last_guarded_id.clone()
        } else {
            None
        };

        WerewolfView {
            phase: game.phase,
            day_count: game.day_count,
            my_role,
            known_roles,
            dead_players: game.dead_players.clone(),
            night_actions,
            vote_actions: game.vote_actions.clone(),
            last_victim: game.last_victim.clone(),
            last_exiled: game.last_exiled.clone(),
            last_seer_result: tonight_reading(game, members, viewer).or_else(|| {
                private_reveal(game, viewer, Role::Seer, &game.last_seer_result, revealed)
            }),
            last_medium_result: private_reveal(
                game,
                viewer,
                Role::Medium,
                &game.last_medium_result,
                revealed,
            ),
            last_guarded_id,
            last_cursed: if revealed { game.last_cursed.clone() } else { None },
            apparent_winner: game.apparent_winner,
            winner: if revealed { game.winner } else { None },
        }
    }
}

impl OpinionView {
    fn new(game: &OpinionGame, members: &[PlayerId], viewer: &str) -> Self {
        let tally = tally_answers(members, &game.answers);
        let disclosed = matches!(
            game.phase,
            OpinionPhase::ExileAnnouncement | OpinionPhase::Results
        );
        let answers = game
            .answers
            .iter()
            .filter(|(id, _)| id.as_str() == viewer || (disclosed && game.show_answer_details))
            .map(|(id, v)| (id.clone(), *v))
            .collect();
        let votes = game
            .votes
            .iter()
            .filter(|(id, _)| id.as_str() == viewer || disclosed)
            .map(|(id, v)| (id.clone(), v.clone()))
            .collect();

        OpinionView {
            phase: game.phase,
            topic: game.topic.clone(),
            is_taboo_active: game.is_taboo_active,
            show_answer_details: game.show_answer_details,
            yes_count: tally.yes,
            no_count: tally.no,
            minority_count: tally.minority_count(),
            answers,
            votes,
            exiled_players: game.exiled_players.clone(),
            outcome: game.outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn werewolf_room() -> Room {
        let mut room = Room::new("r".to_string(), "w1".to_string());
        for id in ["w2", "seer", "medium", "v"] {
            room.add_member(id);
        }
        let assignment = [
            ("w1", Role::Werewolf),
            ("w2", Role::Werewolf),
            ("seer", Role::Seer),
            ("medium", Role::Medium),
            ("v", Role::Villager),
        ]
        .into_iter()
        .map(|(id, r)| (id.to_string(), r))
        .collect();
        let mut game = WerewolfGame::new(
            assignment,
            Some(Reveal {
                target_id: "v".to_string(),
                is_wolf: false,
            }),
        );
        game.night_actions.insert(
            "w1".to_string(),
            NightAction {
                target_id: Some("v".to_string()),
                ..NightAction::default()
            },
        );
        game.night_actions.insert(
            "seer".to_string(),
            NightAction {
                target_id: Some("w2".to_string()),
                ..NightAction::default()
            },
        );
        room.game = Some(GameState::Werewolf(game));
        room.status = RoomStatus::Playing;
        room
    }

    fn werewolf_view(room: &Room, viewer: &str) -> WerewolfView {
        match RoomView::for_player(room, viewer).game {
            Some(GameView::Werewolf(view)) => view,
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn villagers_see_only_themselves() {
        let room = werewolf_room();
        let view = werewolf_view(&room, "v");
        assert_eq!(view.my_role, Some(Role::Villager));
        assert_eq!(view.known_roles.len(), 1);
        assert!(view.night_actions.is_empty());
        assert_eq!(view.last_seer_result, None);
    }

    #[test]
    fn wolves_see_the_pack() {
        let room = werewolf_room();
        let view = werewolf_view(&room, "w2");
        assert_eq!(view.known_roles.keys().collect::<Vec<_>>(), vec!["w1", "w2"]);
        assert!(view.night_actions.contains_key("w1"));
        assert!(!view.night_actions.contains_key("seer"));
    }

    #[test]
    fn seer_result_goes_to_the_seer_only() {
        let room = werewolf_room();
        assert!(werewolf_view(&room, "seer").last_seer_result.is_some());
        assert!(werewolf_view(&room, "medium").last_seer_result.is_none());
    }

    #[test]
    fn seer_reads_tonight_target_at_once() {
        let mut room = werewolf_room();
        {
            let game = room.werewolf_mut().unwrap();
            game.phase = WerewolfPhase::Night;
            game.day_count = 2;
        }
        let expected = Some(Reveal {
            target_id: "w2".to_string(),
            is_wolf: true,
        });
        assert_eq!(werewolf_view(&room, "seer").last_seer_result, expected);
        assert_eq!(werewolf_view(&room, "w1").last_seer_result, None);

        // the first night still shows the pre-game result
        room.werewolf_mut().unwrap().day_count = 1;
        let first_night = werewolf_view(&room, "seer").last_seer_result.unwrap();
        assert_eq!(first_night.target_id, "v");

        // a dead seer learns nothing new
        let game = room.werewolf_mut().unwrap();
        game.day_count = 2;
        game.dead_players.push("seer".to_string());
        let dead = werewolf_view(&room, "seer").last_seer_result.unwrap();
        assert_eq!(dead.target_id, "v");
    }

    #[test]
    fn finished_games_reveal_everything() {
        let mut room = werewolf_room();
        room.status = RoomStatus::Finished;
        let view = werewolf_view(&room, "v");
        assert_eq!(view.known_roles.len(), 5);
        assert_eq!(view.night_actions.len(), 2);
        assert!(view.last_seer_result.is_some());
        assert_eq!(RoomView::for_player(&room, "v").phase, None);
    }

    fn opinion_room(phase: OpinionPhase, details: bool) -> Room {
        let mut room = Room::new("r".to_string(), "a".to_string());
        room.add_member("b");
        room.add_member("c");
        let mut game = OpinionGame::new();
        game.phase = phase;
        game.show_answer_details = details;
        game.answers.insert("a".to_string(), true);
        game.answers.insert("b".to_string(), true);
        game.answers.insert("c".to_string(), false);
        room.game = Some(GameState::Opinion(game));
        room.status = RoomStatus::Playing;
        room
    }

    fn opinion_view(room: &Room, viewer: &str) -> OpinionView {
        match RoomView::for_player(room, viewer).game {
            Some(GameView::Opinion(view)) => view,
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn answers_stay_private_until_announced() {
        let room = opinion_room(OpinionPhase::Discussion, true);
        let view = opinion_view(&room, "c");
        assert_eq!(view.answers.len(), 1);
        assert_eq!((view.yes_count, view.no_count, view.minority_count), (2, 1, 1));

        let room = opinion_room(OpinionPhase::Results, true);
        assert_eq!(opinion_view(&room, "c").answers.len(), 3);

        let room = opinion_room(OpinionPhase::Results, false);
        assert_eq!(opinion_view(&room, "c").answers.len(), 1);
    }
}
