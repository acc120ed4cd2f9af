//! Applying member writes to the room: lobby management, game start and
//! reset, and every in-game submission.

use rand::Rng;
use std::collections::BTreeSet;
use tracing::info;

use super::{majority::tally_answers, role_assignment::deal_werewolf_game};
use crate::error::GameError;
use crate::models::{
    config::PhaseTimings,
    opinion::{OpinionGame, OpinionPhase},
    patch::RoomPatch,
    player::PlayerId,
    role::Role,
    room::{GameMode, GameState, Phase, Room, RoomStatus},
    topic::Genre,
    werewolf::{NightAction, WerewolfGame, WerewolfPhase},
};

/// Clock, timings and randomness a write may need.
pub struct ActionContext<'a, R: Rng + ?Sized> {
    pub now: i64,
    pub timings: &'a PhaseTimings,
    pub rng: &'a mut R,
}

pub fn apply_patch<R: Rng + ?Sized>(
    room: &mut Room,
    player_id: &str,
    patch: RoomPatch,
    ctx: &mut ActionContext<'_, R>,
) -> Result<(), GameError> {
    room.require_member(player_id)?;
    match patch {
        RoomPatch::SetName { name } => room.set_name(player_id, &name),
        RoomPatch::SetGameMode { mode } => room.set_game_mode(player_id, mode),
        RoomPatch::PurchaseAdBlock => room.purchase_ad_block(player_id),
        RoomPatch::Kick { target_id } => room.kick_member(player_id, &target_id),
        RoomPatch::StartGame => start_game(room, player_id, ctx),
        RoomPatch::RestartGame => restart_game(room, player_id, ctx),
        RoomPatch::ReturnToLobby => return_to_lobby(room, player_id),
        RoomPatch::SubmitNightAction {
            target_id,
            fake_role,
            priority,
        } => submit_night_action(
            room,
            player_id,
            NightAction {
                target_id,
                fake_role,
                priority,
            },
        ),
        RoomPatch::SubmitVote { target_id } => submit_vote(room, player_id, &target_id),
        RoomPatch::FinishDiscussion => finish_discussion(room, player_id),
        RoomPatch::ExtendDiscussion => extend_discussion(room, player_id, ctx),
        RoomPatch::SelectTopic {
            topic,
            genre,
            show_answer_details,
        } => select_topic(room, player_id, topic, genre, show_answer_details, ctx),
        RoomPatch::SubmitAnswer { value } => submit_answer(room, player_id, value),
        RoomPatch::BeginDiscussion => begin_discussion(room, player_id, ctx),
        RoomPatch::SubmitOpinionVotes { target_ids } => {
            submit_opinion_votes(room, player_id, target_ids)
        }
        RoomPatch::NextRound => next_round(room, player_id),
    }
}

pub fn start_game<R: Rng + ?Sized>(
    room: &mut Room,
    requester: &str,
    ctx: &mut ActionContext<'_, R>,
) -> Result<(), GameError> {
    room.require_host(requester)?;
    if room.status != RoomStatus::Waiting {
        return Err(GameError::NotWaiting);
    }
    deal(room, ctx)
}

pub fn restart_game<R: Rng + ?Sized>(
    room: &mut Room,
    requester: &str,
    ctx: &mut ActionContext<'_, R>,
) -> Result<(), GameError> {
    room.require_host(requester)?;
    if room.status == RoomStatus::Waiting {
        return Err(GameError::NotPlaying);
    }
    deal(room, ctx)
}

/// Builds the opening state for the room's mode; nothing is written when the
/// werewolf deal is rejected.
fn deal<R: Rng + ?Sized>(room: &mut Room, ctx: &mut ActionContext<'_, R>) -> Result<(), GameError> {
    let (game, phase_end_time) = match room.game_mode {
        GameMode::Werewolf => {
            let game = deal_werewolf_game(&room.members, ctx.rng)?;
            (
                GameState::Werewolf(game),
                Some(ctx.timings.role_check_deadline(ctx.now)),
            )
        }
        GameMode::Opinion => (GameState::Opinion(OpinionGame::new()), None),
    };
    room.game = Some(game);
    room.status = RoomStatus::Playing;
    room.phase_end_time = phase_end_time;
    room.reset_discussion();
    info!(
        room_id = %room.room_id,
        mode = ?room.game_mode,
        players = room.members.len(),
        "game started"
    );
    Ok(())
}

pub fn return_to_lobby(room: &mut Room, requester: &str) -> Result<(), GameError> {
    room.require_host(requester)?;
    room.reset_to_lobby();
    Ok(())
}

fn wrong_phase(room: &Room) -> GameError {
    GameError::WrongPhase { actual: room.phase() }
}

/// The werewolf game, provided it is in `phase` and `player_id` is alive.
fn living_actor<'a>(
    room: &'a mut Room,
    player_id: &str,
    phase: WerewolfPhase,
) -> Result<&'a mut WerewolfGame, GameError> {
    if room.phase() != Some(Phase::Werewolf(phase)) {
        return Err(match room.phase() {
            Some(Phase::Opinion(_)) => GameError::WrongMode,
            _ => wrong_phase(room),
        });
    }
    let members = room.members.clone();
    let game = room.werewolf_mut().ok_or(GameError::WrongMode)?;
    if !game.is_alive(&members, player_id) {
        return Err(GameError::PlayerDead(player_id.to_string()));
    }
    Ok(game)
}

fn require_living_target(
    game: &WerewolfGame,
    members: &[PlayerId],
    target: &str,
) -> Result<(), GameError> {
    if game.is_alive(members, target) {
        Ok(())
    } else {
        Err(GameError::InvalidTarget(target.to_string()))
    }
}

pub fn submit_night_action(
    room: &mut Room,
    player_id: &str,
    mut action: NightAction,
) -> Result<(), GameError> {
    let members = room.members.clone();
    let game = living_actor(room, player_id, WerewolfPhase::Night)?;
    let first_night_wolf = game.day_count <= 1 && game.role_of(player_id) == Some(Role::Werewolf);

    if first_night_wolf {
        // only the cosmetic claim survives
        action.target_id = None;
        if let Some(role) = action.fake_role {
            if !Role::FAKE_ROLE_OPTIONS.contains(&role) {
                action.fake_role = None;
            }
        }
    } else {
        action.fake_role = None;
        if let Some(target) = &action.target_id {
            if target == player_id {
                return Err(GameError::InvalidTarget(target.clone()));
            }
            require_living_target(game, &members, target)?;
            // no guarding the same player two nights running
            if game.role_of(player_id) == Some(Role::Hunter)
                && game.last_guarded_id.as_ref() == Some(target)
            {
                return Err(GameError::InvalidTarget(target.clone()));
            }
        }
    }
    game.night_actions.insert(player_id.to_string(), action);
    Ok(())
}

pub fn submit_vote(room: &mut Room, player_id: &str, target_id: &str) -> Result<(), GameError> {
    let members = room.members.clone();
    let game = living_actor(room, player_id, WerewolfPhase::DayVoting)?;
    if target_id == player_id {
        return Err(GameError::InvalidTarget(target_id.to_string()));
    }
    require_living_target(game, &members, target_id)?;
    game.vote_actions.insert(player_id.to_string(), target_id.to_string());
    Ok(())
}

/// Checks that the room is in a discussion and that `player_id` may take part.
fn require_discussion(room: &Room, player_id: &str) -> Result<(), GameError> {
    match room.phase() {
        Some(Phase::Werewolf(WerewolfPhase::DayDiscussion)) => {
            let alive = room
                .werewolf()
                .map(|g| g.is_alive(&room.members, player_id))
                .unwrap_or(false);
            if alive {
                Ok(())
            } else {
                Err(GameError::PlayerDead(player_id.to_string()))
            }
        }
        Some(Phase::Opinion(OpinionPhase::Discussion)) => Ok(()),
        _ => Err(wrong_phase(room)),
    }
}

pub fn finish_discussion(room: &mut Room, player_id: &str) -> Result<(), GameError> {
    require_discussion(room, player_id)?;
    room.finish_votes.insert(player_id.to_string());
    Ok(())
}

/// Pushes the deadline back once per player per discussion; repeats are
/// accepted and ignored.
pub fn extend_discussion<R: Rng + ?Sized>(
    room: &mut Room,
    player_id: &str,
    ctx: &mut ActionContext<'_, R>,
) -> Result<(), GameError> {
    require_discussion(room, player_id)?;
    if !room.extensions_used.insert(player_id.to_string()) {
        return Ok(());
    }
    let base = room.phase_end_time.unwrap_or(ctx.now);
    room.phase_end_time = Some(base + ctx.timings.extension_ms);
    Ok(())
}

fn opinion_in<'a>(
    room: &'a mut Room,
    phase: OpinionPhase,
) -> Result<&'a mut OpinionGame, GameError> {
    if room.phase() != Some(Phase::Opinion(phase)) {
        return Err(match room.phase() {
            Some(Phase::Werewolf(_)) => GameError::WrongMode,
            _ => wrong_phase(room),
        });
    }
    room.opinion_mut().ok_or(GameError::WrongMode)
}

pub fn select_topic<R: Rng + ?Sized>(
    room: &mut Room,
    requester: &str,
    topic: Option<String>,
    genre: Genre,
    show_answer_details: bool,
    ctx: &mut ActionContext<'_, R>,
) -> Result<(), GameError> {
    room.require_host(requester)?;
    if genre.requires_ad_block() && !room.is_ad_blocked {
        return Err(GameError::TabooLocked);
    }
    let game = opinion_in(room, OpinionPhase::Setup)?;
    let topic = match topic {
        Some(text) => text,
        None => genre
            .random_topic(ctx.rng)
            .map(str::to_string)
            .unwrap_or_default(),
    };
    game.reset_round();
    game.phase = OpinionPhase::Answering;
    game.topic = Some(topic);
    game.is_taboo_active = genre == Genre::Taboo;
    game.show_answer_details = show_answer_details;
    room.phase_end_time = None;
    Ok(())
}

pub fn submit_answer(room: &mut Room, player_id: &str, value: bool) -> Result<(), GameError> {
    let game = opinion_in(room, OpinionPhase::Answering)?;
    game.answers.insert(player_id.to_string(), value);
    Ok(())
}

pub fn begin_discussion<R: Rng + ?Sized>(
    room: &mut Room,
    requester: &str,
    ctx: &mut ActionContext<'_, R>,
) -> Result<(), GameError> {
    room.require_host(requester)?;
    let member_count = room.members.len();
    let game = opinion_in(room, OpinionPhase::Answering)?;
    game.phase = OpinionPhase::Discussion;
    room.phase_end_time = Some(ctx.timings.discussion_deadline(ctx.now, member_count));
    room.reset_discussion();
    Ok(())
}

/// Stores a suspect list. It must name exactly as many distinct members as
/// there are minority members.
pub fn submit_opinion_votes(
    room: &mut Room,
    player_id: &str,
    target_ids: Vec<PlayerId>,
) -> Result<(), GameError> {
    let members = room.members.clone();
    let game = opinion_in(room, OpinionPhase::Voting)?;
    let expected = tally_answers(&members, &game.answers).minority_count();

    let mut seen = BTreeSet::new();
    let mut targets = Vec::with_capacity(target_ids.len());
    for target in target_ids {
        if !members.contains(&target) {
            return Err(GameError::InvalidTarget(target));
        }
        if seen.insert(target.clone()) {
            targets.push(target);
        }
    }
    if targets.len() != expected {
        return Err(GameError::VoteCountMismatch {
            expected,
            actual: targets.len(),
        });
    }
    game.votes.insert(player_id.to_string(), targets);
    Ok(())
}

pub fn next_round(room: &mut Room, requester: &str) -> Result<(), GameError> {
    room.require_host(requester)?;
    if room.status != RoomStatus::Playing {
        return Err(GameError::NotPlaying);
    }
    let game = room.opinion_mut().ok_or(GameError::WrongMode)?;
    game.reset_round();
    room.phase_end_time = None;
    room.reset_discussion();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::phase::next_state;
    use rand::{rngs::StdRng, SeedableRng};

    fn room_of(n: usize) -> Room {
        let mut room = Room::new("r".to_string(), "p0".to_string());
        for i in 1..n {
            room.add_member(&format!("p{}", i));
        }
        room
    }

    fn patch(room: &mut Room, player: &str, p: RoomPatch, now: i64) -> Result<(), GameError> {
        let timings = PhaseTimings::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut ctx = ActionContext {
            now,
            timings: &timings,
            rng: &mut rng,
        };
        apply_patch(room, player, p, &mut ctx)
    }

    fn id_with_role(room: &Room, role: Role) -> String {
        room.werewolf().unwrap().holders_of(role).next().unwrap().clone()
    }

    fn force_phase(room: &mut Room, phase: WerewolfPhase) {
        room.werewolf_mut().unwrap().phase = phase;
    }

    #[test]
    fn unsupported_count_leaves_room_untouched() {
        let mut room = room_of(3);
        let before = room.clone();
        assert_eq!(
            patch(&mut room, "p0", RoomPatch::StartGame, 0),
            Err(GameError::UnsupportedPlayerCount(3))
        );
        assert_eq!(room, before);
    }

    #[test]
    fn only_host_starts() {
        let mut room = room_of(4);
        assert_eq!(patch(&mut room, "p1", RoomPatch::StartGame, 0), Err(GameError::NotHost));
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        assert_eq!(room.status, RoomStatus::Playing);
        assert_eq!(room.phase(), Some(Phase::Werewolf(WerewolfPhase::RoleCheck)));
        assert_eq!(room.phase_end_time, Some(11_000));
        assert_eq!(room.werewolf().unwrap().day_count, 1);
    }

    #[test]
    fn strangers_cannot_write() {
        let mut room = room_of(4);
        assert_eq!(
            patch(&mut room, "nobody", RoomPatch::PurchaseAdBlock, 0),
            Err(GameError::NotAMember("nobody".to_string()))
        );
    }

    #[test]
    fn first_night_wolf_keeps_only_fake_role() {
        let mut room = room_of(4);
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        force_phase(&mut room, WerewolfPhase::Night);
        let wolf = id_with_role(&room, Role::Werewolf);
        let villager = id_with_role(&room, Role::Villager);
        patch(
            &mut room,
            &wolf,
            RoomPatch::SubmitNightAction {
                target_id: Some(villager),
                fake_role: Some(Role::Seer),
                priority: true,
            },
            0,
        )
        .unwrap();
        let stored = &room.werewolf().unwrap().night_actions[&wolf];
        assert_eq!(stored.target_id, None);
        assert_eq!(stored.fake_role, Some(Role::Seer));
    }

    /// Second night of a table with a hunter, a wolf and three villagers.
    fn second_night_room() -> Room {
        let mut room = Room::new("r".to_string(), "hunter".to_string());
        for id in ["wolf", "a", "b", "c"] {
            room.add_member(id);
        }
        let assignment = [
            ("hunter", Role::Hunter),
            ("wolf", Role::Werewolf),
            ("a", Role::Villager),
            ("b", Role::Villager),
            ("c", Role::Villager),
        ]
        .into_iter()
        .map(|(id, r)| (id.to_string(), r))
        .collect();
        let mut game = WerewolfGame::new(assignment, None);
        game.phase = WerewolfPhase::Night;
        game.day_count = 2;
        room.game = Some(GameState::Werewolf(game));
        room.status = RoomStatus::Playing;
        room
    }

    fn night_target(target: &str) -> RoomPatch {
        RoomPatch::SubmitNightAction {
            target_id: Some(target.to_string()),
            fake_role: None,
            priority: false,
        }
    }

    #[test]
    fn nobody_targets_themselves_at_night() {
        let mut room = second_night_room();
        for id in ["hunter", "wolf"] {
            assert_eq!(
                patch(&mut room, id, night_target(id), 0),
                Err(GameError::InvalidTarget(id.to_string()))
            );
        }
        assert!(room.werewolf().unwrap().night_actions.is_empty());

        patch(&mut room, "wolf", night_target("hunter"), 0).unwrap();
        patch(&mut room, "hunter", night_target("a"), 0).unwrap();
        for id in ["a", "b", "c"] {
            patch(
                &mut room,
                id,
                RoomPatch::SubmitNightAction {
                    target_id: None,
                    fake_role: None,
                    priority: false,
                },
                0,
            )
            .unwrap();
        }
        let timings = PhaseTimings::default();
        let next = next_state(&room, 0, &timings, &mut StdRng::seed_from_u64(1)).unwrap();
        let game = next.werewolf().unwrap();
        assert_eq!(game.last_victim.as_deref(), Some("hunter"));
        assert!(game.is_dead("hunter"));
    }

    #[test]
    fn hunter_cannot_guard_the_same_player_twice_running() {
        let mut room = second_night_room();
        room.werewolf_mut().unwrap().last_guarded_id = Some("a".to_string());
        assert_eq!(
            patch(&mut room, "hunter", night_target("a"), 0),
            Err(GameError::InvalidTarget("a".to_string()))
        );
        patch(&mut room, "hunter", night_target("b"), 0).unwrap();
        // the ban is the hunter's alone
        patch(&mut room, "wolf", night_target("a"), 0).unwrap();
    }

    #[test]
    fn dead_players_cannot_act() {
        let mut room = room_of(4);
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        force_phase(&mut room, WerewolfPhase::DayVoting);
        room.werewolf_mut().unwrap().kill("p1");
        assert_eq!(
            patch(&mut room, "p1", RoomPatch::SubmitVote { target_id: "p2".to_string() }, 0),
            Err(GameError::PlayerDead("p1".to_string()))
        );
        assert_eq!(
            patch(&mut room, "p2", RoomPatch::SubmitVote { target_id: "p1".to_string() }, 0),
            Err(GameError::InvalidTarget("p1".to_string()))
        );
        patch(&mut room, "p2", RoomPatch::SubmitVote { target_id: "p3".to_string() }, 0).unwrap();
    }

    #[test]
    fn votes_outside_voting_are_rejected() {
        let mut room = room_of(4);
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        let vote = RoomPatch::SubmitVote {
            target_id: "p2".to_string(),
        };
        let result = patch(&mut room, "p1", vote, 0);
        assert_eq!(
            result,
            Err(GameError::WrongPhase {
                actual: Some(Phase::Werewolf(WerewolfPhase::RoleCheck))
            })
        );
    }

    #[test]
    fn extension_is_once_per_player() {
        let mut room = room_of(4);
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        force_phase(&mut room, WerewolfPhase::DayDiscussion);
        room.phase_end_time = Some(100_000);
        patch(&mut room, "p1", RoomPatch::ExtendDiscussion, 0).unwrap();
        patch(&mut room, "p1", RoomPatch::ExtendDiscussion, 0).unwrap();
        assert_eq!(room.phase_end_time, Some(160_000));
        patch(&mut room, "p2", RoomPatch::ExtendDiscussion, 0).unwrap();
        assert_eq!(room.phase_end_time, Some(220_000));
    }

    #[test]
    fn finish_ballots_are_a_set() {
        let mut room = room_of(4);
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        force_phase(&mut room, WerewolfPhase::DayDiscussion);
        patch(&mut room, "p1", RoomPatch::FinishDiscussion, 0).unwrap();
        patch(&mut room, "p1", RoomPatch::FinishDiscussion, 0).unwrap();
        assert_eq!(room.finish_votes.len(), 1);
    }

    #[test]
    fn return_to_lobby_clears_round() {
        let mut room = room_of(4);
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        patch(&mut room, "p0", RoomPatch::ReturnToLobby, 0).unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(room.game.is_none());
        assert_eq!(room.phase_end_time, None);
    }

    #[test]
    fn restart_deals_again() {
        let mut room = room_of(4);
        assert_eq!(patch(&mut room, "p0", RoomPatch::RestartGame, 0), Err(GameError::NotPlaying));
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        room.status = RoomStatus::Finished;
        patch(&mut room, "p0", RoomPatch::RestartGame, 50).unwrap();
        assert_eq!(room.status, RoomStatus::Playing);
        assert_eq!(room.phase_end_time, Some(11_050));
    }

    fn opinion_room(n: usize) -> Room {
        let mut room = room_of(n);
        patch(&mut room, "p0", RoomPatch::SetGameMode { mode: GameMode::Opinion }, 0).unwrap();
        patch(&mut room, "p0", RoomPatch::StartGame, 0).unwrap();
        room
    }

    #[test]
    fn taboo_needs_ad_free_room() {
        let mut room = opinion_room(3);
        let taboo = RoomPatch::SelectTopic {
            topic: None,
            genre: Genre::Taboo,
            show_answer_details: true,
        };
        assert_eq!(patch(&mut room, "p0", taboo.clone(), 0), Err(GameError::TabooLocked));
        patch(&mut room, "p0", RoomPatch::PurchaseAdBlock, 0).unwrap();
        patch(&mut room, "p0", taboo, 0).unwrap();
        let game = room.opinion().unwrap();
        assert!(game.is_taboo_active);
        assert!(Genre::Taboo.topics().contains(&game.topic.as_deref().unwrap()));
        assert!(!room.ads_visible_for("p1"));
    }

    #[test]
    fn opinion_round_end_to_end() {
        let mut room = opinion_room(4);
        patch(
            &mut room,
            "p0",
            RoomPatch::SelectTopic {
                topic: Some("Cats over dogs?".to_string()),
                genre: Genre::Normal,
                show_answer_details: false,
            },
            0,
        )
        .unwrap();
        for (p, v) in [("p0", true), ("p1", true), ("p2", true), ("p3", false)] {
            patch(&mut room, p, RoomPatch::SubmitAnswer { value: v }, 0).unwrap();
        }
        patch(&mut room, "p0", RoomPatch::BeginDiscussion, 1_000).unwrap();
        assert_eq!(room.phase_end_time, Some(1_000 + 4 * 60_000 + 2_000));
        for p in ["p0", "p1", "p2"] {
            patch(&mut room, p, RoomPatch::FinishDiscussion, 2_000).unwrap();
        }

        let timings = PhaseTimings::default();
        let mut rng = StdRng::seed_from_u64(5);
        room = next_state(&room, 2_000, &timings, &mut rng).unwrap();
        assert_eq!(room.opinion().unwrap().phase, OpinionPhase::Voting);

        assert_eq!(
            patch(
                &mut room,
                "p0",
                RoomPatch::SubmitOpinionVotes {
                    target_ids: vec!["p3".to_string(), "p2".to_string()]
                },
                2_000
            ),
            Err(GameError::VoteCountMismatch { expected: 1, actual: 2 })
        );
        for p in ["p0", "p1", "p2", "p3"] {
            let target = if p == "p3" { "p0" } else { "p3" };
            patch(
                &mut room,
                p,
                RoomPatch::SubmitOpinionVotes {
                    target_ids: vec![target.to_string()],
                },
                2_000,
            )
            .unwrap();
        }
        room = next_state(&room, 2_500, &timings, &mut rng).unwrap();
        let game = room.opinion().unwrap();
        assert_eq!(game.exiled_players, vec!["p3".to_string()]);
        assert_eq!(game.outcome, Some(crate::models::opinion::OpinionOutcome::MajorityWins));

        patch(&mut room, "p0", RoomPatch::NextRound, 9_000).unwrap();
        let game = room.opinion().unwrap();
        assert_eq!(game.phase, OpinionPhase::Setup);
        assert!(game.answers.is_empty());
        assert!(!game.show_answer_details);
    }
}
