//! The phase state machine: when each phase may be left, and what the room
//! looks like on the other side.
//!
//! Transitions are computed on a snapshot and committed with
//! [`compare_and_swap`], so a driver that evaluates the same phase twice only
//! ever writes once.

use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

use super::{
    day_vote::{apply_day_vote, resolve_day_vote},
    majority::resolve_exile,
    night::{apply_night, resolve_night},
};
use crate::error::GameError;
use crate::models::{
    config::PhaseTimings,
    opinion::{OpinionGame, OpinionPhase},
    player::PlayerId,
    room::{GameState, Phase, Room, RoomStatus},
    werewolf::{WerewolfGame, WerewolfPhase},
};

/// Why a phase may be left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Deadline,
    AllActed,
    FinishBallots,
}

pub fn deadline_passed(room: &Room, now: i64) -> bool {
    room.phase_end_time.map(|end| now >= end).unwrap_or(false)
}

/// Strictly more than half of `eligible` asked to end the discussion.
pub fn finish_majority(ballots: usize, eligible: usize) -> bool {
    ballots * 2 > eligible
}

/// Submissions held by living players; entries left behind by departed
/// players do not count.
fn acted<V>(living: &[&PlayerId], submitted: &BTreeMap<PlayerId, V>) -> usize {
    living.iter().filter(|id| submitted.contains_key(id.as_str())).count()
}

/// Evaluates the exit predicate of the current phase.
pub fn exit_reason(room: &Room, now: i64) -> Option<ExitReason> {
    let deadline = deadline_passed(room, now);
    match room.phase()? {
        Phase::Werewolf(phase) => {
            let game = room.werewolf()?;
            let living = game.alive_members(&room.members);
            let alive = living.len();
            let early = match phase {
                WerewolfPhase::Night if acted(&living, &game.night_actions) >= alive => {
                    Some(ExitReason::AllActed)
                }
                WerewolfPhase::DayVoting if acted(&living, &game.vote_actions) >= alive => {
                    Some(ExitReason::AllActed)
                }
                WerewolfPhase::DayDiscussion if finish_majority(room.finish_votes.len(), alive) => {
                    Some(ExitReason::FinishBallots)
                }
                _ => None,
            };
            early.or(deadline.then_some(ExitReason::Deadline))
        }
        Phase::Opinion(phase) => {
            let game = room.opinion()?;
            match phase {
                // host-driven
                OpinionPhase::Setup | OpinionPhase::Answering | OpinionPhase::Results => None,
                OpinionPhase::Discussion
                    if finish_majority(room.finish_votes.len(), room.members.len()) =>
                {
                    Some(ExitReason::FinishBallots)
                }
                OpinionPhase::Voting
                    if !game.votes.is_empty()
                        && room.members.iter().all(|m| game.votes.contains_key(m)) =>
                {
                    Some(ExitReason::AllActed)
                }
                _ => deadline.then_some(ExitReason::Deadline),
            }
        }
    }
}

/// The room after leaving its current phase, or `None` if the phase may not
/// be left yet. `room` itself is not touched.
pub fn next_state<R: Rng + ?Sized>(
    room: &Room,
    now: i64,
    timings: &PhaseTimings,
    rng: &mut R,
) -> Option<Room> {
    let reason = exit_reason(room, now)?;
    let mut next = room.clone();
    let members = next.members.clone();
    match next.game.as_mut()? {
        GameState::Werewolf(game) => {
            let deadline = advance_werewolf(game, &members, now, timings, rng);
            match deadline {
                PhaseEnd::At(at) => next.phase_end_time = Some(at),
                PhaseEnd::GameOver => {
                    next.status = RoomStatus::Finished;
                    next.phase_end_time = None;
                }
            }
            if next.werewolf().map(|g| g.phase) == Some(WerewolfPhase::DayDiscussion) {
                next.reset_discussion();
            }
            if next.werewolf().map(|g| g.phase) == Some(WerewolfPhase::DayVoting) {
                next.finish_votes.clear();
            }
        }
        GameState::Opinion(game) => {
            next.phase_end_time = advance_opinion(game, &members, now, timings, rng);
        }
    }
    debug!(
        room_id = %room.room_id,
        from = ?room.phase(),
        to = ?next.phase(),
        ?reason,
        "phase exit condition met"
    );
    Some(next)
}

enum PhaseEnd {
    At(i64),
    GameOver,
}

fn advance_werewolf<R: Rng + ?Sized>(
    game: &mut WerewolfGame,
    members: &[String],
    now: i64,
    timings: &PhaseTimings,
    rng: &mut R,
) -> PhaseEnd {
    match game.phase {
        WerewolfPhase::RoleCheck | WerewolfPhase::DayResult => {
            if game.winner.is_some() {
                return PhaseEnd::GameOver;
            }
            game.phase = WerewolfPhase::NightAnnounce;
            game.last_victim = None;
            game.last_cursed = None;
            PhaseEnd::At(timings.announce_deadline(now))
        }
        WerewolfPhase::NightAnnounce => {
            game.phase = WerewolfPhase::Night;
            game.night_actions.clear();
            PhaseEnd::At(timings.night_deadline(now))
        }
        WerewolfPhase::Night => {
            let outcome = resolve_night(game, members, rng);
            apply_night(game, outcome);
            game.phase = WerewolfPhase::NightResult;
            PhaseEnd::At(timings.result_deadline(now, game.winner.is_some()))
        }
        WerewolfPhase::NightResult => {
            if game.winner.is_some() {
                return PhaseEnd::GameOver;
            }
            game.phase = WerewolfPhase::DiscussionAnnounce;
            PhaseEnd::At(timings.announce_deadline(now))
        }
        WerewolfPhase::DiscussionAnnounce => {
            let alive = game.alive_members(members).len();
            game.phase = WerewolfPhase::DayDiscussion;
            PhaseEnd::At(timings.discussion_deadline(now, alive))
        }
        WerewolfPhase::DayDiscussion => {
            game.phase = WerewolfPhase::VotingAnnounce;
            PhaseEnd::At(timings.announce_deadline(now))
        }
        WerewolfPhase::VotingAnnounce => {
            game.phase = WerewolfPhase::DayVoting;
            game.vote_actions.clear();
            PhaseEnd::At(timings.werewolf_voting_deadline(now))
        }
        WerewolfPhase::DayVoting => {
            let outcome = resolve_day_vote(game, members, rng);
            apply_day_vote(game, outcome);
            game.phase = WerewolfPhase::DayResult;
            PhaseEnd::At(timings.result_deadline(now, game.winner.is_some()))
        }
    }
}

fn advance_opinion<R: Rng + ?Sized>(
    game: &mut OpinionGame,
    members: &[String],
    now: i64,
    timings: &PhaseTimings,
    rng: &mut R,
) -> Option<i64> {
    match game.phase {
        OpinionPhase::Discussion => {
            game.phase = OpinionPhase::Voting;
            Some(timings.opinion_voting_deadline(now))
        }
        OpinionPhase::Voting => {
            let result = resolve_exile(members, &game.answers, &game.votes, rng);
            game.exiled_players = result.exiled;
            game.outcome = Some(result.outcome);
            game.phase = OpinionPhase::ExileAnnouncement;
            Some(timings.exile_announcement_deadline(now))
        }
        OpinionPhase::ExileAnnouncement => {
            game.phase = OpinionPhase::Results;
            None
        }
        // left only by host actions
        OpinionPhase::Setup | OpinionPhase::Answering | OpinionPhase::Results => None,
    }
}

/// Replaces `current` with `next` only if `current` is still the record
/// `next` was computed from: same phase and same version.
pub fn compare_and_swap(
    current: &mut Room,
    expected_phase: Option<Phase>,
    expected_version: u64,
    next: Room,
) -> Result<(), GameError> {
    if current.phase() != expected_phase || current.version != expected_version {
        return Err(GameError::StaleTransition);
    }
    *current = Room {
        version: current.version + 1,
        ..next
    };
    Ok(())
}
