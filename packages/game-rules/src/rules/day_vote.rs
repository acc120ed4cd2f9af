use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use super::winning_judgement::{judge, Judgement};
use crate::models::{
    player::PlayerId,
    role::Role,
    werewolf::{Reveal, WerewolfGame},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DayVoteOutcome {
    pub tally: BTreeMap<PlayerId, usize>,
    pub exiled: Option<PlayerId>,
    pub medium_result: Option<Reveal>,
    pub dead_players: Vec<PlayerId>,
    pub judgement: Judgement,
}

/// Counts one vote per voter and exiles a most-voted member, breaking ties at
/// random. With no votes at all, any living member may be exiled.
pub fn resolve_day_vote<R: Rng + ?Sized>(
    game: &WerewolfGame,
    members: &[PlayerId],
    rng: &mut R,
) -> DayVoteOutcome {
    let mut tally: BTreeMap<PlayerId, usize> = BTreeMap::new();
    for target in game.vote_actions.values() {
        *tally.entry(target.clone()).or_insert(0) += 1;
    }

    let max_votes = tally.values().copied().max().unwrap_or(0);
    let mut candidates: Vec<&PlayerId> = tally
        .iter()
        .filter(|(_, count)| **count == max_votes && max_votes > 0)
        .map(|(id, _)| id)
        .collect();
    if candidates.is_empty() {
        candidates = game.alive_members(members);
    }

    let exiled = candidates.choose(rng).map(|id| (*id).clone());

    let mut dead_players = game.dead_players.clone();
    let medium_result = exiled.as_ref().map(|id| {
        if !dead_players.contains(id) {
            dead_players.push(id.clone());
        }
        Reveal {
            target_id: id.clone(),
            is_wolf: game.role_of(id) == Some(Role::Werewolf),
        }
    });

    let judgement = judge(members, &game.role_assignment, &dead_players);

    DayVoteOutcome {
        tally,
        exiled,
        medium_result,
        dead_players,
        judgement,
    }
}

pub fn apply_day_vote(game: &mut WerewolfGame, outcome: DayVoteOutcome) {
    game.last_exiled = outcome.exiled;
    game.last_medium_result = outcome.medium_result;
    game.dead_players = outcome.dead_players;
    game.winner = outcome.judgement.winner;
    game.apparent_winner = outcome.judgement.apparent_winner;
}
