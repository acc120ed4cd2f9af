//! Opinion-game resolution: who sits in the minority, and whom the room
//! exiles in its attempt to find them.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{opinion::OpinionOutcome, player::PlayerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTally {
    pub yes: usize,
    pub no: usize,
    /// A tie counts as a "yes" majority.
    pub majority_value: bool,
    /// Members whose answer differs from the majority, including members who
    /// never answered.
    pub minority: Vec<PlayerId>,
}

impl AnswerTally {
    pub fn minority_count(&self) -> usize {
        self.minority.len()
    }
}

pub fn tally_answers(members: &[PlayerId], answers: &BTreeMap<PlayerId, bool>) -> AnswerTally {
    let yes = answers.values().filter(|v| **v).count();
    let no = answers.values().filter(|v| !**v).count();
    let majority_value = yes >= no;
    let minority = members
        .iter()
        .filter(|m| answers.get(*m) != Some(&majority_value))
        .cloned()
        .collect();
    AnswerTally {
        yes,
        no,
        majority_value,
        minority,
    }
}

/// Votes received by one member, split by the voter's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotesReceived {
    pub from_majority: usize,
    pub total: usize,
}

pub fn count_votes(
    members: &[PlayerId],
    answers: &BTreeMap<PlayerId, bool>,
    votes: &BTreeMap<PlayerId, Vec<PlayerId>>,
    majority_value: bool,
) -> BTreeMap<PlayerId, VotesReceived> {
    let mut counts: BTreeMap<PlayerId, VotesReceived> =
        members.iter().map(|m| (m.clone(), VotesReceived::default())).collect();
    for (voter, targets) in votes {
        let voter_in_majority = answers.get(voter) == Some(&majority_value);
        let unique: BTreeSet<&PlayerId> = targets.iter().collect();
        for target in unique {
            if let Some(received) = counts.get_mut(target) {
                received.total += 1;
                if voter_in_majority {
                    received.from_majority += 1;
                }
            }
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExileResult {
    pub tally: AnswerTally,
    pub exiled: Vec<PlayerId>,
    pub outcome: OpinionOutcome,
}

/// Ranks members by majority-cast votes, then by all votes, then at random,
/// and exiles as many as there are minority members. The majority wins only
/// by exiling exactly the minority.
pub fn resolve_exile<R: Rng + ?Sized>(
    members: &[PlayerId],
    answers: &BTreeMap<PlayerId, bool>,
    votes: &BTreeMap<PlayerId, Vec<PlayerId>>,
    rng: &mut R,
) -> ExileResult {
    let tally = tally_answers(members, answers);
    let counts = count_votes(members, answers, votes, tally.majority_value);

    let mut ranked: Vec<&PlayerId> = members.iter().collect();
    ranked.shuffle(rng);
    // stable sort keeps the shuffled order among equals
    ranked.sort_by(|a, b| {
        let a = counts[*a];
        let b = counts[*b];
        b.from_majority
            .cmp(&a.from_majority)
            .then(b.total.cmp(&a.total))
    });

    let exiled: Vec<PlayerId> = ranked
        .into_iter()
        .take(tally.minority_count())
        .cloned()
        .collect();

    let exiled_set: BTreeSet<&PlayerId> = exiled.iter().collect();
    let minority_set: BTreeSet<&PlayerId> = tally.minority.iter().collect();
    let outcome = if exiled_set == minority_set {
        OpinionOutcome::MajorityWins
    } else {
        OpinionOutcome::MinorityWins
    };

    ExileResult {
        tally,
        exiled,
        outcome,
    }
}
