use std::collections::BTreeMap;

use crate::models::{
    player::PlayerId,
    role::{Role, Team},
};

/// The faction that has visibly won among living members, ignoring the fox:
/// villagers once no wolf is alive, werewolves once wolves are at least as
/// many as everyone else.
pub fn check_apparent_winner(
    members: &[PlayerId],
    roles: &BTreeMap<PlayerId, Role>,
    dead: &[PlayerId],
) -> Option<Team> {
    let alive = members
        .iter()
        .filter(|m| roles.contains_key(*m) && !dead.contains(m));
    let (wolves, humans) = alive.fold((0usize, 0usize), |(w, h), m| {
        if roles.get(m).copied().map(Role::is_werewolf).unwrap_or(false) {
            (w + 1, h)
        } else {
            (w, h + 1)
        }
    });

    if wolves == 0 {
        Some(Team::Villagers)
    } else if wolves >= humans {
        Some(Team::Werewolves)
    } else {
        None
    }
}

/// Both winners after a resolution: the real one, where a living fox steals
/// any decided game, and the apparent one disclosed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    pub winner: Option<Team>,
    pub apparent_winner: Option<Team>,
}

pub fn judge(
    members: &[PlayerId],
    roles: &BTreeMap<PlayerId, Role>,
    dead: &[PlayerId],
) -> Judgement {
    let apparent_winner = check_apparent_winner(members, roles, dead);
    let winner = apparent_winner.map(|apparent| {
        let fox_alive = members
            .iter()
            .any(|m| !dead.contains(m) && roles.get(m) == Some(&Role::Fox));
        if fox_alive {
            Team::Fox
        } else {
            apparent
        }
    });
    Judgement {
        winner,
        apparent_winner,
    }
}
