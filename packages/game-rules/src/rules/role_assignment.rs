//! Dealing roles at game start.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use crate::error::GameError;
use crate::models::{
    player::PlayerId,
    role::Role,
    werewolf::{Reveal, WerewolfGame},
};

use Role::*;

/// Table sizes that have a preset.
pub const SUPPORTED_PLAYER_COUNTS: [usize; 10] = [4, 5, 6, 7, 8, 9, 10, 12, 13, 14];

/// The fixed role multiset for a table of `player_count`, if supported.
pub fn role_preset(player_count: usize) -> Option<&'static [Role]> {
    let preset: &'static [Role] = match player_count {
        4 => &[Werewolf, Seer, Villager, Villager],
        5 => &[Werewolf, Seer, Hunter, Villager, Villager],
        6 => &[Werewolf, Madman, Seer, Villager, Villager, Villager],
        7 => &[Werewolf, Madman, Seer, Medium, Villager, Villager, Villager],
        8 => &[Werewolf, Werewolf, Seer, Medium, Hunter, Villager, Villager, Villager],
        9 => &[Werewolf, Werewolf, Madman, Seer, Medium, Hunter, Villager, Villager, Villager],
        10 => &[
            Werewolf, Werewolf, Madman, Seer, Medium, Hunter, Villager, Villager, Villager,
            Villager,
        ],
        12 => &[
            Werewolf, Werewolf, Werewolf, Madman, Seer, Medium, Hunter, Villager, Villager,
            Villager, Twins, Twins,
        ],
        13 => &[
            Werewolf, Werewolf, Werewolf, Madman, Seer, Medium, Hunter, Villager, Villager,
            Villager, Twins, Twins, Fox,
        ],
        14 => &[
            Werewolf, Werewolf, Werewolf, Madman, Seer, Medium, Hunter, Villager, Villager,
            Villager, Villager, Twins, Twins, Fox,
        ],
        _ => return None,
    };
    Some(preset)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleDeal {
    pub assignments: BTreeMap<PlayerId, Role>,
    /// The seer's pre-game scouting result, always "not a wolf".
    pub initial_seer_result: Option<Reveal>,
}

/// Shuffles the preset for `members.len()` and zips it against `members` in
/// order. Fails without side effects for unsupported table sizes.
pub fn assign_roles<R: Rng + ?Sized>(
    members: &[PlayerId],
    rng: &mut R,
) -> Result<RoleDeal, GameError> {
    let preset = role_preset(members.len())
        .ok_or(GameError::UnsupportedPlayerCount(members.len()))?;
    let mut roles = preset.to_vec();
    roles.shuffle(rng);

    let assignments: BTreeMap<PlayerId, Role> = members.iter().cloned().zip(roles).collect();
    let initial_seer_result = scout_before_game(members, &assignments, rng);

    Ok(RoleDeal {
        assignments,
        initial_seer_result,
    })
}

/// Picks one member who is neither the seer, a werewolf nor a fox.
fn scout_before_game<R: Rng + ?Sized>(
    members: &[PlayerId],
    assignments: &BTreeMap<PlayerId, Role>,
    rng: &mut R,
) -> Option<Reveal> {
    let seer = assignments.iter().find(|(_, role)| **role == Seer).map(|(id, _)| id)?;
    let candidates: Vec<&PlayerId> = members
        .iter()
        .filter(|m| *m != seer && !matches!(assignments.get(*m), Some(Werewolf) | Some(Fox)))
        .collect();
    candidates.choose(rng).map(|target| Reveal {
        target_id: (*target).clone(),
        is_wolf: false,
    })
}

/// A fresh werewolf game for `members`, in the role-check phase.
pub fn deal_werewolf_game<R: Rng + ?Sized>(
    members: &[PlayerId],
    rng: &mut R,
) -> Result<WerewolfGame, GameError> {
    let deal = assign_roles(members, rng)?;
    Ok(WerewolfGame::new(deal.assignments, deal.initial_seer_result))
}
