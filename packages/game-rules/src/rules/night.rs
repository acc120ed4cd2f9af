//! Night resolution: the wolves' attack, the hunter's guard and the seer's
//! divination, merged into one outcome.

use rand::seq::SliceRandom;
use rand::Rng;

use super::winning_judgement::{judge, Judgement};
use crate::models::{
    player::PlayerId,
    role::Role,
    werewolf::{NightAction, Reveal, WerewolfGame},
};

#[derive(Debug, Clone, PartialEq)]
pub struct NightOutcome {
    /// Where the wolves' attack landed, before guard and fox immunity.
    pub wolf_target: Option<PlayerId>,
    pub victim: Option<PlayerId>,
    pub cursed: Option<PlayerId>,
    pub is_guarded: bool,
    pub guarded_id: Option<PlayerId>,
    pub seer_result: Option<Reveal>,
    pub dead_players: Vec<PlayerId>,
    pub judgement: Judgement,
}

/// Resolves the night described by `game` for the current `members`.
///
/// On the first night nobody is attacked and the seer keeps the pre-game
/// result. Never fails: missing actions fall back to a random attack or to
/// no result.
pub fn resolve_night<R: Rng + ?Sized>(
    game: &WerewolfGame,
    members: &[PlayerId],
    rng: &mut R,
) -> NightOutcome {
    let first_night = game.day_count <= 1;

    let wolf_target = if first_night {
        None
    } else {
        choose_wolf_target(game, members, rng)
    };

    let guard = acting_role(game, members, Role::Hunter);
    let guarded_id = guard.and_then(|action| action.target_id.clone());
    let is_guarded = match (&wolf_target, &guarded_id) {
        (Some(target), Some(guarded)) => target == guarded,
        _ => false,
    };

    let victim = wolf_target
        .as_ref()
        .filter(|target| !is_guarded && game.role_of(target) != Some(Role::Fox))
        .cloned();

    let mut seer_result = if first_night {
        game.last_seer_result.clone()
    } else {
        None
    };
    let mut cursed = None;
    if !first_night {
        let reading = acting_role(game, members, Role::Seer).and_then(|a| a.target_id.as_ref());
        if let Some(target) = reading {
            let role = game.role_of(target);
            seer_result = Some(Reveal {
                target_id: target.clone(),
                is_wolf: role == Some(Role::Werewolf),
            });
            if role == Some(Role::Fox) {
                cursed = Some(target.clone());
            }
        }
    }

    let mut dead_players = game.dead_players.clone();
    for id in victim.iter().chain(cursed.iter()) {
        if !dead_players.contains(id) {
            dead_players.push(id.clone());
        }
    }

    let judgement = judge(members, &game.role_assignment, &dead_players);

    NightOutcome {
        wolf_target,
        victim,
        cursed,
        is_guarded,
        guarded_id,
        seer_result,
        dead_players,
        judgement,
    }
}

/// The action submitted by the living holder of `role`, if any.
fn acting_role<'a>(
    game: &'a WerewolfGame,
    members: &[PlayerId],
    role: Role,
) -> Option<&'a NightAction> {
    game.holders_of(role)
        .filter(|id| game.is_alive(members, id))
        .find_map(|id| game.night_actions.get(id))
}

/// Picks among the living wolves' targets, preferring priority-flagged ones;
/// with no valid submission, any living non-wolf is attacked at random.
fn choose_wolf_target<R: Rng + ?Sized>(
    game: &WerewolfGame,
    members: &[PlayerId],
    rng: &mut R,
) -> Option<PlayerId> {
    let submissions: Vec<&NightAction> = game
        .holders_of(Role::Werewolf)
        .filter(|id| game.is_alive(members, id))
        .filter_map(|id| game.night_actions.get(id))
        .filter(|action| action.target_id.is_some())
        .collect();

    if submissions.is_empty() {
        let fallback: Vec<&PlayerId> = game
            .alive_members(members)
            .into_iter()
            .filter(|m| game.role_of(m) != Some(Role::Werewolf))
            .collect();
        return fallback.choose(rng).map(|id| (*id).clone());
    }

    let prioritized: Vec<&NightAction> =
        submissions.iter().copied().filter(|a| a.priority).collect();
    let candidates = if prioritized.is_empty() {
        submissions
    } else {
        prioritized
    };
    candidates.choose(rng).and_then(|action| action.target_id.clone())
}

/// Writes a night outcome into the game and moves the day counter on.
pub fn apply_night(game: &mut WerewolfGame, outcome: NightOutcome) {
    game.last_victim = outcome.victim;
    game.last_cursed = outcome.cursed;
    game.last_seer_result = outcome.seer_result;
    game.last_guarded_id = outcome.guarded_id;
    game.dead_players = outcome.dead_players;
    game.winner = outcome.judgement.winner;
    game.apparent_winner = outcome.judgement.apparent_winner;
    game.day_count += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Team;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::BTreeMap;

    fn game_with(roles: &[(&str, Role)], day_count: u32) -> (WerewolfGame, Vec<PlayerId>) {
        let members: Vec<PlayerId> = roles.iter().map(|(id, _)| id.to_string()).collect();
        let assignment: BTreeMap<PlayerId, Role> =
            roles.iter().map(|(id, r)| (id.to_string(), *r)).collect();
        let mut game = WerewolfGame::new(assignment, None);
        game.day_count = day_count;
        (game, members)
    }

    fn target(id: &str) -> NightAction {
        NightAction {
            target_id: Some(id.to_string()),
            ..NightAction::default()
        }
    }

    fn prioritized(id: &str) -> NightAction {
        NightAction {
            target_id: Some(id.to_string()),
            priority: true,
            ..NightAction::default()
        }
    }

    fn six_table(day: u32) -> (WerewolfGame, Vec<PlayerId>) {
        game_with(
            &[
                ("w1", Role::Werewolf),
                ("w2", Role::Werewolf),
                ("seer", Role::Seer),
                ("hunter", Role::Hunter),
                ("a", Role::Villager),
                ("b", Role::Villager),
                ("c", Role::Villager),
            ],
            day,
        )
    }

    #[test]
    fn first_night_never_kills() {
        for seed in 0..20 {
            let (mut game, members) = six_table(1);
            game.night_actions.insert(
                "w1".to_string(),
                NightAction {
                    target_id: None,
                    fake_role: Some(Role::Seer),
                    priority: true,
                },
            );
            let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(seed));
            assert_eq!(outcome.victim, None);
            assert_eq!(outcome.wolf_target, None);
            assert!(outcome.dead_players.is_empty());
        }
    }

    #[test]
    fn first_night_keeps_pre_game_seer_result() {
        let (mut game, members) = six_table(1);
        let pre_game = Reveal {
            target_id: "a".to_string(),
            is_wolf: false,
        };
        game.last_seer_result = Some(pre_game.clone());
        game.night_actions.insert("seer".to_string(), target("w1"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(3));
        assert_eq!(outcome.seer_result, Some(pre_game));
        assert_eq!(outcome.cursed, None);
    }

    #[test]
    fn single_wolf_target_is_killed() {
        let (mut game, members) = six_table(2);
        game.night_actions.insert("w1".to_string(), target("a"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(outcome.victim.as_deref(), Some("a"));
        assert_eq!(outcome.dead_players, vec!["a".to_string()]);
    }

    #[test]
    fn priority_submissions_win_over_plain_ones() {
        for seed in 0..30 {
            let (mut game, members) = six_table(2);
            game.night_actions.insert("w1".to_string(), target("a"));
            game.night_actions.insert("w2".to_string(), prioritized("b"));
            let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(seed));
            assert_eq!(outcome.wolf_target.as_deref(), Some("b"));
        }
    }

    #[test]
    fn explicit_none_falls_back_to_random_non_wolf() {
        for seed in 0..30 {
            let (mut game, members) = six_table(2);
            game.night_actions.insert("w1".to_string(), NightAction::default());
            let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(seed));
            let target = outcome.wolf_target.expect("fallback always picks someone");
            assert_ne!(game.role_of(&target), Some(Role::Werewolf));
        }
    }

    #[test]
    fn guard_nullifies_the_attack() {
        let (mut game, members) = six_table(2);
        game.night_actions.insert("w1".to_string(), target("a"));
        game.night_actions.insert("hunter".to_string(), target("a"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert!(outcome.is_guarded);
        assert_eq!(outcome.victim, None);
        assert_eq!(outcome.guarded_id.as_deref(), Some("a"));
        assert!(!outcome.dead_players.contains(&"a".to_string()));
    }

    #[test]
    fn guard_elsewhere_does_not_help() {
        let (mut game, members) = six_table(2);
        game.night_actions.insert("w1".to_string(), target("a"));
        game.night_actions.insert("hunter".to_string(), target("b"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert!(!outcome.is_guarded);
        assert_eq!(outcome.victim.as_deref(), Some("a"));
    }

    #[test]
    fn fox_survives_attack_but_dies_to_divination() {
        let (mut game, members) = game_with(
            &[
                ("w", Role::Werewolf),
                ("seer", Role::Seer),
                ("fox", Role::Fox),
                ("a", Role::Villager),
                ("b", Role::Villager),
            ],
            2,
        );
        game.night_actions.insert("w".to_string(), target("fox"));
        let attacked = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(attacked.wolf_target.as_deref(), Some("fox"));
        assert_eq!(attacked.victim, None);

        game.night_actions.insert("seer".to_string(), target("fox"));
        let divined = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(divined.cursed.as_deref(), Some("fox"));
        assert_eq!(divined.dead_players, vec!["fox".to_string()]);
        assert_eq!(
            divined.seer_result,
            Some(Reveal {
                target_id: "fox".to_string(),
                is_wolf: false
            })
        );
    }

    #[test]
    fn victim_and_cursed_both_die() {
        let (mut game, members) = game_with(
            &[
                ("w", Role::Werewolf),
                ("seer", Role::Seer),
                ("fox", Role::Fox),
                ("a", Role::Villager),
                ("b", Role::Villager),
                ("c", Role::Villager),
            ],
            2,
        );
        game.night_actions.insert("w".to_string(), target("a"));
        game.night_actions.insert("seer".to_string(), target("fox"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(outcome.dead_players, vec!["a".to_string(), "fox".to_string()]);
    }

    #[test]
    fn seer_detects_wolf() {
        let (mut game, members) = six_table(3);
        game.night_actions.insert("seer".to_string(), target("w2"));
        game.night_actions.insert("w1".to_string(), target("c"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(
            outcome.seer_result,
            Some(Reveal {
                target_id: "w2".to_string(),
                is_wolf: true
            })
        );
    }

    #[test]
    fn dead_seer_has_no_result() {
        let (mut game, members) = six_table(3);
        game.kill("seer");
        game.night_actions.insert("seer".to_string(), target("w2"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(outcome.seer_result, None);
    }

    #[test]
    fn killing_to_parity_gives_wolves_the_game() {
        let (mut game, members) = game_with(
            &[
                ("w", Role::Werewolf),
                ("a", Role::Villager),
                ("b", Role::Villager),
            ],
            2,
        );
        game.night_actions.insert("w".to_string(), target("a"));
        let outcome = resolve_night(&game, &members, &mut StdRng::seed_from_u64(0));
        assert_eq!(outcome.judgement.winner, Some(Team::Werewolves));

        apply_night(&mut game, outcome);
        assert_eq!(game.day_count, 3);
        assert_eq!(game.last_victim.as_deref(), Some("a"));
        assert_eq!(game.winner, Some(Team::Werewolves));
    }
}
