use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Werewolf,
    Madman,
    Seer,
    Medium,
    Hunter, // guards one player per night
    Villager,
    Twins,
    Fox,
}

/// Winning faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Villagers,
    Werewolves,
    Fox,
}

impl Role {
    /// Roles a first-night werewolf may claim in their cosmetic declaration.
    pub const FAKE_ROLE_OPTIONS: [Role; 6] = [
        Role::Villager,
        Role::Seer,
        Role::Medium,
        Role::Hunter,
        Role::Madman,
        Role::Twins,
    ];

    pub fn is_werewolf(self) -> bool {
        self == Role::Werewolf
    }
}
