use serde::{Deserialize, Serialize};

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;

/// Deadline constants, in milliseconds.
///
/// Every timed phase gets a short grace period on top of its nominal length
/// so that clients rendering a countdown reach zero before the driver moves on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseTimings {
    pub role_check_ms: i64,
    pub announce_ms: i64,
    pub night_ms: i64,
    pub result_ms: i64,
    pub result_with_winner_ms: i64,
    pub voting_ms: i64,
    pub extension_ms: i64,
    pub exile_announcement_ms: i64,
    // grace periods
    pub short_grace_ms: i64,
    pub long_grace_ms: i64,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            role_check_ms: 10 * SECOND,
            announce_ms: 4 * SECOND,
            night_ms: MINUTE,
            result_ms: 6 * SECOND,
            result_with_winner_ms: 12 * SECOND,
            voting_ms: MINUTE,
            extension_ms: MINUTE,
            exile_announcement_ms: 5 * SECOND,
            short_grace_ms: SECOND,
            long_grace_ms: 2 * SECOND,
        }
    }
}

impl PhaseTimings {
    /// Discussion length for the number of players still in the game:
    /// up to 6 gets 4 minutes, up to 10 gets 7, anything larger gets 10.
    pub fn discussion_ms(&self, alive_count: usize) -> i64 {
        match alive_count {
            0..=6 => 4 * MINUTE,
            7..=10 => 7 * MINUTE,
            _ => 10 * MINUTE,
        }
    }

    pub fn role_check_deadline(&self, now: i64) -> i64 {
        now + self.role_check_ms + self.short_grace_ms
    }

    pub fn announce_deadline(&self, now: i64) -> i64 {
        now + self.announce_ms + self.short_grace_ms
    }

    pub fn night_deadline(&self, now: i64) -> i64 {
        now + self.night_ms + self.long_grace_ms
    }

    pub fn result_deadline(&self, now: i64, has_winner: bool) -> i64 {
        let base = if has_winner {
            self.result_with_winner_ms
        } else {
            self.result_ms
        };
        now + base + self.short_grace_ms
    }

    pub fn discussion_deadline(&self, now: i64, alive_count: usize) -> i64 {
        now + self.discussion_ms(alive_count) + self.long_grace_ms
    }

    pub fn werewolf_voting_deadline(&self, now: i64) -> i64 {
        now + self.voting_ms + self.long_grace_ms
    }

    pub fn opinion_voting_deadline(&self, now: i64) -> i64 {
        now + self.voting_ms
    }

    pub fn exile_announcement_deadline(&self, now: i64) -> i64 {
        now + self.exile_announcement_ms
    }
}
