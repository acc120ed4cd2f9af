use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Normal,
    Romance,
    Taboo, // only offered to ad-blocked rooms
}

const NORMAL: &[&str] = &[
    "Do you prefer 'Bamboo Shoot' snacks over 'Mushroom' ones?",
    "Do you prefer Consomme flavor chips over Salted?",
    "Do you prefer Rice over Bread for breakfast?",
    "Do you like Winter more than Summer?",
    "Do you love thrill rides and roller coasters?",
    "Are you a Cat person rather than a Dog person?",
    "Do you put Soy Sauce on fried eggs?",
    "Do you drink all the Ramen broth?",
    "Should you take a bath at night rather than in the morning?",
    "Would you save the money if you won the lottery?",
];

const ROMANCE: &[&str] = &[
    "Are looks the deciding factor for a first impression?",
    "Do you want to contact your partner every day?",
    "Do you keep gifts from your ex-partners?",
    "Do you prioritize Love over Friendship?",
    "Do you seek Excitement over Stability in a partner?",
    "Do you believe in love at first sight?",
    "Can men and women be just friends?",
    "Should date costs be split 50/50?",
];

const TABOO: &[&str] = &[
    "Is it inevitable to be attracted to others while in a relationship?",
    "Is your desire to dominate stronger than being dominated?",
    "Is meeting someone 1-on-1 considered cheating?",
    "Can money buy love?",
    "Do you have a dark past you can never tell anyone?",
];

impl Genre {
    pub fn topics(self) -> &'static [&'static str] {
        match self {
            Genre::Normal => NORMAL,
            Genre::Romance => ROMANCE,
            Genre::Taboo => TABOO,
        }
    }

    pub fn requires_ad_block(self) -> bool {
        self == Genre::Taboo
    }

    pub fn random_topic<R: Rng + ?Sized>(self, rng: &mut R) -> Option<&'static str> {
        self.topics().choose(rng).copied()
    }
}
