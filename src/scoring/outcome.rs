use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Categorical result of a (home, away) score pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
pub enum Outcome {
    Home,
    Away,
    Draw,
}

/// Classifies a score pair as a home win, away win or draw
pub fn classify(home_score: u32, away_score: u32) -> Outcome {
    match home_score.cmp(&away_score) {
        std::cmp::Ordering::Greater => Outcome::Home,
        std::cmp::Ordering::Less => Outcome::Away,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}
