use super::outcome::{classify, Outcome};
use crate::quiniela::models::{Match, MatchResult, Prediction};

/// Fixed point table. The home/away asymmetry is intentional.
pub mod point_table {
    pub const MISS: u32 = 0;
    pub const HOME_WIN: u32 = 1;
    pub const DRAW: u32 = 2;
    pub const AWAY_WIN: u32 = 3;
    pub const EXACT_SCORE: u32 = 4;
}

/// Points earned by a single prediction against its match.
///
/// A match without a recorded result scores 0. An exact score beats the
/// outcome check; otherwise a correct outcome earns the value of that outcome
/// in [`point_table`] and a wrong one earns nothing.
///
/// The caller guarantees `prediction.match_id == m.id`.
pub fn score(prediction: &Prediction, m: &Match) -> u32 {
    debug_assert_eq!(prediction.match_id, m.id);

    let (home, away) = match m.result {
        MatchResult::Pending => return point_table::MISS,
        MatchResult::Final { home, away } => (home, away),
    };

    if prediction.home_score == home && prediction.away_score == away {
        return point_table::EXACT_SCORE;
    }

    let predicted = classify(prediction.home_score, prediction.away_score);
    let actual = classify(home, away);

    if predicted != actual {
        return point_table::MISS;
    }

    match actual {
        Outcome::Home => point_table::HOME_WIN,
        Outcome::Draw => point_table::DRAW,
        Outcome::Away => point_table::AWAY_WIN,
    }
}
