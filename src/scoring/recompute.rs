use std::collections::HashMap;

use super::points::score;
use crate::quiniela::models::{Match, Participant, Quiniela};

/// Returns a copy of the participant with orphaned predictions purged and
/// `points` recomputed from the given matches.
///
/// A prediction is orphaned when its match is not among `matches`. Matches
/// without a result contribute 0.
pub fn recompute_participant(participant: &Participant, matches: &[Match]) -> Participant {
    let by_id: HashMap<&str, &Match> = matches.iter().map(|m| (m.id.as_str(), m)).collect();
    recompute_with_index(participant, &by_id)
}

fn recompute_with_index(participant: &Participant, by_id: &HashMap<&str, &Match>) -> Participant {
    let predictions: Vec<_> = participant
        .predictions
        .iter()
        .filter(|p| by_id.contains_key(p.match_id.as_str()))
        .cloned()
        .collect();

    let points = predictions
        .iter()
        .map(|p| score(p, by_id[p.match_id.as_str()]))
        .sum();

    Participant {
        predictions,
        points,
        ..participant.clone()
    }
}

/// Recomputes every participant of the quiniela against its matches.
/// Matches are returned unchanged.
pub fn recompute_all(quiniela: &Quiniela) -> Quiniela {
    let by_id: HashMap<&str, &Match> = quiniela
        .matches
        .iter()
        .map(|m| (m.id.as_str(), m))
        .collect();

    let participants = quiniela
        .participants
        .iter()
        .map(|p| recompute_with_index(p, &by_id))
        .collect();

    Quiniela {
        participants,
        ..quiniela.clone()
    }
}

/// Removes a match, purges every prediction referencing it and recomputes all
/// participants. Unknown match IDs leave the matches untouched.
pub fn remove_match(quiniela: &Quiniela, match_id: &str) -> Quiniela {
    let mut updated = quiniela.clone();
    updated.matches.retain(|m| m.id != match_id);
    for participant in &mut updated.participants {
        participant.remove_predictions_for(match_id);
    }
    recompute_all(&updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiniela::models::{MatchResult, Prediction};
    use chrono::Utc;
    use rand::Rng;

    fn game(id: &str, result: MatchResult) -> Match {
        Match {
            id: id.into(),
            home_team: format!("{id}-home"),
            away_team: format!("{id}-away"),
            date: Utc::now(),
            result,
        }
    }

    fn guess(match_id: &str, home_score: u32, away_score: u32) -> Prediction {
        Prediction {
            match_id: match_id.into(),
            home_score,
            away_score,
        }
    }

    fn participant(user_id: &str, predictions: Vec<Prediction>) -> Participant {
        Participant {
            id: None,
            user_id: user_id.into(),
            predictions,
            points: 0,
        }
    }

    fn pool(matches: Vec<Match>, participants: Vec<Participant>) -> Quiniela {
        let mut quiniela = Quiniela::new("Test".into(), "admin".into(), Utc::now());
        quiniela.matches = matches;
        quiniela.participants = participants;
        quiniela
    }

    #[test]
    fn decided_and_undecided_matches() {
        let quiniela = pool(
            vec![
                game("a", MatchResult::Final { home: 1, away: 0 }),
                game("b", MatchResult::Pending),
            ],
            vec![participant("p1", vec![guess("a", 1, 0), guess("b", 2, 0)])],
        );

        let updated = recompute_all(&quiniela);
        assert_eq!(updated.participants[0].points, 4);
        assert_eq!(updated.matches, quiniela.matches);
    }

    #[test]
    fn stale_points_are_replaced_not_accumulated() {
        let mut p = participant("p1", vec![guess("a", 2, 0)]);
        p.points = 99;
        let matches = vec![game("a", MatchResult::Final { home: 1, away: 0 })];

        let updated = recompute_participant(&p, &matches);
        assert_eq!(updated.points, 1);
        assert_eq!(updated.user_id, "p1");
    }

    #[test]
    fn orphaned_predictions_are_purged_and_score_nothing() {
        let p = participant("p1", vec![guess("gone", 1, 0), guess("a", 0, 2)]);
        let matches = vec![game("a", MatchResult::Final { home: 0, away: 2 })];

        let updated = recompute_participant(&p, &matches);
        assert_eq!(updated.points, 4);
        assert_eq!(updated.predictions.len(), 1);
        assert!(updated.prediction_for("gone").is_none());
    }

    #[test]
    fn participant_without_predictions_scores_zero() {
        let quiniela = pool(
            vec![game("a", MatchResult::Final { home: 3, away: 3 })],
            vec![participant("p1", vec![])],
        );

        assert_eq!(recompute_all(&quiniela).participants[0].points, 0);
    }

    #[test]
    fn removing_a_match_subtracts_only_its_contribution() {
        let quiniela = pool(
            vec![
                game("a", MatchResult::Final { home: 1, away: 1 }),
                game("b", MatchResult::Final { home: 0, away: 1 }),
            ],
            vec![
                participant("p1", vec![guess("a", 2, 2), guess("b", 0, 3)]),
                participant("p2", vec![guess("b", 0, 1)]),
            ],
        );
        let before = recompute_all(&quiniela);
        assert_eq!(before.participants[0].points, 5);
        assert_eq!(before.participants[1].points, 4);

        let after = remove_match(&before, "b");
        assert_eq!(after.matches.len(), 1);
        assert_eq!(after.participants[0].points, 5 - 3);
        assert_eq!(after.participants[1].points, 0);
        assert!(after.participants[1].predictions.is_empty());
    }

    #[test]
    fn removing_unknown_match_leaves_pool_unchanged() {
        let quiniela = recompute_all(&pool(
            vec![game("a", MatchResult::Final { home: 2, away: 0 })],
            vec![participant("p1", vec![guess("a", 1, 0)])],
        ));

        let after = remove_match(&quiniela, "missing");
        assert_eq!(after, quiniela);
    }

    fn random_pool(rng: &mut impl Rng) -> Quiniela {
        let matches: Vec<Match> = (0..rng.random_range(1..8))
            .map(|i| {
                let result = if rng.random_bool(0.7) {
                    MatchResult::Final {
                        home: rng.random_range(0..5),
                        away: rng.random_range(0..5),
                    }
                } else {
                    MatchResult::Pending
                };
                game(&format!("m{i}"), result)
            })
            .collect();

        let participants = (0..rng.random_range(0..6))
            .map(|i| {
                let mut predictions = Vec::new();
                for m in &matches {
                    if rng.random_bool(0.8) {
                        predictions.push(guess(
                            &m.id,
                            rng.random_range(0..5),
                            rng.random_range(0..5),
                        ));
                    }
                }
                let mut p = participant(&format!("user-{i}"), predictions);
                p.points = rng.random_range(0..50);
                p
            })
            .collect();

        pool(matches, participants)
    }

    #[test]
    fn recompute_all_is_idempotent() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let quiniela = random_pool(&mut rng);
            let once = recompute_all(&quiniela);
            let twice = recompute_all(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn points_equal_sum_of_prediction_scores() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let updated = recompute_all(&random_pool(&mut rng));
            for p in &updated.participants {
                let expected: u32 = p
                    .predictions
                    .iter()
                    .filter_map(|pred| {
                        updated
                            .find_match(&pred.match_id)
                            .map(|m| score(pred, m))
                    })
                    .sum();
                assert_eq!(p.points, expected);
            }
        }
    }
}
