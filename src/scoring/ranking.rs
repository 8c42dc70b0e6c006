use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quiniela::models::{Participant, Quiniela};

/// One row of a quiniela leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub points: u32,
    pub predictions: u32,
    pub winner: bool,
}

/// A user's standing summed over every quiniela they take part in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStanding {
    pub rank: u32,
    pub user_id: String,
    pub total_points: u32,
    pub quinielas_participated: u32,
}

/// How one user is doing in one quiniela
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPerformance {
    pub quiniela_id: String,
    pub name: String,
    pub user_points: u32,
    /// Best score in the quiniela
    pub max_points: u32,
    pub position: u32,
    pub total_participants: u32,
}

/// Competition ranks (1, 1, 3) for scores already sorted highest first
fn competition_ranks(sorted_points: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut ranks = Vec::new();
    let mut rank = 0;
    let mut previous = None;

    for (index, points) in sorted_points.into_iter().enumerate() {
        if previous != Some(points) {
            rank = index as u32 + 1;
            previous = Some(points);
        }
        ranks.push(rank);
    }

    ranks
}

/// Orders participants by cached points, highest first, using competition
/// ranking (1, 1, 3). Everyone tied on the top score is flagged as a winner.
/// Ties keep the participants' original order.
pub fn rank_participants(participants: &[Participant]) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by(|a, b| b.points.cmp(&a.points));

    let top = sorted.first().map(|p| p.points);
    let ranks = competition_ranks(sorted.iter().map(|p| p.points));

    sorted
        .into_iter()
        .zip(ranks)
        .map(|(participant, rank)| LeaderboardEntry {
            rank,
            user_id: participant.user_id.clone(),
            points: participant.points,
            predictions: participant.predictions.len() as u32,
            winner: top == Some(participant.points),
        })
        .collect()
}

/// Sums each user's cached points across all quinielas, highest total first.
/// Users tied on total keep the order in which they were first seen.
pub fn global_leaderboard(quinielas: &[Quiniela]) -> Vec<GlobalStanding> {
    let mut standings: Vec<GlobalStanding> = Vec::new();
    let mut index_by_user: HashMap<&str, usize> = HashMap::new();

    for participant in quinielas.iter().flat_map(|q| &q.participants) {
        let index = *index_by_user
            .entry(participant.user_id.as_str())
            .or_insert_with(|| {
                standings.push(GlobalStanding {
                    rank: 0,
                    user_id: participant.user_id.clone(),
                    total_points: 0,
                    quinielas_participated: 0,
                });
                standings.len() - 1
            });

        let standing = &mut standings[index];
        standing.total_points += participant.points;
        standing.quinielas_participated += 1;
    }

    standings.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    let ranks = competition_ranks(standings.iter().map(|s| s.total_points));
    for (standing, rank) in standings.iter_mut().zip(ranks) {
        standing.rank = rank;
    }

    standings
}

/// The user's points and position in every quiniela they joined, best
/// scoring quiniela first. Position uses the same ranks as the leaderboard.
pub fn user_performance(quinielas: &[Quiniela], user_id: &str) -> Vec<PoolPerformance> {
    let mut performance: Vec<PoolPerformance> = quinielas
        .iter()
        .filter_map(|quiniela| {
            let entries = rank_participants(&quiniela.participants);
            let own = entries.iter().find(|e| e.user_id == user_id)?;

            Some(PoolPerformance {
                quiniela_id: quiniela.id.clone(),
                name: quiniela.name.clone(),
                user_points: own.points,
                max_points: entries.first().map(|e| e.points).unwrap_or_default(),
                position: own.rank,
                total_participants: entries.len() as u32,
            })
        })
        .collect();

    performance.sort_by(|a, b| b.user_points.cmp(&a.user_points));
    performance
}
