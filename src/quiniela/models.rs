use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recorded result of a match. Both goal counts are set together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchResult {
    #[default]
    Pending,
    Final { home: u32, away: u32 },
}

impl MatchResult {
    pub fn is_final(&self) -> bool {
        matches!(self, MatchResult::Final { .. })
    }

    /// Goal counts as (home, away), if recorded
    pub fn scores(&self) -> Option<(u32, u32)> {
        match self {
            MatchResult::Pending => None,
            MatchResult::Final { home, away } => Some((*home, *away)),
        }
    }
}

/// A single football game within a quiniela
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatchRecord", into = "MatchRecord")]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub date: DateTime<Utc>,
    pub result: MatchResult,
}

impl Match {
    /// Creates a new match with a generated ID and no result
    pub fn new(home_team: String, away_team: String, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            home_team,
            away_team,
            date,
            result: MatchResult::Pending,
        }
    }
}

/// Flat record shape of a match as stored and transported:
/// `{id, homeTeam, awayTeam, date, homeScore?, awayScore?}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchRecord {
    id: String,
    home_team: String,
    away_team: String,
    date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    away_score: Option<u32>,
}

impl TryFrom<MatchRecord> for Match {
    type Error = String;

    fn try_from(record: MatchRecord) -> Result<Self, Self::Error> {
        let result = match (record.home_score, record.away_score) {
            (Some(home), Some(away)) => MatchResult::Final { home, away },
            (None, None) => MatchResult::Pending,
            _ => {
                return Err(format!(
                    "match {} has only one side of its result set",
                    record.id
                ))
            }
        };

        Ok(Self {
            id: record.id,
            home_team: record.home_team,
            away_team: record.away_team,
            date: record.date,
            result,
        })
    }
}

impl From<Match> for MatchRecord {
    fn from(m: Match) -> Self {
        let (home_score, away_score) = match m.result.scores() {
            Some((home, away)) => (Some(home), Some(away)),
            None => (None, None),
        };

        Self {
            id: m.id,
            home_team: m.home_team,
            away_team: m.away_team,
            date: m.date,
            home_score,
            away_score,
        }
    }
}

/// A participant's guessed score for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub match_id: String,
    pub home_score: u32,
    pub away_score: u32,
}

/// A user's membership and scoring record within one quiniela
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    /// Cached total, always derived from predictions and match results
    #[serde(default)]
    pub points: u32,
}

impl Participant {
    pub fn new(user_id: String) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            user_id,
            predictions: Vec::new(),
            points: 0,
        }
    }

    pub fn prediction_for(&self, match_id: &str) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.match_id == match_id)
    }

    /// Inserts the prediction or replaces the existing one for the same match
    pub fn upsert_prediction(&mut self, prediction: Prediction) {
        match self
            .predictions
            .iter_mut()
            .find(|p| p.match_id == prediction.match_id)
        {
            Some(existing) => *existing = prediction,
            None => self.predictions.push(prediction),
        }
    }

    /// Drops every prediction for the given match, returning how many were removed
    pub fn remove_predictions_for(&mut self, match_id: &str) -> usize {
        let before = self.predictions.len();
        self.predictions.retain(|p| p.match_id != match_id);
        before - self.predictions.len()
    }
}

/// A named pool of matches and participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiniela {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Bumped by the repository on every successful save
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Quiniela {
    /// Creates a new, empty quiniela with a generated ID
    pub fn new(name: String, created_by: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_by,
            created_at,
            matches: Vec::new(),
            participants: Vec::new(),
            version: 0,
            last_updated: None,
        }
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    pub fn find_match(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn find_match_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    /// Removes a participant and returns their record, discarding it from the pool
    pub fn remove_participant(&mut self, user_id: &str) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.user_id == user_id)?;
        Some(self.participants.remove(index))
    }

    /// Kick-off of the earliest match, if any
    pub fn first_match_date(&self) -> Option<DateTime<Utc>> {
        self.matches.iter().map(|m| m.date).min()
    }
}
