use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::Quiniela;

/// Request payload for creating a new quiniela
#[derive(Debug, Deserialize)]
pub struct CreateQuinielaRequest {
    pub name: String,
}

/// Request payload for adding a match to a quiniela
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatchRequest {
    pub home_team: String,
    pub away_team: String,
    pub date: DateTime<Utc>,
}

/// Partial update of a match's details. Omitted fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Final score of a match
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultRequest {
    pub home_score: u32,
    pub away_score: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub match_id: String,
    pub home_score: u32,
    pub away_score: u32,
}

/// Listing entry for a quiniela
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuinielaSummary {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub match_count: usize,
    pub participant_count: usize,
}

impl From<&Quiniela> for QuinielaSummary {
    fn from(quiniela: &Quiniela) -> Self {
        Self {
            id: quiniela.id.clone(),
            name: quiniela.name.clone(),
            created_by: quiniela.created_by.clone(),
            created_at: quiniela.created_at,
            match_count: quiniela.matches.len(),
            participant_count: quiniela.participants.len(),
        }
    }
}
