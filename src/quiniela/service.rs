use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{
    clock::Clock,
    models::{Match, MatchResult, Participant, Prediction, Quiniela},
    repository::{QuinielaRepository, SaveQuinielaResult},
    types::{NewMatchRequest, PredictionRequest, QuinielaSummary, UpdateMatchRequest},
};
use crate::{
    scoring::{self, GlobalStanding, LeaderboardEntry, PoolPerformance},
    session::SessionClaims,
    shared::AppError,
};

/// Load/mutate/save cycles attempted before a version conflict is reported.
/// Every conflict means another writer committed, so this also bounds how
/// many simultaneous writers to one pool are all guaranteed to land.
const MAX_SAVE_ATTEMPTS: u32 = 10;

const RETRY_BASE_DELAY_MS: u64 = 5;
const RETRY_MAX_DELAY_MS: u64 = 100;

/// Service for quiniela business logic. Every change that can move points
/// runs the scoring engine before the record is saved.
pub struct QuinielaService {
    repository: Arc<dyn QuinielaRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

fn not_found() -> AppError {
    AppError::NotFound("Quiniela not found".to_string())
}

fn match_not_found(match_id: &str) -> AppError {
    AppError::NotFound(format!("Match {} not found", match_id))
}

/// Admins and the pool's creator may administer a quiniela
fn ensure_can_administer(caller: &SessionClaims, quiniela: &Quiniela) -> Result<(), AppError> {
    if caller.is_admin() || quiniela.is_creator(&caller.user_id) {
        Ok(())
    } else {
        warn!(
            user_id = %caller.user_id,
            quiniela_id = %quiniela.id,
            "Caller may not administer quiniela"
        );
        Err(AppError::Forbidden(
            "Only the creator or an admin can change this quiniela".to_string(),
        ))
    }
}

fn team_name(name: &str, side: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} team is required", side)));
    }
    Ok(name.to_string())
}

/// Jittered exponential backoff before the next save attempt
fn retry_delay(attempt: u32) -> Duration {
    let ceiling = RETRY_BASE_DELAY_MS
        .saturating_mul(1u64 << attempt.saturating_sub(1).min(16))
        .min(RETRY_MAX_DELAY_MS);
    Duration::from_millis(rand::rng().random_range(ceiling / 2..=ceiling))
}

fn ensure_distinct_teams(home_team: &str, away_team: &str) -> Result<(), AppError> {
    if home_team.eq_ignore_ascii_case(away_team) {
        return Err(AppError::Validation(
            "Home and away teams must be different".to_string(),
        ));
    }
    Ok(())
}

impl QuinielaService {
    pub fn new(repository: Arc<dyn QuinielaRepository + Send + Sync>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    async fn load(&self, quiniela_id: &str) -> Result<Quiniela, AppError> {
        self.repository
            .get_quiniela(quiniela_id)
            .await?
            .ok_or_else(not_found)
    }

    /// Applies `change` to a freshly loaded quiniela and saves it. A version
    /// conflict reloads and reapplies, so concurrent edits are merged rather
    /// than overwritten.
    async fn mutate<F>(&self, quiniela_id: &str, mut change: F) -> Result<Quiniela, AppError>
    where
        F: FnMut(&mut Quiniela) -> Result<(), AppError>,
    {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let mut quiniela = self.load(quiniela_id).await?;
            change(&mut quiniela)?;
            quiniela.last_updated = Some(self.clock.now());

            match self.repository.save_quiniela(&quiniela).await? {
                SaveQuinielaResult::Saved(saved) => return Ok(saved),
                SaveQuinielaResult::NotFound => return Err(not_found()),
                SaveQuinielaResult::VersionConflict { current_version } => {
                    warn!(
                        quiniela_id = %quiniela_id,
                        attempt,
                        loaded_version = quiniela.version,
                        current_version,
                        "Quiniela changed while saving, retrying"
                    );
                    if attempt < MAX_SAVE_ATTEMPTS {
                        tokio::time::sleep(retry_delay(attempt)).await;
                    }
                }
            }
        }

        Err(AppError::Conflict(
            "Quiniela was modified concurrently, please retry".to_string(),
        ))
    }

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn create_quiniela(
        &self,
        caller: &SessionClaims,
        name: &str,
    ) -> Result<Quiniela, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Quiniela name is required".to_string()));
        }

        let quiniela = Quiniela::new(name.to_string(), caller.user_id.clone(), self.clock.now());
        self.repository.create_quiniela(&quiniela).await?;

        info!(quiniela_id = %quiniela.id, name = %quiniela.name, "Quiniela created");
        Ok(quiniela)
    }

    #[instrument(skip(self))]
    pub async fn get_quiniela(&self, quiniela_id: &str) -> Result<Quiniela, AppError> {
        self.load(quiniela_id).await
    }

    /// Summaries of every quiniela, oldest first
    #[instrument(skip(self))]
    pub async fn list_quinielas(&self) -> Result<Vec<QuinielaSummary>, AppError> {
        let mut quinielas = self.repository.list_quinielas().await?;
        quinielas.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        debug!(quiniela_count = quinielas.len(), "Quinielas listed");
        Ok(quinielas.iter().map(QuinielaSummary::from).collect())
    }

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn delete_quiniela(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
    ) -> Result<(), AppError> {
        let quiniela = self.load(quiniela_id).await?;
        ensure_can_administer(caller, &quiniela)?;

        if !self.repository.delete_quiniela(quiniela_id).await? {
            return Err(not_found());
        }

        info!(
            quiniela_id = %quiniela_id,
            discarded_participants = quiniela.participants.len(),
            "Quiniela deleted"
        );
        Ok(())
    }

    /// Adds a match with no result yet
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn add_match(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        request: NewMatchRequest,
    ) -> Result<Match, AppError> {
        let home_team = team_name(&request.home_team, "Home")?;
        let away_team = team_name(&request.away_team, "Away")?;
        ensure_distinct_teams(&home_team, &away_team)?;

        let new_match = Match::new(home_team, away_team, request.date);
        let match_id = new_match.id.clone();

        let saved = self
            .mutate(quiniela_id, |quiniela| {
                ensure_can_administer(caller, quiniela)?;
                quiniela.matches.push(new_match.clone());
                Ok(())
            })
            .await?;

        info!(quiniela_id = %quiniela_id, match_id = %match_id, "Match added");
        saved
            .find_match(&match_id)
            .cloned()
            .ok_or(AppError::Internal)
    }

    /// Changes a match's teams or date. The result is untouched, so points don't move.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn update_match(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        match_id: &str,
        request: UpdateMatchRequest,
    ) -> Result<Match, AppError> {
        let home_team = request
            .home_team
            .as_deref()
            .map(|name| team_name(name, "Home"))
            .transpose()?;
        let away_team = request
            .away_team
            .as_deref()
            .map(|name| team_name(name, "Away"))
            .transpose()?;

        let saved = self
            .mutate(quiniela_id, |quiniela| {
                ensure_can_administer(caller, quiniela)?;
                let m = quiniela
                    .find_match_mut(match_id)
                    .ok_or_else(|| match_not_found(match_id))?;

                if let Some(home_team) = &home_team {
                    m.home_team = home_team.clone();
                }
                if let Some(away_team) = &away_team {
                    m.away_team = away_team.clone();
                }
                if let Some(date) = request.date {
                    m.date = date;
                }
                ensure_distinct_teams(&m.home_team, &m.away_team)
            })
            .await?;

        debug!(quiniela_id = %quiniela_id, match_id = %match_id, "Match details updated");
        saved
            .find_match(match_id)
            .cloned()
            .ok_or(AppError::Internal)
    }

    /// Sets or replaces a match's final score and rescores every participant
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn record_result(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        match_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> Result<Quiniela, AppError> {
        let saved = self
            .mutate(quiniela_id, |quiniela| {
                ensure_can_administer(caller, quiniela)?;
                let m = quiniela
                    .find_match_mut(match_id)
                    .ok_or_else(|| match_not_found(match_id))?;
                m.result = MatchResult::Final {
                    home: home_score,
                    away: away_score,
                };
                *quiniela = scoring::recompute_all(quiniela);
                Ok(())
            })
            .await?;

        info!(
            quiniela_id = %quiniela_id,
            match_id = %match_id,
            home_score,
            away_score,
            "Match result recorded"
        );
        Ok(saved)
    }

    /// Returns a match to pending and rescores every participant
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn clear_result(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        match_id: &str,
    ) -> Result<Quiniela, AppError> {
        let saved = self
            .mutate(quiniela_id, |quiniela| {
                ensure_can_administer(caller, quiniela)?;
                let m = quiniela
                    .find_match_mut(match_id)
                    .ok_or_else(|| match_not_found(match_id))?;
                m.result = MatchResult::Pending;
                *quiniela = scoring::recompute_all(quiniela);
                Ok(())
            })
            .await?;

        info!(quiniela_id = %quiniela_id, match_id = %match_id, "Match result cleared");
        Ok(saved)
    }

    /// Deletes a match along with every prediction made on it
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn remove_match(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        match_id: &str,
    ) -> Result<Quiniela, AppError> {
        let saved = self
            .mutate(quiniela_id, |quiniela| {
                ensure_can_administer(caller, quiniela)?;
                if quiniela.find_match(match_id).is_none() {
                    return Err(match_not_found(match_id));
                }
                *quiniela = scoring::remove_match(quiniela, match_id);
                Ok(())
            })
            .await?;

        info!(quiniela_id = %quiniela_id, match_id = %match_id, "Match removed");
        Ok(saved)
    }

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn join_quiniela(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
    ) -> Result<Participant, AppError> {
        let saved = self
            .mutate(quiniela_id, |quiniela| {
                if quiniela.has_participant(&caller.user_id) {
                    return Err(AppError::Conflict(
                        "Already participating in this quiniela".to_string(),
                    ));
                }
                quiniela
                    .participants
                    .push(Participant::new(caller.user_id.clone()));
                Ok(())
            })
            .await?;

        info!(quiniela_id = %quiniela_id, "Participant joined");
        saved
            .participant(&caller.user_id)
            .cloned()
            .ok_or(AppError::Internal)
    }

    /// Removes the caller from the pool. Other participants keep their points.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn leave_quiniela(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
    ) -> Result<(), AppError> {
        self.mutate(quiniela_id, |quiniela| {
            if quiniela.is_creator(&caller.user_id) {
                return Err(AppError::Forbidden(
                    "The creator cannot leave their own quiniela".to_string(),
                ));
            }
            quiniela
                .remove_participant(&caller.user_id)
                .map(|_| ())
                .ok_or_else(|| {
                    AppError::NotFound("Not participating in this quiniela".to_string())
                })
        })
        .await?;

        info!(quiniela_id = %quiniela_id, "Participant left");
        Ok(())
    }

    #[instrument(skip(self, caller), fields(caller_id = %caller.user_id))]
    pub async fn remove_participant(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        self.mutate(quiniela_id, |quiniela| {
            ensure_can_administer(caller, quiniela)?;
            quiniela
                .remove_participant(user_id)
                .map(|_| ())
                .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", user_id)))
        })
        .await?;

        info!(quiniela_id = %quiniela_id, removed_user_id = %user_id, "Participant removed");
        Ok(())
    }

    /// Stores the caller's guess for a match, replacing any earlier guess, and
    /// rescores the caller. Guesses are accepted until the day of the first match.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn submit_prediction(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
        request: PredictionRequest,
    ) -> Result<Participant, AppError> {
        let today = self.clock.now().date_naive();
        let prediction = Prediction {
            match_id: request.match_id,
            home_score: request.home_score,
            away_score: request.away_score,
        };

        let saved = self
            .mutate(quiniela_id, |quiniela| {
                let Quiniela {
                    matches,
                    participants,
                    ..
                } = quiniela;

                let participant = participants
                    .iter_mut()
                    .find(|p| p.user_id == caller.user_id)
                    .ok_or_else(|| {
                        AppError::Forbidden("Join the quiniela before predicting".to_string())
                    })?;

                if !matches.iter().any(|m| m.id == prediction.match_id) {
                    return Err(match_not_found(&prediction.match_id));
                }

                if let Some(first_kickoff) = matches.iter().map(|m| m.date).min() {
                    if today >= first_kickoff.date_naive() {
                        return Err(AppError::Forbidden(
                            "Predictions are closed for this quiniela".to_string(),
                        ));
                    }
                }

                participant.upsert_prediction(prediction.clone());
                *participant = scoring::recompute_participant(participant, matches);
                Ok(())
            })
            .await?;

        debug!(
            quiniela_id = %quiniela_id,
            match_id = %prediction.match_id,
            "Prediction saved"
        );
        saved
            .participant(&caller.user_id)
            .cloned()
            .ok_or(AppError::Internal)
    }

    /// Rescores every participant from the current match results
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn calculate_results(
        &self,
        caller: &SessionClaims,
        quiniela_id: &str,
    ) -> Result<Quiniela, AppError> {
        let saved = self
            .mutate(quiniela_id, |quiniela| {
                ensure_can_administer(caller, quiniela)?;
                *quiniela = scoring::recompute_all(quiniela);
                Ok(())
            })
            .await?;

        info!(
            quiniela_id = %quiniela_id,
            participant_count = saved.participants.len(),
            "Results calculated"
        );
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn leaderboard(&self, quiniela_id: &str) -> Result<Vec<LeaderboardEntry>, AppError> {
        let quiniela = self.load(quiniela_id).await?;
        Ok(scoring::rank_participants(&quiniela.participants))
    }

    /// Standings summed over every quiniela
    #[instrument(skip(self))]
    pub async fn global_leaderboard(&self) -> Result<Vec<GlobalStanding>, AppError> {
        let mut quinielas = self.repository.list_quinielas().await?;
        quinielas.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let standings = scoring::global_leaderboard(&quinielas);

        debug!(
            quiniela_count = quinielas.len(),
            user_count = standings.len(),
            "Global leaderboard built"
        );
        Ok(standings)
    }

    /// How the user is doing in each quiniela they joined
    #[instrument(skip(self))]
    pub async fn user_stats(&self, user_id: &str) -> Result<Vec<PoolPerformance>, AppError> {
        let quinielas = self.repository.list_quinielas().await?;
        Ok(scoring::user_performance(&quinielas, user_id))
    }
}
