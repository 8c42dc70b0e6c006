use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{Match, Participant, Quiniela},
    service::QuinielaService,
    types::{
        CreateQuinielaRequest, MatchResultRequest, NewMatchRequest, PredictionRequest,
        QuinielaSummary, UpdateMatchRequest,
    },
};
use crate::{
    scoring::{GlobalStanding, LeaderboardEntry, PoolPerformance},
    session::SessionClaims,
    shared::{AppError, AppState},
};

fn quiniela_service(state: &AppState) -> QuinielaService {
    QuinielaService::new(
        Arc::clone(&state.quiniela_repository),
        Arc::clone(&state.clock),
    )
}

/// HTTP handler for creating a new quiniela
///
/// POST /quinielas
/// The caller becomes the quiniela's creator
#[instrument(name = "create_quiniela", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn create_quiniela(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<CreateQuinielaRequest>,
) -> Result<Json<Quiniela>, AppError> {
    info!(name = %request.name, "Creating new quiniela");

    let quiniela = quiniela_service(&state)
        .create_quiniela(&claims, &request.name)
        .await?;

    Ok(Json(quiniela))
}

/// HTTP handler for listing all quinielas
///
/// GET /quinielas
#[instrument(name = "list_quinielas", skip(state))]
pub async fn list_quinielas(
    State(state): State<AppState>,
) -> Result<Json<Vec<QuinielaSummary>>, AppError> {
    let quinielas = quiniela_service(&state).list_quinielas().await?;

    info!(quiniela_count = quinielas.len(), "Quinielas listed successfully");

    Ok(Json(quinielas))
}

/// GET /quinielas/:id
#[instrument(name = "get_quiniela", skip(state))]
pub async fn get_quiniela(
    State(state): State<AppState>,
    Path(quiniela_id): Path<String>,
) -> Result<Json<Quiniela>, AppError> {
    let quiniela = quiniela_service(&state).get_quiniela(&quiniela_id).await?;
    Ok(Json(quiniela))
}

/// DELETE /quinielas/:id
#[instrument(name = "delete_quiniela", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn delete_quiniela(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(quiniela_id): Path<String>,
) -> Result<StatusCode, AppError> {
    quiniela_service(&state)
        .delete_quiniela(&claims, &quiniela_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// HTTP handler for the standings of a quiniela
///
/// GET /quinielas/:id/leaderboard
/// Participants ordered by points, with ranks and winners marked
#[instrument(name = "leaderboard", skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    Path(quiniela_id): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let entries = quiniela_service(&state).leaderboard(&quiniela_id).await?;
    Ok(Json(entries))
}

/// HTTP handler for the standings across every quiniela
///
/// GET /leaderboard
#[instrument(name = "global_leaderboard", skip(state))]
pub async fn global_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<GlobalStanding>>, AppError> {
    let standings = quiniela_service(&state).global_leaderboard().await?;

    info!(user_count = standings.len(), "Global leaderboard served");

    Ok(Json(standings))
}

/// GET /users/:user_id/stats
#[instrument(name = "user_stats", skip(state))]
pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PoolPerformance>>, AppError> {
    let stats = quiniela_service(&state).user_stats(&user_id).await?;
    Ok(Json(stats))
}

/// POST /quinielas/:id/calculate
#[instrument(name = "calculate_results", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn calculate_results(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(quiniela_id): Path<String>,
) -> Result<Json<Quiniela>, AppError> {
    let quiniela = quiniela_service(&state)
        .calculate_results(&claims, &quiniela_id)
        .await?;
    Ok(Json(quiniela))
}

/// POST /quinielas/:id/matches
#[instrument(name = "add_match", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn add_match(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(quiniela_id): Path<String>,
    Json(request): Json<NewMatchRequest>,
) -> Result<Json<Match>, AppError> {
    let m = quiniela_service(&state)
        .add_match(&claims, &quiniela_id, request)
        .await?;
    Ok(Json(m))
}

/// PUT /quinielas/:id/matches/:match_id
#[instrument(name = "update_match", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn update_match(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((quiniela_id, match_id)): Path<(String, String)>,
    Json(request): Json<UpdateMatchRequest>,
) -> Result<Json<Match>, AppError> {
    let m = quiniela_service(&state)
        .update_match(&claims, &quiniela_id, &match_id, request)
        .await?;
    Ok(Json(m))
}

/// DELETE /quinielas/:id/matches/:match_id
#[instrument(name = "remove_match", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn remove_match(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((quiniela_id, match_id)): Path<(String, String)>,
) -> Result<Json<Quiniela>, AppError> {
    let quiniela = quiniela_service(&state)
        .remove_match(&claims, &quiniela_id, &match_id)
        .await?;
    Ok(Json(quiniela))
}

/// HTTP handler for recording a match's final score
///
/// PUT /quinielas/:id/matches/:match_id/result
/// Returns the quiniela with every participant rescored
#[instrument(name = "record_result", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn record_result(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((quiniela_id, match_id)): Path<(String, String)>,
    Json(request): Json<MatchResultRequest>,
) -> Result<Json<Quiniela>, AppError> {
    let quiniela = quiniela_service(&state)
        .record_result(
            &claims,
            &quiniela_id,
            &match_id,
            request.home_score,
            request.away_score,
        )
        .await?;
    Ok(Json(quiniela))
}

/// DELETE /quinielas/:id/matches/:match_id/result
#[instrument(name = "clear_result", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn clear_result(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((quiniela_id, match_id)): Path<(String, String)>,
) -> Result<Json<Quiniela>, AppError> {
    let quiniela = quiniela_service(&state)
        .clear_result(&claims, &quiniela_id, &match_id)
        .await?;
    Ok(Json(quiniela))
}

/// POST /quinielas/:id/participants
#[instrument(name = "join_quiniela", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn join_quiniela(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(quiniela_id): Path<String>,
) -> Result<Json<Participant>, AppError> {
    let participant = quiniela_service(&state)
        .join_quiniela(&claims, &quiniela_id)
        .await?;
    Ok(Json(participant))
}

/// DELETE /quinielas/:id/participants
#[instrument(name = "leave_quiniela", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn leave_quiniela(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(quiniela_id): Path<String>,
) -> Result<StatusCode, AppError> {
    quiniela_service(&state)
        .leave_quiniela(&claims, &quiniela_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /quinielas/:id/participants/:user_id
#[instrument(name = "remove_participant", skip(state, claims), fields(caller_id = %claims.user_id))]
pub async fn remove_participant(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((quiniela_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    quiniela_service(&state)
        .remove_participant(&claims, &quiniela_id, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// HTTP handler for submitting or replacing a prediction
///
/// PUT /quinielas/:id/predictions
/// Returns the caller's participant record with refreshed points
#[instrument(name = "submit_prediction", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn submit_prediction(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(quiniela_id): Path<String>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<Participant>, AppError> {
    let participant = quiniela_service(&state)
        .submit_prediction(&claims, &quiniela_id, request)
        .await?;
    Ok(Json(participant))
}
