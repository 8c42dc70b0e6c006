use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{quiniela, session, shared::AppState};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router. Everything but `/health` requires a bearer token.
pub fn create_router(app_state: AppState) -> Router {
    let quiniela_routes = Router::new()
        .route(
            "/quinielas",
            get(quiniela::list_quinielas).post(quiniela::create_quiniela),
        )
        .route(
            "/quinielas/:id",
            get(quiniela::get_quiniela).delete(quiniela::delete_quiniela),
        )
        .route("/quinielas/:id/leaderboard", get(quiniela::leaderboard))
        .route("/quinielas/:id/calculate", post(quiniela::calculate_results))
        .route("/quinielas/:id/matches", post(quiniela::add_match))
        .route(
            "/quinielas/:id/matches/:match_id",
            put(quiniela::update_match).delete(quiniela::remove_match),
        )
        .route(
            "/quinielas/:id/matches/:match_id/result",
            put(quiniela::record_result).delete(quiniela::clear_result),
        )
        .route(
            "/quinielas/:id/participants",
            post(quiniela::join_quiniela).delete(quiniela::leave_quiniela),
        )
        .route(
            "/quinielas/:id/participants/:user_id",
            delete(quiniela::remove_participant),
        )
        .route("/quinielas/:id/predictions", put(quiniela::submit_prediction))
        .route("/leaderboard", get(quiniela::global_leaderboard))
        .route("/users/:user_id/stats", get(quiniela::user_stats))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            session::jwt_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(quiniela_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
