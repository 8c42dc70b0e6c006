use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::quiniela::clock::Clock;
use crate::quiniela::repository::QuinielaRepository;
use crate::session::TokenConfig;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub quiniela_repository: Arc<dyn QuinielaRepository + Send + Sync>,
    pub token_config: TokenConfig,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        quiniela_repository: Arc<dyn QuinielaRepository + Send + Sync>,
        token_config: TokenConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quiniela_repository,
            token_config,
            clock,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::quiniela::clock::FixedClock;
    use crate::quiniela::repository::InMemoryQuinielaRepository;
    use chrono::{DateTime, TimeZone, Utc};

    pub const TEST_SECRET: &str = "test-secret";

    /// Default "now" for tests: well before the matches test fixtures schedule
    pub fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        quiniela_repository: Option<Arc<dyn QuinielaRepository + Send + Sync>>,
        clock: Option<Arc<dyn Clock>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                quiniela_repository: None,
                clock: None,
            }
        }

        pub fn with_quiniela_repository(
            mut self,
            repo: Arc<dyn QuinielaRepository + Send + Sync>,
        ) -> Self {
            self.quiniela_repository = Some(repo);
            self
        }

        pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
            self.clock = Some(clock);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                quiniela_repository: self
                    .quiniela_repository
                    .unwrap_or_else(|| Arc::new(InMemoryQuinielaRepository::new())),
                token_config: TokenConfig::new(TEST_SECRET.to_string()),
                clock: self
                    .clock
                    .unwrap_or_else(|| Arc::new(FixedClock::new(test_now()))),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    #[test]
    fn errors_map_to_status_codes() {
        let cases = vec![
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::DatabaseError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
