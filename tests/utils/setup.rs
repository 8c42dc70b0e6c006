use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use quiniela::{
    create_router,
    session::{Role, TokenConfig},
    AppState, FixedClock, InMemoryQuinielaRepository, QuinielaRepository,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

const TEST_SECRET: &str = "integration-secret";

/// Opening match of the fixtures; the default clock sits ten days before it
pub fn kickoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 11, 19, 0, 0).unwrap()
}

pub struct TestSetup {
    pub app: Router,
    pub repository: Arc<dyn QuinielaRepository + Send + Sync>,
    token_config: TokenConfig,
    admins: HashSet<String>,
}

impl TestSetup {
    /// Mints a bearer token for the user, as the external issuer would
    pub fn token_for(&self, user_id: &str) -> String {
        let role = if self.admins.contains(user_id) {
            Role::Admin
        } else {
            Role::User
        };
        self.token_config
            .create_token(user_id, role, chrono::Duration::days(1))
            .unwrap()
    }
}

pub struct TestSetupBuilder {
    now: DateTime<Utc>,
    admins: Vec<String>,
    repository: Option<Arc<dyn QuinielaRepository + Send + Sync>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            now: kickoff() - chrono::Duration::days(10),
            admins: vec![],
            repository: None,
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_admin(mut self, user_id: &str) -> Self {
        self.admins.push(user_id.to_string());
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn QuinielaRepository + Send + Sync>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build(self) -> TestSetup {
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryQuinielaRepository::new()));
        let token_config = TokenConfig::new(TEST_SECRET.to_string());

        let app_state = AppState::new(
            Arc::clone(&repository),
            token_config.clone(),
            Arc::new(FixedClock::new(self.now)),
        );

        TestSetup {
            app: create_router(app_state),
            repository,
            token_config,
            admins: self.admins.into_iter().collect(),
        }
    }
}
