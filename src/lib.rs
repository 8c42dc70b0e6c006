// Library crate for the quiniela server
// This file exposes the public API for integration tests

pub mod config;
pub mod quiniela;
pub mod router;
pub mod scoring;
pub mod session;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use config::{ServerConfig, StorageBackend};
pub use quiniela::{
    clock::{Clock, FixedClock, SystemClock},
    models::{Match, MatchResult, Participant, Prediction, Quiniela},
    repository::{
        InMemoryQuinielaRepository, JsonFileQuinielaRepository, PostgresQuinielaRepository,
        QuinielaRepository,
    },
};
pub use router::create_router;
pub use shared::{AppError, AppState};
