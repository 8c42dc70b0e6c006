use quiniela::{
    create_router, AppState, InMemoryQuinielaRepository, JsonFileQuinielaRepository,
    PostgresQuinielaRepository, QuinielaRepository, ServerConfig, StorageBackend, SystemClock,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiniela=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting quiniela server");

    let config = ServerConfig::from_env()?;

    let quiniela_repository: Arc<dyn QuinielaRepository + Send + Sync> = match &config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(InMemoryQuinielaRepository::new())
        }
        StorageBackend::File(path) => {
            info!(path = %path.display(), "Using JSON file storage");
            Arc::new(JsonFileQuinielaRepository::new(path.clone()))
        }
        StorageBackend::Postgres { database_url } => {
            info!("Using PostgreSQL storage");
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresQuinielaRepository::new(pool);
            repository.ensure_schema().await?;
            Arc::new(repository)
        }
    };

    let app_state = AppState::new(quiniela_repository, config.token, Arc::new(SystemClock));
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
