use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Row};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::Quiniela;
use crate::shared::AppError;

/// Result of attempting to save a quiniela
#[derive(Debug, Clone)]
pub enum SaveQuinielaResult {
    /// Saved; returns the stored record with its new version
    Saved(Quiniela),
    /// The stored record moved on since the caller loaded it
    VersionConflict { current_version: u64 },
    /// Quiniela does not exist
    NotFound,
}

/// Trait for quiniela storage backends
#[async_trait]
pub trait QuinielaRepository {
    async fn create_quiniela(&self, quiniela: &Quiniela) -> Result<(), AppError>;
    async fn get_quiniela(&self, quiniela_id: &str) -> Result<Option<Quiniela>, AppError>;
    async fn list_quinielas(&self) -> Result<Vec<Quiniela>, AppError>;

    /// Replaces the stored quiniela only if its version still matches the
    /// version the caller loaded, then bumps the version
    async fn save_quiniela(&self, quiniela: &Quiniela) -> Result<SaveQuinielaResult, AppError>;

    /// Returns false when there was nothing to delete
    async fn delete_quiniela(&self, quiniela_id: &str) -> Result<bool, AppError>;
}

/// Copy of the quiniela as it is stored after a successful save
fn next_revision(quiniela: &Quiniela) -> Quiniela {
    Quiniela {
        version: quiniela.version + 1,
        ..quiniela.clone()
    }
}

/// In-memory implementation of QuinielaRepository for development and testing
pub struct InMemoryQuinielaRepository {
    quinielas: Mutex<HashMap<String, Quiniela>>,
}

impl Default for InMemoryQuinielaRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQuinielaRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            quinielas: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Quiniela>>, AppError> {
        self.quinielas.lock().map_err(|_| {
            warn!("Quiniela store mutex poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl QuinielaRepository for InMemoryQuinielaRepository {
    #[instrument(skip(self, quiniela))]
    async fn create_quiniela(&self, quiniela: &Quiniela) -> Result<(), AppError> {
        debug!(quiniela_id = %quiniela.id, name = %quiniela.name, "Creating quiniela in memory");

        let mut quinielas = self.lock()?;
        if quinielas.contains_key(&quiniela.id) {
            warn!(quiniela_id = %quiniela.id, "Quiniela already exists in memory");
            return Err(AppError::DatabaseError(
                "Quiniela already exists".to_string(),
            ));
        }
        quinielas.insert(quiniela.id.clone(), quiniela.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_quiniela(&self, quiniela_id: &str) -> Result<Option<Quiniela>, AppError> {
        let quinielas = self.lock()?;
        let quiniela = quinielas.get(quiniela_id).cloned();

        match &quiniela {
            Some(q) => debug!(quiniela_id = %quiniela_id, version = q.version, "Quiniela found in memory"),
            None => debug!(quiniela_id = %quiniela_id, "Quiniela not found in memory"),
        }

        Ok(quiniela)
    }

    #[instrument(skip(self))]
    async fn list_quinielas(&self) -> Result<Vec<Quiniela>, AppError> {
        let quinielas = self.lock()?;
        Ok(quinielas.values().cloned().collect())
    }

    #[instrument(skip(self, quiniela))]
    async fn save_quiniela(&self, quiniela: &Quiniela) -> Result<SaveQuinielaResult, AppError> {
        let mut quinielas = self.lock()?;

        let stored = match quinielas.get_mut(&quiniela.id) {
            Some(stored) => stored,
            None => {
                debug!(quiniela_id = %quiniela.id, "Quiniela not found for save");
                return Ok(SaveQuinielaResult::NotFound);
            }
        };

        if stored.version != quiniela.version {
            warn!(
                quiniela_id = %quiniela.id,
                expected_version = quiniela.version,
                current_version = stored.version,
                "Version conflict saving quiniela"
            );
            return Ok(SaveQuinielaResult::VersionConflict {
                current_version: stored.version,
            });
        }

        let updated = next_revision(quiniela);
        *stored = updated.clone();

        debug!(quiniela_id = %quiniela.id, version = updated.version, "Quiniela saved in memory");
        Ok(SaveQuinielaResult::Saved(updated))
    }

    #[instrument(skip(self))]
    async fn delete_quiniela(&self, quiniela_id: &str) -> Result<bool, AppError> {
        let mut quinielas = self.lock()?;
        Ok(quinielas.remove(quiniela_id).is_some())
    }
}

/// Stores every quiniela in a single JSON array document on disk
pub struct JsonFileQuinielaRepository {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    file_lock: tokio::sync::Mutex<()>,
}

impl JsonFileQuinielaRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Quiniela>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Data file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Failed to read data file");
                return Err(AppError::DatabaseError(e.to_string()));
            }
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, path = %self.path.display(), "Data file is not valid quiniela JSON");
            AppError::DatabaseError(e.to_string())
        })
    }

    async fn write_all(&self, quinielas: &[Quiniela]) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(quinielas).map_err(|e| {
            warn!(error = %e, "Failed to serialize quinielas");
            AppError::DatabaseError(e.to_string())
        })?;

        // Write beside the target and rename so readers never see a torn file
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await.map_err(|e| {
            warn!(error = %e, path = %tmp_path.display(), "Failed to write data file");
            AppError::DatabaseError(e.to_string())
        })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| {
                warn!(error = %e, path = %self.path.display(), "Failed to replace data file");
                AppError::DatabaseError(e.to_string())
            })?;

        debug!(
            path = %self.path.display(),
            bytes = json.len(),
            quiniela_count = quinielas.len(),
            "Data file written"
        );
        Ok(())
    }
}

#[async_trait]
impl QuinielaRepository for JsonFileQuinielaRepository {
    #[instrument(skip(self, quiniela))]
    async fn create_quiniela(&self, quiniela: &Quiniela) -> Result<(), AppError> {
        let _guard = self.file_lock.lock().await;
        let mut quinielas = self.read_all().await?;

        if quinielas.iter().any(|q| q.id == quiniela.id) {
            warn!(quiniela_id = %quiniela.id, "Quiniela already exists in data file");
            return Err(AppError::DatabaseError(
                "Quiniela already exists".to_string(),
            ));
        }

        quinielas.push(quiniela.clone());
        self.write_all(&quinielas).await
    }

    #[instrument(skip(self))]
    async fn get_quiniela(&self, quiniela_id: &str) -> Result<Option<Quiniela>, AppError> {
        let _guard = self.file_lock.lock().await;
        let quinielas = self.read_all().await?;
        Ok(quinielas.into_iter().find(|q| q.id == quiniela_id))
    }

    #[instrument(skip(self))]
    async fn list_quinielas(&self) -> Result<Vec<Quiniela>, AppError> {
        let _guard = self.file_lock.lock().await;
        self.read_all().await
    }

    #[instrument(skip(self, quiniela))]
    async fn save_quiniela(&self, quiniela: &Quiniela) -> Result<SaveQuinielaResult, AppError> {
        let _guard = self.file_lock.lock().await;
        let mut quinielas = self.read_all().await?;

        let stored = match quinielas.iter_mut().find(|q| q.id == quiniela.id) {
            Some(stored) => stored,
            None => return Ok(SaveQuinielaResult::NotFound),
        };

        if stored.version != quiniela.version {
            warn!(
                quiniela_id = %quiniela.id,
                expected_version = quiniela.version,
                current_version = stored.version,
                "Version conflict saving quiniela"
            );
            return Ok(SaveQuinielaResult::VersionConflict {
                current_version: stored.version,
            });
        }

        let updated = next_revision(quiniela);
        *stored = updated.clone();
        self.write_all(&quinielas).await?;

        Ok(SaveQuinielaResult::Saved(updated))
    }

    #[instrument(skip(self))]
    async fn delete_quiniela(&self, quiniela_id: &str) -> Result<bool, AppError> {
        let _guard = self.file_lock.lock().await;
        let mut quinielas = self.read_all().await?;

        let before = quinielas.len();
        quinielas.retain(|q| q.id != quiniela_id);
        if quinielas.len() == before {
            return Ok(false);
        }

        self.write_all(&quinielas).await?;
        Ok(true)
    }
}

/// PostgreSQL implementation of quiniela repository.
/// Each quiniela is one row; the record lives in a JSONB column and the
/// `version` column is the compare-and-swap guard for saves.
pub struct PostgresQuinielaRepository {
    pool: PgPool,
}

impl PostgresQuinielaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the quinielas table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(include_str!("../../migrations/0001_create_quinielas.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create quinielas schema");
                AppError::DatabaseError(e.to_string())
            })?;

        info!("Quinielas schema ready");
        Ok(())
    }

    fn quiniela_from_row(row: &sqlx::postgres::PgRow) -> Result<Quiniela, AppError> {
        let Json(document): Json<serde_json::Value> = row.try_get("document").map_err(|e| {
            warn!(error = %e, "Failed to read quiniela document column");
            AppError::DatabaseError(e.to_string())
        })?;
        let version: i64 = row.try_get("version").map_err(|e| {
            warn!(error = %e, "Failed to read quiniela version column");
            AppError::DatabaseError(e.to_string())
        })?;

        decode_document(document, version)
    }
}

/// Rebuilds a quiniela from its stored JSON document and version column
fn decode_document(document: serde_json::Value, version: i64) -> Result<Quiniela, AppError> {
    let mut quiniela: Quiniela = serde_json::from_value(document).map_err(|e| {
        warn!(error = %e, "Stored quiniela document is malformed");
        AppError::DatabaseError(format!("malformed quiniela document: {}", e))
    })?;
    quiniela.version = u64::try_from(version).map_err(|_| {
        warn!(version, "Stored quiniela version is negative");
        AppError::DatabaseError(format!("invalid quiniela version {}", version))
    })?;

    Ok(quiniela)
}

#[async_trait]
impl QuinielaRepository for PostgresQuinielaRepository {
    #[instrument(skip(self, quiniela))]
    async fn create_quiniela(&self, quiniela: &Quiniela) -> Result<(), AppError> {
        debug!(quiniela_id = %quiniela.id, "Creating quiniela in database");

        sqlx::query(
            "INSERT INTO quinielas (id, name, created_by, created_at, version, last_updated, document) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
        .bind(&quiniela.id)
        .bind(&quiniela.name)
        .bind(&quiniela.created_by)
        .bind(quiniela.created_at)
        .bind(quiniela.version as i64)
        .bind(quiniela.last_updated)
        .bind(Json(quiniela))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create quiniela in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_quiniela(&self, quiniela_id: &str) -> Result<Option<Quiniela>, AppError> {
        let row = sqlx::query("SELECT version, document FROM quinielas WHERE id = $1")
            .bind(quiniela_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, quiniela_id = %quiniela_id, "Failed to fetch quiniela from database");
                AppError::DatabaseError(e.to_string())
            })?;

        row.as_ref().map(Self::quiniela_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_quinielas(&self) -> Result<Vec<Quiniela>, AppError> {
        let rows = sqlx::query("SELECT version, document FROM quinielas ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list quinielas from database");
                AppError::DatabaseError(e.to_string())
            })?;

        rows.iter().map(Self::quiniela_from_row).collect()
    }

    #[instrument(skip(self, quiniela))]
    async fn save_quiniela(&self, quiniela: &Quiniela) -> Result<SaveQuinielaResult, AppError> {
        let updated = next_revision(quiniela);

        let result = sqlx::query(
            "UPDATE quinielas SET name = $2, version = $3, last_updated = $4, document = $5 WHERE id = $1 AND version = $6"
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(updated.version as i64)
        .bind(updated.last_updated)
        .bind(Json(&updated))
        .bind(quiniela.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, quiniela_id = %quiniela.id, "Failed to save quiniela in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 1 {
            debug!(quiniela_id = %quiniela.id, version = updated.version, "Quiniela saved in database");
            return Ok(SaveQuinielaResult::Saved(updated));
        }

        let current = sqlx::query("SELECT version FROM quinielas WHERE id = $1")
            .bind(&quiniela.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        match current {
            Some(row) => {
                let current_version: i64 = row
                    .try_get("version")
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                warn!(
                    quiniela_id = %quiniela.id,
                    expected_version = quiniela.version,
                    current_version,
                    "Version conflict saving quiniela"
                );
                Ok(SaveQuinielaResult::VersionConflict {
                    current_version: current_version as u64,
                })
            }
            None => Ok(SaveQuinielaResult::NotFound),
        }
    }

    #[instrument(skip(self))]
    async fn delete_quiniela(&self, quiniela_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quinielas WHERE id = $1")
            .bind(quiniela_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, quiniela_id = %quiniela_id, "Failed to delete quiniela from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
